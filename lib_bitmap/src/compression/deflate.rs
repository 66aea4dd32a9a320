//! DEFLATE compressor (RFC 1951) with zlib framing (RFC 1950).
//!
//! Greedy LZ77 matching over a hash chain feeds one fixed-Huffman block.
//! When that block would not beat the raw bytes, stored blocks are written
//! instead.

use log::debug;

use super::adler32::adler32;

pub const WINDOW_SIZE: usize = 32 * 1024;
pub const MIN_MATCH: usize = 3;
pub const MAX_MATCH: usize = 258;

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const MAX_CHAIN: usize = 64;
const MAX_STORED_BLOCK: usize = 65_535;
const END_OF_BLOCK: u16 = 256;
const NO_POSITION: usize = usize::MAX;

/// CMF 0x78: DEFLATE with a 32K window. FLG 0x9C: default level, check bits.
const ZLIB_HEADER: [u8; 2] = [0x78, 0x9C];

pub(super) const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
pub(super) const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
pub(super) const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
pub(super) const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(u8),
    Match { length: u16, distance: u16 },
}

/// Wraps `data` in a complete zlib stream.
pub fn deflate_zlib(data: &[u8]) -> Vec<u8> {
    let body = deflate(data);

    let mut output = Vec::with_capacity(body.len() + 6);
    output.extend_from_slice(&ZLIB_HEADER);
    output.extend_from_slice(&body);
    output.extend_from_slice(&adler32(data).to_be_bytes());
    output
}

/// Raw DEFLATE stream without the zlib wrapper.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return encode_stored(data);
    }

    let tokens = lz77(data);
    let fixed = encode_fixed(&tokens);
    let stored_len = data.len() + 5 * data.len().div_ceil(MAX_STORED_BLOCK);

    debug!(
        "DEFLATE: {} bytes in, {} tokens, fixed block {} bytes, stored {} bytes",
        data.len(),
        tokens.len(),
        fixed.len(),
        stored_len
    );

    if fixed.len() < stored_len {
        fixed
    } else {
        encode_stored(data)
    }
}

fn encode_stored(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        // One final stored block of length zero.
        return vec![0x01, 0x00, 0x00, 0xFF, 0xFF];
    }

    let mut out = Vec::with_capacity(data.len() + 5 * data.len().div_ceil(MAX_STORED_BLOCK));
    let mut chunks = data.chunks(MAX_STORED_BLOCK).peekable();
    while let Some(chunk) = chunks.next() {
        let is_final = chunks.peek().is_none();
        // BFINAL in bit 0, BTYPE 00, rest of the byte is padding.
        out.push(u8::from(is_final));
        let len = chunk.len() as u16;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(chunk);
    }
    out
}

fn encode_fixed(tokens: &[Token]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_bits(1, 1); // BFINAL
    writer.write_bits(1, 2); // BTYPE = 01, fixed Huffman

    for &token in tokens {
        match token {
            Token::Literal(byte) => {
                let (code, len) = fixed_literal_code(byte as u16);
                writer.write_code(code, len);
            }
            Token::Match { length, distance } => {
                let (symbol, extra_bits, extra) = length_symbol(length);
                let (code, len) = fixed_literal_code(symbol);
                writer.write_code(code, len);
                writer.write_bits(extra as u32, extra_bits);

                let (symbol, extra_bits, extra) = distance_symbol(distance);
                writer.write_code(symbol, 5);
                writer.write_bits(extra as u32, extra_bits);
            }
        }
    }

    let (code, len) = fixed_literal_code(END_OF_BLOCK);
    writer.write_code(code, len);
    writer.finish()
}

/// Fixed literal/length code from RFC 1951 section 3.2.6.
fn fixed_literal_code(symbol: u16) -> (u16, u32) {
    match symbol {
        0..=143 => (0x30 + symbol, 8),
        144..=255 => (0x190 + (symbol - 144), 9),
        256..=279 => (symbol - 256, 7),
        _ => (0xC0 + (symbol - 280), 8),
    }
}

fn length_symbol(length: u16) -> (u16, u32, u16) {
    let index = LENGTH_BASE
        .iter()
        .rposition(|&base| base <= length)
        .unwrap_or(0);
    (
        257 + index as u16,
        LENGTH_EXTRA[index] as u32,
        length - LENGTH_BASE[index],
    )
}

fn distance_symbol(distance: u16) -> (u16, u32, u16) {
    let index = DIST_BASE
        .iter()
        .rposition(|&base| base <= distance)
        .unwrap_or(0);
    (
        index as u16,
        DIST_EXTRA[index] as u32,
        distance - DIST_BASE[index],
    )
}

fn hash3(data: &[u8], pos: usize) -> Option<usize> {
    if pos + MIN_MATCH > data.len() {
        return None;
    }
    let value = (data[pos] as u32) << 16 | (data[pos + 1] as u32) << 8 | data[pos + 2] as u32;
    Some((value.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize)
}

fn lz77(data: &[u8]) -> Vec<Token> {
    let mut chain = HashChain::new(data.len());
    let mut tokens = Vec::with_capacity(data.len() / 2);

    let mut pos = 0;
    while pos < data.len() {
        let (length, distance) = chain.longest_match(data, pos);
        if length >= MIN_MATCH {
            tokens.push(Token::Match {
                length: length as u16,
                distance: distance as u16,
            });
            for p in pos..pos + length {
                chain.insert(data, p);
            }
            pos += length;
        } else {
            tokens.push(Token::Literal(data[pos]));
            chain.insert(data, pos);
            pos += 1;
        }
    }

    tokens
}

/// Positions of earlier 3-byte prefixes, most recent first.
struct HashChain {
    head: Vec<usize>,
    prev: Vec<usize>,
}

impl HashChain {
    fn new(len: usize) -> Self {
        Self {
            head: vec![NO_POSITION; HASH_SIZE],
            prev: vec![NO_POSITION; len],
        }
    }

    fn insert(&mut self, data: &[u8], pos: usize) {
        if let Some(hash) = hash3(data, pos) {
            self.prev[pos] = self.head[hash];
            self.head[hash] = pos;
        }
    }

    fn longest_match(&self, data: &[u8], pos: usize) -> (usize, usize) {
        let Some(hash) = hash3(data, pos) else {
            return (0, 0);
        };

        let max_len = (data.len() - pos).min(MAX_MATCH);
        let ahead = &data[pos..pos + max_len];
        let mut best = (0, 0);
        let mut candidate = self.head[hash];
        let mut steps = 0;

        while candidate != NO_POSITION && steps < MAX_CHAIN {
            let distance = pos - candidate;
            if distance > WINDOW_SIZE {
                break;
            }

            // Overlapping matches are fine: the decoder copies byte by byte.
            let len = data[candidate..]
                .iter()
                .zip(ahead)
                .take_while(|(a, b)| a == b)
                .count();
            if len > best.0 {
                best = (len, distance);
                if len == max_len {
                    break;
                }
            }

            candidate = self.prev[candidate];
            steps += 1;
        }

        best
    }
}

/// LSB-first bit packer. Huffman codes go through [`BitWriter::write_code`],
/// which reverses them so they read MSB-first.
struct BitWriter {
    out: Vec<u8>,
    buffer: u64,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            buffer: 0,
            bits: 0,
        }
    }

    fn write_bits(&mut self, value: u32, count: u32) {
        if count == 0 {
            return;
        }
        self.buffer |= (value as u64) << self.bits;
        self.bits += count;
        while self.bits >= 8 {
            self.out.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits -= 8;
        }
    }

    fn write_code(&mut self, code: u16, length: u32) {
        self.write_bits(reverse_bits(code, length), length);
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.buffer as u8);
        }
        self.out
    }
}

fn reverse_bits(code: u16, length: u32) -> u32 {
    let mut reversed = 0u32;
    for i in 0..length {
        if code & (1 << i) != 0 {
            reversed |= 1 << (length - 1 - i);
        }
    }
    reversed
}
