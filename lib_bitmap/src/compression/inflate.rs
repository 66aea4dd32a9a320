//! zlib (RFC 1950) + DEFLATE (RFC 1951) decoder.
//!
//! Handles stored, fixed-Huffman and dynamic-Huffman blocks. The Adler-32
//! trailer is not verified: inbound checksums are accepted as they are.

use thiserror::Error;

use super::deflate::{DIST_BASE, DIST_EXTRA, LENGTH_BASE, LENGTH_EXTRA, WINDOW_SIZE};

const MAX_CODE_BITS: usize = 15;

// DEFLATE cannot expand input by more than about 1032:1.
const MAX_INFLATE_RATIO: usize = 1032;

// Order of code-length code lengths in a dynamic block header.
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InflateError {
    #[error("zlib stream too short")]
    StreamTooShort,
    #[error("unsupported zlib compression method {0}, expected 8 (DEFLATE)")]
    UnsupportedMethod(u8),
    #[error("zlib header check bits are invalid")]
    HeaderCheckFailed,
    #[error("zlib preset dictionaries are not supported")]
    PresetDictionary,
    #[error("unexpected end of compressed data")]
    UnexpectedEof,
    #[error("reserved block type 3")]
    ReservedBlockType,
    #[error("stored block length {len:#06x} does not match its complement {nlen:#06x}")]
    StoredLengthMismatch { len: u16, nlen: u16 },
    #[error("invalid Huffman code lengths: {0}")]
    InvalidCodeLengths(&'static str),
    #[error("invalid Huffman code in stream")]
    InvalidCode,
    #[error("invalid symbol {0}")]
    InvalidSymbol(u16),
    #[error("back-reference distance {distance} exceeds {available} decoded bytes")]
    InvalidDistance { distance: usize, available: usize },
    #[error("decompressed data exceeds the {limit} byte limit")]
    OutputLimitExceeded { limit: usize },
}

/// Inflates a zlib-wrapped DEFLATE stream.
///
/// With `max_size` set, decoding stops with
/// [`InflateError::OutputLimitExceeded`] as soon as the output would grow
/// past it.
pub fn inflate_zlib(data: &[u8], max_size: Option<usize>) -> Result<Vec<u8>, InflateError> {
    if data.len() < 2 {
        return Err(InflateError::StreamTooShort);
    }

    let cmf = data[0];
    let flg = data[1];
    if cmf & 0x0F != 8 {
        return Err(InflateError::UnsupportedMethod(cmf & 0x0F));
    }
    if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
        return Err(InflateError::HeaderCheckFailed);
    }
    if flg & 0x20 != 0 {
        return Err(InflateError::PresetDictionary);
    }

    let limit = max_size.unwrap_or(usize::MAX);
    let capacity = limit.min(data.len().saturating_mul(MAX_INFLATE_RATIO));
    let mut out = Vec::with_capacity(capacity);
    inflate(&data[2..], &mut out, limit)?;
    Ok(out)
}

/// Inflates a raw DEFLATE stream into `out`, never past `limit` bytes.
/// Bytes after the final block are ignored.
fn inflate(input: &[u8], out: &mut Vec<u8>, limit: usize) -> Result<(), InflateError> {
    let mut reader = BitReader::new(input);
    loop {
        let is_final = reader.read_bits(1)? != 0;
        match reader.read_bits(2)? {
            0 => inflate_stored(&mut reader, out, limit)?,
            1 => {
                let tables = Tables::fixed()?;
                inflate_block(&mut reader, out, &tables, limit)?;
            }
            2 => {
                let tables = Tables::dynamic(&mut reader)?;
                inflate_block(&mut reader, out, &tables, limit)?;
            }
            _ => return Err(InflateError::ReservedBlockType),
        }
        if is_final {
            return Ok(());
        }
    }
}

fn check_limit(len: usize, extra: usize, limit: usize) -> Result<(), InflateError> {
    if len.saturating_add(extra) > limit {
        return Err(InflateError::OutputLimitExceeded { limit });
    }
    Ok(())
}

fn inflate_stored(
    reader: &mut BitReader<'_>,
    out: &mut Vec<u8>,
    limit: usize,
) -> Result<(), InflateError> {
    reader.align_byte();
    let len = reader.read_u16_le()?;
    let nlen = reader.read_u16_le()?;
    if len != !nlen {
        return Err(InflateError::StoredLengthMismatch { len, nlen });
    }
    let bytes = reader.take_bytes(len as usize)?;
    check_limit(out.len(), bytes.len(), limit)?;
    out.extend_from_slice(bytes);
    Ok(())
}

fn inflate_block(
    reader: &mut BitReader<'_>,
    out: &mut Vec<u8>,
    tables: &Tables,
    limit: usize,
) -> Result<(), InflateError> {
    loop {
        let symbol = tables.literal.decode(reader)?;
        match symbol {
            0..=255 => {
                check_limit(out.len(), 1, limit)?;
                out.push(symbol as u8);
            }
            256 => return Ok(()),
            257..=285 => {
                let index = (symbol - 257) as usize;
                let length =
                    LENGTH_BASE[index] as usize + reader.read_bits(LENGTH_EXTRA[index])? as usize;

                let dist_symbol = tables.distance.decode(reader)? as usize;
                if dist_symbol >= DIST_BASE.len() {
                    return Err(InflateError::InvalidSymbol(dist_symbol as u16));
                }
                let distance = DIST_BASE[dist_symbol] as usize
                    + reader.read_bits(DIST_EXTRA[dist_symbol])? as usize;

                if distance == 0 || distance > out.len() || distance > WINDOW_SIZE {
                    return Err(InflateError::InvalidDistance {
                        distance,
                        available: out.len(),
                    });
                }

                check_limit(out.len(), length, limit)?;
                // Byte-by-byte so overlapping references repeat correctly.
                let start = out.len() - distance;
                for i in 0..length {
                    let byte = out[start + i];
                    out.push(byte);
                }
            }
            other => return Err(InflateError::InvalidSymbol(other)),
        }
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buffer: u64,
    bits: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 0,
            bits: 0,
        }
    }

    fn read_bits(&mut self, count: u8) -> Result<u32, InflateError> {
        if count == 0 {
            return Ok(0);
        }
        while self.bits < count {
            let byte = *self.data.get(self.pos).ok_or(InflateError::UnexpectedEof)?;
            self.buffer |= (byte as u64) << self.bits;
            self.bits += 8;
            self.pos += 1;
        }
        let value = (self.buffer & ((1u64 << count) - 1)) as u32;
        self.buffer >>= count;
        self.bits -= count;
        Ok(value)
    }

    /// Drops the bits left in the current byte.
    fn align_byte(&mut self) {
        let drop = self.bits % 8;
        self.buffer >>= drop;
        self.bits -= drop;
    }

    fn read_u16_le(&mut self) -> Result<u16, InflateError> {
        let lo = self.read_bits(8)?;
        let hi = self.read_bits(8)?;
        Ok((lo | hi << 8) as u16)
    }

    /// Byte-aligned slice; any whole bytes still buffered are consumed first.
    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8], InflateError> {
        // Rewind over fully buffered bytes so the slice starts at the right spot.
        let buffered = (self.bits / 8) as usize;
        self.pos -= buffered;
        self.buffer = 0;
        self.bits = 0;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(InflateError::UnexpectedEof)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

/// Canonical Huffman decoding table.
struct Huffman {
    counts: [u16; MAX_CODE_BITS + 1],
    symbols: Vec<u16>,
}

impl Huffman {
    fn from_lengths(lengths: &[u8]) -> Result<Self, InflateError> {
        let mut counts = [0u16; MAX_CODE_BITS + 1];
        for &len in lengths {
            if len as usize > MAX_CODE_BITS {
                return Err(InflateError::InvalidCodeLengths("code length exceeds 15"));
            }
            counts[len as usize] += 1;
        }
        counts[0] = 0;

        // Reject over-subscribed sets; incomplete ones are legal.
        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left <<= 1;
            left -= count as i32;
            if left < 0 {
                return Err(InflateError::InvalidCodeLengths("over-subscribed"));
            }
        }

        let mut offsets = [0u16; MAX_CODE_BITS + 2];
        for len in 1..=MAX_CODE_BITS {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        let mut symbols = vec![0u16; offsets[MAX_CODE_BITS + 1] as usize];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let slot = &mut offsets[len as usize];
                symbols[*slot as usize] = symbol as u16;
                *slot += 1;
            }
        }

        Ok(Self { counts, symbols })
    }

    fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16, InflateError> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;
        for len in 1..=MAX_CODE_BITS {
            code |= reader.read_bits(1)? as i32;
            let count = self.counts[len] as i32;
            if code - first < count {
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }
        Err(InflateError::InvalidCode)
    }
}

struct Tables {
    literal: Huffman,
    distance: Huffman,
}

impl Tables {
    fn fixed() -> Result<Self, InflateError> {
        let mut lengths = [0u8; 288];
        lengths[..144].fill(8);
        lengths[144..256].fill(9);
        lengths[256..280].fill(7);
        lengths[280..].fill(8);

        Ok(Self {
            literal: Huffman::from_lengths(&lengths)?,
            distance: Huffman::from_lengths(&[5u8; 30])?,
        })
    }

    fn dynamic(reader: &mut BitReader<'_>) -> Result<Self, InflateError> {
        let hlit = reader.read_bits(5)? as usize + 257;
        let hdist = reader.read_bits(5)? as usize + 1;
        let hclen = reader.read_bits(4)? as usize + 4;

        let mut code_lengths = [0u8; 19];
        for &slot in CODE_LENGTH_ORDER.iter().take(hclen) {
            code_lengths[slot] = reader.read_bits(3)? as u8;
        }
        let code_length_huffman = Huffman::from_lengths(&code_lengths)?;

        let total = hlit + hdist;
        let mut lengths: Vec<u8> = Vec::with_capacity(total);
        while lengths.len() < total {
            let symbol = code_length_huffman.decode(reader)?;
            let (value, repeat) = match symbol {
                0..=15 => (symbol as u8, 1),
                16 => {
                    let previous = *lengths.last().ok_or(InflateError::InvalidCodeLengths(
                        "repeat with no previous length",
                    ))?;
                    (previous, 3 + reader.read_bits(2)? as usize)
                }
                17 => (0, 3 + reader.read_bits(3)? as usize),
                18 => (0, 11 + reader.read_bits(7)? as usize),
                other => return Err(InflateError::InvalidSymbol(other)),
            };
            if lengths.len() + repeat > total {
                return Err(InflateError::InvalidCodeLengths("code lengths overrun"));
            }
            lengths.extend(std::iter::repeat(value).take(repeat));
        }

        if lengths[256] == 0 {
            return Err(InflateError::InvalidCodeLengths("missing end-of-block code"));
        }

        Ok(Self {
            literal: Huffman::from_lengths(&lengths[..hlit])?,
            distance: Huffman::from_lengths(&lengths[hlit..])?,
        })
    }
}
