//! Adler-32 trailer of zlib streams (RFC 1950).

const MOD_ADLER: u32 = 65_521;
// Largest block that cannot overflow the u32 sums before reduction.
const NMAX: usize = 5_552;

pub fn adler32(data: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;

    for block in data.chunks(NMAX) {
        for &byte in block {
            a += byte as u32;
            b += a;
        }
        a %= MOD_ADLER;
        b %= MOD_ADLER;
    }

    (b << 16) | a
}
