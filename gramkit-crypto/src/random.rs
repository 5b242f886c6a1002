//! The operating system's random source.
//!
//! Every nonce, padding byte, session id and DH exponent comes from here, so
//! this is the single place an unavailable RNG aborts the process.

/// Fill `buf` with random bytes.
pub fn fill(buf: &mut [u8]) {
    getrandom::getrandom(buf).expect("OS random source unavailable");
}

pub fn array<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    fill(&mut out);
    out
}

pub fn i64() -> i64 {
    i64::from_le_bytes(array())
}
