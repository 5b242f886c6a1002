//! AES-256 in IGE (Infinite Garble Extension) mode.
//!
//! For every 16-byte block `out = E(in ^ prev_out) ^ prev_in`. The 32-byte
//! IV holds the initial `prev_out` in its first half and `prev_in` in its
//! second half; decryption chains the same way with the halves swapped.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

const BLOCK: usize = 16;

fn xor_block(dst: &mut [u8], src: &[u8; BLOCK]) {
    for (d, s) in dst.iter_mut().zip(src) { *d ^= s; }
}

fn split_iv(iv: &[u8; 32]) -> ([u8; BLOCK], [u8; BLOCK]) {
    let mut lo = [0u8; BLOCK];
    let mut hi = [0u8; BLOCK];
    lo.copy_from_slice(&iv[..BLOCK]);
    hi.copy_from_slice(&iv[BLOCK..]);
    (lo, hi)
}

/// Encrypt `buffer` in place. Its length must be a multiple of 16.
pub fn ige_encrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(buffer.len() % BLOCK, 0, "IGE input must be block aligned");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let (mut prev_out, mut prev_in) = split_iv(iv);

    for block in buffer.chunks_exact_mut(BLOCK) {
        let mut input = [0u8; BLOCK];
        input.copy_from_slice(block);
        xor_block(block, &prev_out);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_in);
        prev_in = input;
        prev_out.copy_from_slice(block);
    }
}

/// Decrypt `buffer` in place. Its length must be a multiple of 16.
pub fn ige_decrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(buffer.len() % BLOCK, 0, "IGE input must be block aligned");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let (mut prev_in, mut prev_out) = split_iv(iv);

    for block in buffer.chunks_exact_mut(BLOCK) {
        let mut input = [0u8; BLOCK];
        input.copy_from_slice(block);
        xor_block(block, &prev_out);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_in);
        prev_in = input;
        prev_out.copy_from_slice(block);
    }
}

/// Number of random bytes needed to bring `len` up to a block multiple.
pub fn padding_to_block(len: usize) -> usize {
    (BLOCK - len % BLOCK) % BLOCK
}

/// Pad `data` with random bytes to a block multiple and encrypt it.
///
/// The caller keeps track of the real length; the pad is never stripped
/// here.
pub fn ige_encrypt_padded(data: &[u8], key: &[u8; 32], iv: &[u8; 32]) -> Vec<u8> {
    let mut buffer = data.to_vec();
    let mut pad = vec![0u8; padding_to_block(data.len())];
    crate::random::fill(&mut pad);
    buffer.extend_from_slice(&pad);
    ige_encrypt(&mut buffer, key, iv);
    buffer
}
