//! The cryptography MTProto 2.0 needs, and nothing else.
//!
//! Message protection ([`encrypt_data_v2`], [`decrypt_data_v2`]) sits at the
//! crate root. The handshake's arithmetic lives in [`factorize`], [`prime`]
//! and [`rsa`]; [`aes`] holds the IGE mode both sides share.

#![deny(unsafe_code)]

pub mod aes;
mod auth_key;
pub mod factorize;
pub mod prime;
pub mod random;
pub mod rsa;
mod sha;

pub use auth_key::AuthKey;
pub use factorize::factorize;
pub use rsa::RsaKeyStore;

#[doc(hidden)]
pub mod __private {
    pub use ::sha1;
    pub use ::sha2;
}

/// Why an inbound frame was refused by [`decrypt_data_v2`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecryptError {
    /// Shorter than the 24-byte header, or a body that is not whole AES blocks.
    InvalidBuffer,
    /// Sealed under some other key.
    AuthKeyMismatch,
    /// The body was altered, or sealed for the other direction.
    MessageKeyMismatch,
}

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InvalidBuffer => "encrypted frame has a bad length",
            Self::AuthKeyMismatch => "encrypted frame names a different auth key",
            Self::MessageKeyMismatch => "encrypted frame failed its msg_key check",
        })
    }
}

impl std::error::Error for DecryptError {}

/// Which peer produced a message. Selects the auth key window `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
}

impl Side {
    /// Offset into the auth key: 0 for client to server, 8 for the reverse.
    pub fn x(self) -> usize {
        match self {
            Side::Client => 0,
            Side::Server => 8,
        }
    }
}

/// Glue byte ranges into one array. The parts must add up to exactly `N`.
fn splice<const N: usize>(parts: &[&[u8]]) -> [u8; N] {
    let mut out = [0u8; N];
    let mut at = 0;
    for part in parts {
        out[at..at + part.len()].copy_from_slice(part);
        at += part.len();
    }
    debug_assert_eq!(at, N);
    out
}

/// AES key and IV for one message, from its `msg_key`.
pub fn calc_key(auth_key: &AuthKey, msg_key: &[u8; 16], side: Side) -> ([u8; 32], [u8; 32]) {
    let x = side.x();
    let a = sha256!(msg_key, &auth_key.data[x..x + 36]);
    let b = sha256!(&auth_key.data[40 + x..76 + x], msg_key);
    (
        splice(&[&a[..8], &b[8..24], &a[24..]]),
        splice(&[&b[..8], &a[8..24], &b[24..]]),
    )
}

/// Random padding appended to `len` bytes: at least 12, total a multiple of 16.
pub fn padding_len(len: usize) -> usize {
    12 + (16 - (len + 12) % 16) % 16
}

/// Middle 128 bits of `SHA-256(auth_key[88+x..120+x] ‖ plaintext)`.
fn msg_key_for(auth_key: &AuthKey, plaintext: &[u8], side: Side) -> [u8; 16] {
    let x = side.x();
    splice(&[&sha256!(&auth_key.data[88 + x..120 + x], plaintext)[8..24]])
}

/// Encrypt `plaintext` (`salt ‖ session_id ‖ message`) as `side`.
///
/// Returns `auth_key_id ‖ msg_key ‖ ciphertext`.
pub fn encrypt_data_v2(plaintext: &[u8], auth_key: &AuthKey, side: Side) -> Vec<u8> {
    do_encrypt_data_v2(plaintext, auth_key, side, &random::array())
}

pub(crate) fn do_encrypt_data_v2(
    plaintext: &[u8],
    auth_key: &AuthKey,
    side: Side,
    rnd: &[u8; 32],
) -> Vec<u8> {
    let pad = padding_len(plaintext.len());
    let mut buffer = Vec::with_capacity(24 + plaintext.len() + pad);
    buffer.extend_from_slice(&auth_key.key_id());
    buffer.extend_from_slice(&[0u8; 16]);
    buffer.extend_from_slice(plaintext);
    buffer.extend_from_slice(&rnd[..pad]);

    let msg_key = msg_key_for(auth_key, &buffer[24..], side);
    let (key, iv) = calc_key(auth_key, &msg_key, side);
    aes::ige_encrypt(&mut buffer[24..], &key, &iv);
    buffer[8..24].copy_from_slice(&msg_key);
    buffer
}

/// Decrypt a message produced by `side`.
///
/// `buffer` must be `auth_key_id ‖ msg_key ‖ ciphertext`. On success the
/// padded plaintext is returned; stripping the pad is the caller's job.
pub fn decrypt_data_v2(buffer: &[u8], auth_key: &AuthKey, side: Side) -> Result<Vec<u8>, DecryptError> {
    if buffer.len() < 24 || (buffer.len() - 24) % 16 != 0 {
        return Err(DecryptError::InvalidBuffer);
    }
    if auth_key.key_id() != buffer[..8] {
        return Err(DecryptError::AuthKeyMismatch);
    }
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&buffer[8..24]);

    let (key, iv) = calc_key(auth_key, &msg_key, side);
    let mut plaintext = buffer[24..].to_vec();
    aes::ige_decrypt(&mut plaintext, &key, &iv);

    if msg_key != msg_key_for(auth_key, &plaintext, side) {
        return Err(DecryptError::MessageKeyMismatch);
    }
    Ok(plaintext)
}

/// `(key, iv)` that protect the handshake's DH messages, built from both nonces.
pub fn generate_key_data_from_nonce(server_nonce: &[u8; 16], new_nonce: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let ns = sha1!(new_nonce, server_nonce);
    let sn = sha1!(server_nonce, new_nonce);
    let nn = sha1!(new_nonce, new_nonce);
    (
        splice(&[&ns, &sn[..12]]),
        splice(&[&sn[12..], &nn, &new_nonce[..4]]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_key() -> AuthKey {
        AuthKey::from_bytes(core::array::from_fn(|i| (i * 7 % 256) as u8))
    }

    #[test]
    fn padding_is_at_least_twelve_and_aligns() {
        for len in 0..64 {
            let pad = padding_len(len);
            assert!((12..28).contains(&pad));
            assert_eq!((len + pad) % 16, 0);
        }
    }

    #[test]
    fn client_message_decrypts_as_client() {
        let plaintext: Vec<u8> = (0..40u8).collect();
        let rnd = [0xaa; 32];
        let encrypted = do_encrypt_data_v2(&plaintext, &auth_key(), Side::Client, &rnd);
        assert_eq!(&encrypted[..8], &auth_key().key_id());

        let decrypted = decrypt_data_v2(&encrypted, &auth_key(), Side::Client).unwrap();
        assert_eq!(&decrypted[..40], &plaintext[..]);
        assert_eq!(decrypted.len(), 40 + padding_len(40));
    }

    #[test]
    fn wrong_side_is_rejected() {
        let encrypted = encrypt_data_v2(&[1; 32], &auth_key(), Side::Server);
        assert_eq!(
            decrypt_data_v2(&encrypted, &auth_key(), Side::Client),
            Err(DecryptError::MessageKeyMismatch)
        );
    }

    #[test]
    fn foreign_key_id_is_rejected() {
        let other = AuthKey::from_bytes([1; 256]);
        let encrypted = encrypt_data_v2(&[1; 32], &other, Side::Server);
        assert_eq!(
            decrypt_data_v2(&encrypted, &auth_key(), Side::Server),
            Err(DecryptError::AuthKeyMismatch)
        );
    }

    #[test]
    fn misaligned_buffer_is_rejected() {
        assert_eq!(
            decrypt_data_v2(&[0; 30], &auth_key(), Side::Server),
            Err(DecryptError::InvalidBuffer)
        );
    }

    #[test]
    fn nonce_key_layout() {
        let server_nonce = [2u8; 16];
        let new_nonce = [3u8; 32];
        let (key, iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
        assert_eq!(&key[..20], &sha1!(&new_nonce, &server_nonce));
        assert_eq!(&key[20..], &sha1!(&server_nonce, &new_nonce)[..12]);
        assert_eq!(&iv[8..28], &sha1!(&new_nonce, &new_nonce));
        assert_eq!(&iv[28..], &new_nonce[..4]);
    }
}
