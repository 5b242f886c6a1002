//! The long-term key shared with one data center.

use std::fmt;

use crate::sha1;

/// 2048-bit authorization key.
///
/// Both identifiers are slices of `SHA-1(key)`, computed once here.
#[derive(Clone)]
pub struct AuthKey {
    pub(crate) data: [u8; 256],
    digest: [u8; 20],
}

fn take<const N: usize>(src: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&src[..N]);
    out
}

impl AuthKey {
    pub fn from_bytes(data: [u8; 256]) -> Self {
        Self { digest: sha1!(&data), data }
    }

    /// Wrap the big-endian `g^ab mod p`, zero-extended on the left.
    /// `None` when it does not fit in 256 bytes.
    pub fn from_shared_secret(be: &[u8]) -> Option<Self> {
        let pad = 256usize.checked_sub(be.len())?;
        let mut data = [0u8; 256];
        data[pad..].copy_from_slice(be);
        Some(Self::from_bytes(data))
    }

    pub fn to_bytes(&self) -> [u8; 256] {
        self.data
    }

    /// Low 64 bits of the digest; prefixes every encrypted frame.
    pub fn key_id(&self) -> [u8; 8] {
        take(&self.digest[12..])
    }

    /// High 64 bits of the digest; doubles as `retry_id`.
    pub fn aux_hash(&self) -> [u8; 8] {
        take(&self.digest[..8])
    }

    /// Expected `new_nonce_hashN` for `dh_gen_ok` (1), `dh_gen_retry` (2) or `dh_gen_fail` (3).
    pub fn calc_new_nonce_hash(&self, new_nonce: &[u8; 32], number: u8) -> [u8; 16] {
        take(&sha1!(new_nonce, [number], &self.aux_hash())[4..])
    }
}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthKey").field(&i64::from_le_bytes(self.key_id())).finish()
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for AuthKey {}
