//! RSA encryption for the `req_DH_params` step and the trusted key store.

use std::collections::HashMap;

use gramkit_tl_types::Serializable;
use num_bigint::BigUint;

use crate::sha1;

/// Size of the RSA modulus and of every ciphertext, in bytes.
pub const BLOCK_LEN: usize = 256;

/// Padded plaintext size: `sha1(data) ‖ data ‖ random`.
const PADDED_LEN: usize = 255;

/// Errors from [`encrypt_hashed`].
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// `data` does not fit next to its SHA-1 inside 255 bytes.
    DataTooLarge { len: usize },
    /// Not enough random padding bytes were supplied.
    NotEnoughRandom { needed: usize, got: usize },
    /// The ciphertext could not be brought to exactly 256 bytes.
    BadCiphertextLength { len: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataTooLarge { len } => write!(f, "{len} bytes is too large for RSA"),
            Self::NotEnoughRandom { needed, got } => {
                write!(f, "need {needed} random padding bytes, got {got}")
            }
            Self::BadCiphertextLength { len } => write!(f, "RSA output has length {len}"),
        }
    }
}
impl std::error::Error for Error {}

/// An RSA public key `(n, e)` with its precomputed fingerprint.
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    n: BigUint,
    e: BigUint,
    fingerprint: i64,
}

impl Key {
    /// Parse decimal `n` and `e` strings.
    pub fn new(n: &str, e: &str) -> Option<Self> {
        let n = BigUint::parse_bytes(n.as_bytes(), 10)?;
        let e = BigUint::parse_bytes(e.as_bytes(), 10)?;
        let fingerprint = compute_fingerprint(&n, &e);
        Some(Self { n, e, fingerprint })
    }

    /// Lower 64 bits of `SHA-1(n ‖ e)` with both TL-encoded as byte strings.
    pub fn fingerprint(&self) -> i64 {
        self.fingerprint
    }
}

fn compute_fingerprint(n: &BigUint, e: &BigUint) -> i64 {
    let mut buf = Vec::new();
    n.to_bytes_be().serialize(&mut buf);
    e.to_bytes_be().serialize(&mut buf);
    let sha = sha1!(&buf);
    let mut low = [0u8; 8];
    low.copy_from_slice(&sha[12..20]);
    i64::from_le_bytes(low)
}

/// Bring a big-endian RSA result to exactly [`BLOCK_LEN`] bytes.
///
/// Shorter values are left-padded. Longer values may only lose leading zeros.
pub fn to_block(mut bytes: Vec<u8>) -> Result<Vec<u8>, Error> {
    if bytes.len() > BLOCK_LEN {
        let excess = bytes.len() - BLOCK_LEN;
        if bytes[..excess].iter().any(|&b| b != 0) {
            return Err(Error::BadCiphertextLength { len: bytes.len() });
        }
        bytes.drain(..excess);
    }
    if bytes.len() < BLOCK_LEN {
        let mut padded = vec![0u8; BLOCK_LEN - bytes.len()];
        padded.extend_from_slice(&bytes);
        bytes = padded;
    }
    Ok(bytes)
}

/// RSA-encrypt `data` as `(sha1(data) ‖ data ‖ random)^e mod n`.
///
/// `random` supplies the padding up to 255 bytes; extra bytes are ignored.
pub fn encrypt_hashed(data: &[u8], key: &Key, random: &[u8]) -> Result<Vec<u8>, Error> {
    if data.len() > PADDED_LEN - 20 {
        return Err(Error::DataTooLarge { len: data.len() });
    }
    let needed = PADDED_LEN - 20 - data.len();
    if random.len() < needed {
        return Err(Error::NotEnoughRandom { needed, got: random.len() });
    }

    let mut padded = Vec::with_capacity(PADDED_LEN);
    padded.extend_from_slice(&sha1!(data));
    padded.extend_from_slice(data);
    padded.extend_from_slice(&random[..needed]);

    let payload = BigUint::from_bytes_be(&padded);
    to_block(payload.modpow(&key.e, &key.n).to_bytes_be())
}

// ─── Key store ────────────────────────────────────────────────────────────────

const PRODUCTION_N: &str = "29379598170669337022986177149456128565388431120058863768162556424047512191330847455146576344487764408661701890505066208632169112269581063774293102577308490531282748465986139880977280302242772832972539403531316010870401287642763009136156734339538042419388722777357134487746169093539093850251243897188928735903389451772730245253062963384108812842079887538976360465290946139638691491496062099570836476454855996319192747663615955633778034897140982517446405334423701359108810182097749467210509584293428076654573384828809574217079944388301239431309115013843331317877374435868468779972014486325557807783825502498215169806323";

const TEST_N: &str = "25342889448840415564971689590713473206898847759084779052582026594546022463853940585885215951168491965708222649399180603818074200620463776135424884632162512403163793083921641631564740959529419359595852941166848940585952337613333022396096584117954892216031229237302943701877588456738335398602461675225081791820393153757504952636234951323237820036543581047826906120927972487366805292115792231423684261262330394324750785450942589751755390156647751460719351439969059949569615302809050721500330239005077889855323917509948255722081644689442127297605422579707142646660768825302832201908302295573257427896031830742328565032949";

/// The set of server public keys the client is willing to encrypt to.
///
/// Passed into the handshake explicitly so tests can trust their own keys.
#[derive(Clone, Debug, Default)]
pub struct RsaKeyStore {
    keys: HashMap<i64, Key>,
}

impl RsaKeyStore {
    /// An empty store that trusts nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The production and test data center keys.
    pub fn builtin() -> Self {
        let mut store = Self::empty();
        for n in [PRODUCTION_N, TEST_N] {
            if let Some(key) = Key::new(n, "65537") {
                store.insert(key);
            }
        }
        store
    }

    /// Trust `key`, replacing any key with the same fingerprint.
    pub fn insert(&mut self, key: Key) {
        self.keys.insert(key.fingerprint(), key);
    }

    pub fn get(&self, fingerprint: i64) -> Option<&Key> {
        self.keys.get(&fingerprint)
    }

    /// The first of the server's `fingerprints` that we trust.
    pub fn find(&self, fingerprints: &[i64]) -> Option<&Key> {
        fingerprints.iter().find_map(|fp| self.keys.get(fp))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
