//! Sans-IO MTProto authorization key generation.
//!
//! # Flow
//!
//! ```text
//! let (req, s1) = authentication::step1();
//! // send req, receive ResPQ                         (PqRequested)
//! let (req, s2) = authentication::step2(s1, resp, &keys)?;
//! // factors computed, send req, receive DH params   (DhParamsRequested)
//! let (req, s3) = authentication::step3(s2, resp)?;
//! // DH params validated, send req                   (ClientDhSent)
//! loop {
//!     match authentication::finish(s3, resp)? {
//!         DhGenOutcome::Done(done) => break done,
//!         DhGenOutcome::Retry(req, next) => { /* send req again */ s3 = next; }
//!     }
//! }
//! ```
//!
//! Every step has a `do_` twin taking its randomness as arguments so the
//! exchange can be replayed deterministically.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use gramkit_crypto::random::array as random;
use gramkit_crypto::{AuthKey, RsaKeyStore, aes, factorize, generate_key_data_from_nonce, prime, rsa, sha1};
use gramkit_tl_types::{Cursor, Deserializable, Serializable, enums, functions, types};
use num_bigint::BigUint;
use num_traits::One;

/// Required bit length of the server's DH prime.
pub const DH_PRIME_BITS: u64 = 2048;

// ─── Error ────────────────────────────────────────────────────────────────────

/// Errors that can occur during auth key generation. All of them abort the
/// exchange; the caller may start over with fresh nonces.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    InvalidNonce { got: [u8; 16], expected: [u8; 16] },
    InvalidServerNonce { got: [u8; 16], expected: [u8; 16] },
    InvalidPqSize { size: usize },
    Factorization(factorize::Error),
    /// None of the server's fingerprints is in the trusted key store.
    UntrustedServer { fingerprints: Vec<i64> },
    Rsa(rsa::Error),
    DhParamsFail,
    EncryptedResponseNotPadded { len: usize },
    InvalidDhInnerData { error: gramkit_tl_types::deserialize::Error },
    InvalidAnswerHash { got: [u8; 20], expected: [u8; 20] },
    InvalidDhPrime { reason: &'static str },
    UnsupportedGenerator { g: i32 },
    GParameterOutOfRange { name: &'static str },
    InvalidNewNonceHash { got: [u8; 16], expected: [u8; 16] },
    DhGenFail,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNonce { got, expected } => {
                write!(f, "nonce mismatch: got {got:?}, expected {expected:?}")
            }
            Self::InvalidServerNonce { got, expected } => {
                write!(f, "server_nonce mismatch: got {got:?}, expected {expected:?}")
            }
            Self::InvalidPqSize { size } => write!(f, "pq size {size} invalid (expected at most 8)"),
            Self::Factorization(e) => write!(f, "factorization: {e}"),
            Self::UntrustedServer { fingerprints } => {
                write!(f, "no trusted key among fingerprints {fingerprints:?}")
            }
            Self::Rsa(e) => write!(f, "rsa: {e}"),
            Self::DhParamsFail => write!(f, "server returned DH params failure"),
            Self::EncryptedResponseNotPadded { len } => {
                write!(f, "encrypted answer len {len} is not 16-byte aligned")
            }
            Self::InvalidDhInnerData { error } => write!(f, "DH inner data: {error}"),
            Self::InvalidAnswerHash { got, expected } => {
                write!(f, "answer hash mismatch: got {got:?}, expected {expected:?}")
            }
            Self::InvalidDhPrime { reason } => write!(f, "invalid dh_prime: {reason}"),
            Self::UnsupportedGenerator { g } => write!(f, "unsupported or mismatched generator g={g}"),
            Self::GParameterOutOfRange { name } => write!(f, "{name} out of range (1, p - 1)"),
            Self::InvalidNewNonceHash { got, expected } => {
                write!(f, "new nonce hash mismatch: got {got:?}, expected {expected:?}")
            }
            Self::DhGenFail => write!(f, "DH gen failed"),
        }
    }
}

impl From<factorize::Error> for Error {
    fn from(e: factorize::Error) -> Self {
        Self::Factorization(e)
    }
}

impl From<rsa::Error> for Error {
    fn from(e: rsa::Error) -> Self {
        Self::Rsa(e)
    }
}

// ─── Step state ───────────────────────────────────────────────────────────────

/// State after step 1.
#[derive(Debug)]
pub struct Step1 {
    nonce: [u8; 16],
}

/// State after step 2.
#[derive(Debug)]
pub struct Step2 {
    nonce: [u8; 16],
    server_nonce: [u8; 16],
    new_nonce: [u8; 32],
}

#[derive(Clone, Debug)]
struct DhParams {
    g: BigUint,
    g_a: BigUint,
    dh_prime: BigUint,
    key: [u8; 32],
    iv: [u8; 32],
}

/// State after step 3, and after each `dh_gen_retry`.
#[derive(Debug)]
pub struct Step3 {
    nonce: [u8; 16],
    server_nonce: [u8; 16],
    new_nonce: [u8; 32],
    dh: DhParams,
    auth_key: AuthKey,
    time_offset: i32,
}

/// The final output of a successful handshake.
#[derive(Clone, Debug, PartialEq)]
pub struct Finished {
    pub auth_key: AuthKey,
    /// Server time minus local time, in seconds.
    pub time_offset: i32,
    /// `new_nonce[0..8] XOR server_nonce[0..8]`.
    pub first_salt: i64,
}

/// Result of feeding the server's `Set_client_DH_params_answer`.
#[derive(Debug)]
pub enum DhGenOutcome {
    Done(Finished),
    /// The server asked for a new `g_b`; send the request and call
    /// [`finish`] again with the returned state.
    Retry(functions::SetClientDhParams, Step3),
}

// ─── Step 1: req_pq_multi ─────────────────────────────────────────────────────

/// Generate a `req_pq_multi` request with a fresh random nonce.
pub fn step1() -> (functions::ReqPqMulti, Step1) {
    do_step1(random())
}

pub fn do_step1(nonce: [u8; 16]) -> (functions::ReqPqMulti, Step1) {
    (functions::ReqPqMulti { nonce }, Step1 { nonce })
}

// ─── Step 2: req_DH_params ────────────────────────────────────────────────────

/// Process `ResPQ`, factor `pq`, and build an RSA-encrypted `req_DH_params`.
pub fn step2(
    data: Step1,
    response: enums::ResPq,
    keys: &RsaKeyStore,
) -> Result<(functions::ReqDhParams, Step2), Error> {
    do_step2(data, response, keys, random(), &random::<235>())
}

fn trim_be(v: u64) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let skip = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[skip..].to_vec()
}

pub fn do_step2(
    data: Step1,
    response: enums::ResPq,
    keys: &RsaKeyStore,
    new_nonce: [u8; 32],
    padding: &[u8],
) -> Result<(functions::ReqDhParams, Step2), Error> {
    let Step1 { nonce } = data;
    let enums::ResPq::ResPq(res_pq) = response;

    check_nonce(&res_pq.nonce, &nonce)?;

    if res_pq.pq.is_empty() || res_pq.pq.len() > 8 {
        return Err(Error::InvalidPqSize { size: res_pq.pq.len() });
    }
    let mut pq_bytes = [0u8; 8];
    pq_bytes[8 - res_pq.pq.len()..].copy_from_slice(&res_pq.pq);
    let pq = u64::from_be_bytes(pq_bytes);
    let (p, q) = factorize(pq)?;
    log::debug!("[gramkit] factorized pq={pq} into {p} * {q}");

    let key = keys.find(&res_pq.server_public_key_fingerprints).ok_or_else(|| {
        Error::UntrustedServer { fingerprints: res_pq.server_public_key_fingerprints.clone() }
    })?;

    let p_bytes = trim_be(p);
    let q_bytes = trim_be(q);
    let pq_inner = enums::PQInnerData::PQInnerData(types::PQInnerData {
        pq: res_pq.pq.clone(),
        p: p_bytes.clone(),
        q: q_bytes.clone(),
        nonce,
        server_nonce: res_pq.server_nonce,
        new_nonce,
    })
    .to_bytes();

    let encrypted_data = rsa::encrypt_hashed(&pq_inner, key, padding)?;

    Ok((
        functions::ReqDhParams {
            nonce,
            server_nonce: res_pq.server_nonce,
            p: p_bytes,
            q: q_bytes,
            public_key_fingerprint: key.fingerprint(),
            encrypted_data,
        },
        Step2 { nonce, server_nonce: res_pq.server_nonce, new_nonce },
    ))
}

// ─── Step 3: set_client_DH_params ─────────────────────────────────────────────

/// Decrypt and validate `ServerDhParams`, then build `set_client_DH_params`.
pub fn step3(
    data: Step2,
    response: enums::ServerDhParams,
) -> Result<(functions::SetClientDhParams, Step3), Error> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i32;
    do_step3(data, response, &random::<272>(), now)
}

pub fn do_step3(
    data: Step2,
    response: enums::ServerDhParams,
    random: &[u8; 272],
    now: i32,
) -> Result<(functions::SetClientDhParams, Step3), Error> {
    let Step2 { nonce, server_nonce, new_nonce } = data;

    let mut server_dh_ok = match response {
        enums::ServerDhParams::Fail(fail) => {
            check_nonce(&fail.nonce, &nonce)?;
            check_server_nonce(&fail.server_nonce, &server_nonce)?;
            let digest = sha1!(&new_nonce);
            let mut expected = [0u8; 16];
            expected.copy_from_slice(&digest[4..]);
            check_new_nonce_hash(&fail.new_nonce_hash, &expected)?;
            return Err(Error::DhParamsFail);
        }
        enums::ServerDhParams::Ok(ok) => ok,
    };

    check_nonce(&server_dh_ok.nonce, &nonce)?;
    check_server_nonce(&server_dh_ok.server_nonce, &server_nonce)?;

    let len = server_dh_ok.encrypted_answer.len();
    if len < 20 || len % 16 != 0 {
        return Err(Error::EncryptedResponseNotPadded { len });
    }

    let (key, iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
    aes::ige_decrypt(&mut server_dh_ok.encrypted_answer, &key, &iv);
    let plain = server_dh_ok.encrypted_answer;

    let mut got_hash = [0u8; 20];
    got_hash.copy_from_slice(&plain[..20]);
    let mut cursor = Cursor::from_slice(&plain[20..]);
    let enums::ServerDhInnerData::ServerDhInnerData(inner) =
        enums::ServerDhInnerData::deserialize(&mut cursor)
            .map_err(|error| Error::InvalidDhInnerData { error })?;

    let expected_hash = sha1!(&plain[20..20 + cursor.pos()]);
    if got_hash != expected_hash {
        return Err(Error::InvalidAnswerHash { got: got_hash, expected: expected_hash });
    }

    check_nonce(&inner.nonce, &nonce)?;
    check_server_nonce(&inner.server_nonce, &server_nonce)?;

    let dh_prime = BigUint::from_bytes_be(&inner.dh_prime);
    validate_dh_prime(&dh_prime, inner.g)?;

    let g = BigUint::from(inner.g as u32);
    let g_a = BigUint::from_bytes_be(&inner.g_a);
    check_in_range(&g, &dh_prime, "g")?;
    check_in_range(&g_a, &dh_prime, "g_a")?;

    let time_offset = inner.server_time - now;
    log::debug!("[gramkit] DH params accepted (g={}, time offset {time_offset})", inner.g);

    let dh = DhParams { g, g_a, dh_prime, key, iv };
    let (request, auth_key) = client_dh_params(nonce, server_nonce, &dh, 0, random)?;

    Ok((request, Step3 { nonce, server_nonce, new_nonce, dh, auth_key, time_offset }))
}

/// Pick `b` from `random`, derive `g_b` and the auth key, and encrypt the
/// client DH inner data.
fn client_dh_params(
    nonce: [u8; 16],
    server_nonce: [u8; 16],
    dh: &DhParams,
    retry_id: i64,
    random: &[u8; 272],
) -> Result<(functions::SetClientDhParams, AuthKey), Error> {
    let b = BigUint::from_bytes_be(&random[..256]);
    let g_b = dh.g.modpow(&b, &dh.dh_prime);
    check_in_range(&g_b, &dh.dh_prime, "g_b")?;
    let gab = dh.g_a.modpow(&b, &dh.dh_prime);
    let auth_key = AuthKey::from_shared_secret(&gab.to_bytes_be())
        .ok_or(Error::InvalidDhPrime { reason: "shared secret wider than 2048 bits" })?;

    let client_dh_inner = enums::ClientDhInnerData::ClientDhInnerData(types::ClientDhInnerData {
        nonce,
        server_nonce,
        retry_id,
        g_b: g_b.to_bytes_be(),
    })
    .to_bytes();

    let pad_len = aes::padding_to_block(20 + client_dh_inner.len());
    let mut hashed = Vec::with_capacity(20 + client_dh_inner.len() + pad_len);
    hashed.extend_from_slice(&sha1!(&client_dh_inner));
    hashed.extend_from_slice(&client_dh_inner);
    hashed.extend_from_slice(&random[256..256 + pad_len]);

    aes::ige_encrypt(&mut hashed, &dh.key, &dh.iv);

    Ok((functions::SetClientDhParams { nonce, server_nonce, encrypted_data: hashed }, auth_key))
}

// ─── finish: dh_gen_* ─────────────────────────────────────────────────────────

/// Verify the server's answer.
///
/// `dh_gen_ok` completes the exchange; `dh_gen_retry` yields a new
/// request using `retry_id = aux_hash`; `dh_gen_fail` is terminal.
pub fn finish(data: Step3, response: enums::SetClientDhParamsAnswer) -> Result<DhGenOutcome, Error> {
    do_finish(data, response, &random::<272>())
}

pub fn do_finish(
    data: Step3,
    response: enums::SetClientDhParamsAnswer,
    random: &[u8; 272],
) -> Result<DhGenOutcome, Error> {
    let (answer_nonce, answer_server_nonce, hash, number) = match &response {
        enums::SetClientDhParamsAnswer::DhGenOk(x) => (x.nonce, x.server_nonce, x.new_nonce_hash1, 1),
        enums::SetClientDhParamsAnswer::DhGenRetry(x) => (x.nonce, x.server_nonce, x.new_nonce_hash2, 2),
        enums::SetClientDhParamsAnswer::DhGenFail(x) => (x.nonce, x.server_nonce, x.new_nonce_hash3, 3),
    };

    check_nonce(&answer_nonce, &data.nonce)?;
    check_server_nonce(&answer_server_nonce, &data.server_nonce)?;
    let expected = data.auth_key.calc_new_nonce_hash(&data.new_nonce, number);
    check_new_nonce_hash(&hash, &expected)?;

    match number {
        1 => {
            let mut salt = [0u8; 8];
            for ((dst, a), b) in salt.iter_mut().zip(&data.new_nonce[..8]).zip(&data.server_nonce[..8]) {
                *dst = a ^ b;
            }
            log::info!("[gramkit] auth key generated: {:?}", data.auth_key);
            Ok(DhGenOutcome::Done(Finished {
                auth_key: data.auth_key,
                time_offset: data.time_offset,
                first_salt: i64::from_le_bytes(salt),
            }))
        }
        2 => {
            let retry_id = i64::from_le_bytes(data.auth_key.aux_hash());
            log::info!("[gramkit] server asked to retry DH with retry_id {retry_id}");
            let (request, auth_key) =
                client_dh_params(data.nonce, data.server_nonce, &data.dh, retry_id, random)?;
            Ok(DhGenOutcome::Retry(request, Step3 { auth_key, ..data }))
        }
        _ => Err(Error::DhGenFail),
    }
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// Check the server-supplied DH group: `p` is a 2048-bit safe prime and `g`
/// is one of 2..=7 generating the quadratic-residue subgroup.
pub fn validate_dh_prime(p: &BigUint, g: i32) -> Result<(), Error> {
    if p.bits() != DH_PRIME_BITS {
        return Err(Error::InvalidDhPrime { reason: "not 2048 bits" });
    }
    let rem = |m: u32| (p % m).to_u32_digits().first().copied().unwrap_or(0);
    let generator_ok = match g {
        2 => rem(8) == 7,
        3 => rem(3) == 2,
        4 => true,
        5 => matches!(rem(5), 1 | 4),
        6 => matches!(rem(24), 19 | 23),
        7 => matches!(rem(7), 3 | 5 | 6),
        _ => false,
    };
    if !generator_ok {
        return Err(Error::UnsupportedGenerator { g });
    }
    if !prime::is_safe_prime(p) {
        return Err(Error::InvalidDhPrime { reason: "not a safe prime" });
    }
    Ok(())
}

/// `1 < value < p - 1`.
fn check_in_range(value: &BigUint, p: &BigUint, name: &'static str) -> Result<(), Error> {
    let one = BigUint::one();
    if &one < value && value < &(p - &one) {
        Ok(())
    } else {
        Err(Error::GParameterOutOfRange { name })
    }
}

fn check_nonce(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidNonce { got: *got, expected: *expected })
    }
}

fn check_server_nonce(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidServerNonce { got: *got, expected: *expected })
    }
}

fn check_new_nonce_hash(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidNewNonceHash { got: *got, expected: *expected })
    }
}
