//! Full key exchange against a scripted server that knows the client's
//! nonces, so it never has to decrypt the RSA layer.

use gramkit_crypto::{AuthKey, RsaKeyStore, aes, generate_key_data_from_nonce, sha1};
use gramkit_mtproto::authentication::{self, DhGenOutcome, Error, Step3};
use gramkit_tl_types::{Cursor, Deserializable, Serializable, enums, functions, types};
use num_bigint::BigUint;

const DH_PRIME_HEX: &str = "C71CAEB9C6B1C9048E6C522F70F13F73980D40238E3E21C14934D037563D930F48198A0AA7C14058229493D22530F4DBFA336F6E0AC925139543AED44CCE7C3720FD51F69458705AC68CD4FE6B6B13ABDC9746512969328454F18FAF8C595F642477FE96BB2A941D5BCD1D4AC8CC49880708FA9B378E3C4F3A9060BEE67CF9A4A4A695811051907E162753B56B0F6B410DBA74D8A84B2A14B3144E0EF1284754FD17ED950D5965B4B9DD46582DB1178D169C6BC465B0D6FF9CA3928FEF5B9AE4E418FC15E83EBEA0F87FA9FF5EED70050DED2849F47BF959D956850CE929851F0D8115F635B105EE2E4E15D04B2454BF6F4FADF034B10403119CD8E3B92FCC5B";

const PRODUCTION_FINGERPRINT: i64 = -3414540481677951611;
const NONCE: [u8; 16] = [0x11; 16];
const SERVER_NONCE: [u8; 16] = [0xAB; 16];
const SERVER_TIME: i32 = 1_700_000_000;

fn new_nonce() -> [u8; 32] {
    core::array::from_fn(|i| i as u8)
}

struct ScriptedServer {
    dh_prime: BigUint,
    g: u32,
    a: BigUint,
    key: [u8; 32],
    iv: [u8; 32],
}

impl ScriptedServer {
    fn new() -> Self {
        let (key, iv) = generate_key_data_from_nonce(&SERVER_NONCE, &new_nonce());
        Self {
            dh_prime: BigUint::parse_bytes(DH_PRIME_HEX.as_bytes(), 16).unwrap(),
            g: 3,
            a: BigUint::from_bytes_be(&[0x24; 256]),
            key,
            iv,
        }
    }

    fn res_pq(&self, fingerprints: Vec<i64>) -> enums::ResPq {
        enums::ResPq::ResPq(types::ResPq {
            nonce: NONCE,
            server_nonce: SERVER_NONCE,
            pq: 1470626929934143021u64.to_be_bytes().to_vec(),
            server_public_key_fingerprints: fingerprints,
        })
    }

    fn inner_data(&self) -> Vec<u8> {
        let g_a = BigUint::from(self.g).modpow(&self.a, &self.dh_prime);
        enums::ServerDhInnerData::ServerDhInnerData(types::ServerDhInnerData {
            nonce: NONCE,
            server_nonce: SERVER_NONCE,
            g: self.g as i32,
            dh_prime: self.dh_prime.to_bytes_be(),
            g_a: g_a.to_bytes_be(),
            server_time: SERVER_TIME,
        })
        .to_bytes()
    }

    fn encrypt_answer(&self, inner: &[u8]) -> enums::ServerDhParams {
        let mut answer = sha1!(inner).to_vec();
        answer.extend_from_slice(inner);
        let pad = aes::padding_to_block(answer.len());
        answer.extend(std::iter::repeat_n(0u8, pad));
        aes::ige_encrypt(&mut answer, &self.key, &self.iv);
        enums::ServerDhParams::Ok(types::ServerDhParamsOk {
            nonce: NONCE,
            server_nonce: SERVER_NONCE,
            encrypted_answer: answer,
        })
    }

    fn server_dh_params(&self) -> enums::ServerDhParams {
        self.encrypt_answer(&self.inner_data())
    }

    /// Decrypt the client's DH inner data and derive the same auth key.
    fn read_client_dh(&self, request: &functions::SetClientDhParams) -> (types::ClientDhInnerData, AuthKey) {
        assert_eq!(request.nonce, NONCE);
        assert_eq!(request.server_nonce, SERVER_NONCE);
        let mut plain = request.encrypted_data.clone();
        aes::ige_decrypt(&mut plain, &self.key, &self.iv);
        let mut cursor = Cursor::from_slice(&plain[20..]);
        let enums::ClientDhInnerData::ClientDhInnerData(inner) =
            enums::ClientDhInnerData::deserialize(&mut cursor).unwrap();
        assert_eq!(&plain[..20], &sha1!(&plain[20..20 + cursor.pos()]));

        let g_b = BigUint::from_bytes_be(&inner.g_b);
        let gab = g_b.modpow(&self.a, &self.dh_prime);
        let auth_key = AuthKey::from_shared_secret(&gab.to_bytes_be()).unwrap();
        (inner, auth_key)
    }

    fn dh_gen_ok(&self, auth_key: &AuthKey) -> enums::SetClientDhParamsAnswer {
        enums::SetClientDhParamsAnswer::DhGenOk(types::DhGenOk {
            nonce: NONCE,
            server_nonce: SERVER_NONCE,
            new_nonce_hash1: auth_key.calc_new_nonce_hash(&new_nonce(), 1),
        })
    }

    fn dh_gen_retry(&self, auth_key: &AuthKey) -> enums::SetClientDhParamsAnswer {
        enums::SetClientDhParamsAnswer::DhGenRetry(types::DhGenRetry {
            nonce: NONCE,
            server_nonce: SERVER_NONCE,
            new_nonce_hash2: auth_key.calc_new_nonce_hash(&new_nonce(), 2),
        })
    }
}

fn client_random(byte: u8) -> [u8; 272] {
    [byte; 272]
}

/// Run steps 1 to 3 and hand back the request the client would send.
fn run_to_step3(server: &ScriptedServer) -> (functions::SetClientDhParams, Step3) {
    let (req, s1) = authentication::do_step1(NONCE);
    assert_eq!(req.nonce, NONCE);

    let keys = RsaKeyStore::builtin();
    let (req, s2) = authentication::do_step2(
        s1,
        server.res_pq(vec![7, PRODUCTION_FINGERPRINT]),
        &keys,
        new_nonce(),
        &[0x5a; 235],
    )
    .unwrap();
    assert_eq!(req.p, 1206429347u32.to_be_bytes().to_vec());
    assert_eq!(req.q, 1218991343u32.to_be_bytes().to_vec());
    assert_eq!(req.public_key_fingerprint, PRODUCTION_FINGERPRINT);
    assert_eq!(req.encrypted_data.len(), 256);

    authentication::do_step3(s2, server.server_dh_params(), &client_random(0x42), SERVER_TIME - 5)
        .unwrap()
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[test]
fn key_exchange_completes() {
    let server = ScriptedServer::new();
    let (req, s3) = run_to_step3(&server);

    let (inner, server_key) = server.read_client_dh(&req);
    assert_eq!(inner.retry_id, 0);

    let done = match authentication::finish(s3, server.dh_gen_ok(&server_key)).unwrap() {
        DhGenOutcome::Done(done) => done,
        DhGenOutcome::Retry(..) => panic!("unexpected retry"),
    };

    assert_eq!(done.auth_key, server_key);
    assert_eq!(i64::from_le_bytes(done.auth_key.key_id()), 7244326714134090423);
    assert_eq!(done.time_offset, 5);
    assert_eq!(done.first_salt, -6003950658742801749);
}

#[test]
fn retry_sends_aux_hash_and_new_key() {
    let server = ScriptedServer::new();
    let (req, s3) = run_to_step3(&server);
    let (_, first_key) = server.read_client_dh(&req);

    let (req, s3) =
        match authentication::do_finish(s3, server.dh_gen_retry(&first_key), &client_random(0x43)).unwrap() {
            DhGenOutcome::Retry(req, s3) => (req, s3),
            DhGenOutcome::Done(_) => panic!("expected retry"),
        };

    let (inner, second_key) = server.read_client_dh(&req);
    assert_eq!(inner.retry_id, i64::from_le_bytes(first_key.aux_hash()));
    assert_ne!(second_key, first_key);

    match authentication::finish(s3, server.dh_gen_ok(&second_key)).unwrap() {
        DhGenOutcome::Done(done) => assert_eq!(done.auth_key, second_key),
        DhGenOutcome::Retry(..) => panic!("unexpected retry"),
    }
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn dh_gen_fail_is_terminal() {
    let server = ScriptedServer::new();
    let (req, s3) = run_to_step3(&server);
    let (_, key) = server.read_client_dh(&req);
    let answer = enums::SetClientDhParamsAnswer::DhGenFail(types::DhGenFail {
        nonce: NONCE,
        server_nonce: SERVER_NONCE,
        new_nonce_hash3: key.calc_new_nonce_hash(&new_nonce(), 3),
    });
    assert!(matches!(authentication::finish(s3, answer), Err(Error::DhGenFail)));
}

#[test]
fn wrong_new_nonce_hash_is_rejected() {
    let server = ScriptedServer::new();
    let (_, s3) = run_to_step3(&server);
    let answer = enums::SetClientDhParamsAnswer::DhGenOk(types::DhGenOk {
        nonce: NONCE,
        server_nonce: SERVER_NONCE,
        new_nonce_hash1: [0; 16],
    });
    assert!(matches!(authentication::finish(s3, answer), Err(Error::InvalidNewNonceHash { .. })));
}

fn step2_state(server: &ScriptedServer) -> authentication::Step2 {
    let (_, s1) = authentication::do_step1(NONCE);
    authentication::do_step2(
        s1,
        server.res_pq(vec![PRODUCTION_FINGERPRINT]),
        &RsaKeyStore::builtin(),
        new_nonce(),
        &[0; 235],
    )
    .unwrap()
    .1
}

#[test]
fn tampered_answer_hash_is_rejected() {
    let server = ScriptedServer::new();
    let inner = server.inner_data();
    let mut answer = sha1!(&inner).to_vec();
    answer[0] ^= 1;
    answer.extend_from_slice(&inner);
    answer.extend(std::iter::repeat_n(0u8, aes::padding_to_block(answer.len())));
    aes::ige_encrypt(&mut answer, &server.key, &server.iv);
    let params = enums::ServerDhParams::Ok(types::ServerDhParamsOk {
        nonce: NONCE,
        server_nonce: SERVER_NONCE,
        encrypted_answer: answer,
    });

    let err = authentication::do_step3(step2_state(&server), params, &client_random(1), 0).unwrap_err();
    assert!(matches!(err, Error::InvalidAnswerHash { .. }));
}

#[test]
fn non_safe_prime_is_rejected() {
    let mut server = ScriptedServer::new();
    // Still 2048 bits and p ≡ 2 (mod 3), but composite.
    server.dh_prime = &server.dh_prime + 12u32;
    let err = authentication::do_step3(
        step2_state(&server),
        server.server_dh_params(),
        &client_random(1),
        0,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDhPrime { .. } | Error::UnsupportedGenerator { .. }));
}

#[test]
fn server_dh_params_fail_is_reported() {
    let server = ScriptedServer::new();
    let digest = sha1!(&new_nonce());
    let mut hash = [0u8; 16];
    hash.copy_from_slice(&digest[4..]);
    let params = enums::ServerDhParams::Fail(types::ServerDhParamsFail {
        nonce: NONCE,
        server_nonce: SERVER_NONCE,
        new_nonce_hash: hash,
    });
    let err = authentication::do_step3(step2_state(&server), params, &client_random(1), 0).unwrap_err();
    assert_eq!(err, Error::DhParamsFail);
}

#[test]
fn mismatched_server_nonce_is_rejected() {
    let server = ScriptedServer::new();
    let params = enums::ServerDhParams::Ok(types::ServerDhParamsOk {
        nonce: NONCE,
        server_nonce: [0; 16],
        encrypted_answer: vec![0; 32],
    });
    let err = authentication::do_step3(step2_state(&server), params, &client_random(1), 0).unwrap_err();
    assert!(matches!(err, Error::InvalidServerNonce { .. }));
}
