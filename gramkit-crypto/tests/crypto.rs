use gramkit_crypto::{AuthKey, Side, aes, decrypt_data_v2, encrypt_data_v2, factorize, rsa, sha1};

// ── AES-IGE ───────────────────────────────────────────────────────────────────

#[test]
fn ige_involution_over_many_lengths() {
    let key = [0x5a; 32];
    let iv: [u8; 32] = core::array::from_fn(|i| 255 - i as u8);
    for len in 0..70usize {
        let data: Vec<u8> = (0..len).map(|i| i as u8 ^ 0x3c).collect();
        let mut buffer = aes::ige_encrypt_padded(&data, &key, &iv);
        assert_eq!(buffer.len(), len + aes::padding_to_block(len));
        aes::ige_decrypt(&mut buffer, &key, &iv);
        assert_eq!(&buffer[..len], &data[..]);
    }
}

// ── Message encryption ────────────────────────────────────────────────────────

#[test]
fn server_message_roundtrip() {
    let auth_key = AuthKey::from_bytes(core::array::from_fn(|i| (i as u8).wrapping_mul(13)));
    let plaintext = b"salt....session.message body that is long enough".to_vec();
    let frame = encrypt_data_v2(&plaintext, &auth_key, Side::Server);
    assert_eq!((frame.len() - 24) % 16, 0);
    let decrypted = decrypt_data_v2(&frame, &auth_key, Side::Server).unwrap();
    assert_eq!(&decrypted[..plaintext.len()], &plaintext[..]);
}

#[test]
fn tampered_ciphertext_fails_msg_key() {
    let auth_key = AuthKey::from_bytes([3; 256]);
    let mut frame = encrypt_data_v2(&[0; 48], &auth_key, Side::Client);
    let last = frame.len() - 1;
    frame[last] ^= 1;
    assert!(decrypt_data_v2(&frame, &auth_key, Side::Client).is_err());
}

// ── Factorization ─────────────────────────────────────────────────────────────

#[test]
fn factorize_is_unordered_product() {
    for (p, q) in [(1_000_003u64, 999_983u64), (1_206_429_347, 1_218_991_343)] {
        let (a, b) = factorize(p * q).unwrap();
        assert!(a <= b);
        assert_eq!((a, b), (p.min(q), p.max(q)));
    }
}

#[test]
fn factorize_rejects_square() {
    assert!(factorize(1_000_003 * 1_000_003).is_err());
}

// ── RSA ───────────────────────────────────────────────────────────────────────

#[test]
fn custom_keys_can_be_trusted() {
    let mut store = rsa::RsaKeyStore::empty();
    assert!(store.is_empty());
    let builtin = rsa::RsaKeyStore::builtin();
    let key = builtin.get(-5595554452916591101).cloned().unwrap();
    store.insert(key);
    assert_eq!(store.find(&[-3414540481677951611, -5595554452916591101]).map(|k| k.fingerprint()), Some(-5595554452916591101));
}

#[test]
fn sha_macros_are_exported() {
    assert_eq!(sha1!(b"").len(), 20);
}
