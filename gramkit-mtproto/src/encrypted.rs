//! Encrypted MTProto 2.0 encoding (post auth-key).
//!
//! Once the key exchange produced a [`Finished`](crate::authentication::Finished),
//! build an [`EncryptedEncoder`] around its key and use it for every
//! subsequent message. Counters live in [`MtprotoState`], which the caller
//! owns and locks.
//!
//! Decrypted payload layout:
//!
//! ```text
//! salt:       i64
//! session_id: i64
//! msg_id:     i64
//! seq_no:     i32
//! body_len:   i32
//! body:       [u8; body_len]
//! padding:    12..27 random bytes
//! ```

use gramkit_crypto::{AuthKey, DecryptError, Side, decrypt_data_v2, encrypt_data_v2};
use gramkit_tl_types::{Deserializable, Serializable};

use crate::message::Message;
use crate::state::MtprotoState;

/// Errors that can occur when decoding an inbound encrypted frame.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeError {
    /// The crypto layer rejected the frame (key id, msg_key or size).
    Crypto(DecryptError),
    /// The decrypted payload is too short to hold the salt and session id.
    TooShort { len: usize },
    /// Salt differs from ours and ours is not the zero placeholder.
    BadSalt { got: i64, expected: i64 },
    /// Session id mismatch (wrong connection or replay).
    BadSessionId { got: i64, expected: i64 },
    /// The inner message envelope is malformed.
    Message(gramkit_tl_types::deserialize::Error),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crypto(e) => write!(f, "crypto: {e}"),
            Self::TooShort { len } => write!(f, "decrypted payload too short ({len} bytes)"),
            Self::BadSalt { got, expected } => write!(f, "salt mismatch: got {got}, expected {expected}"),
            Self::BadSessionId { got, expected } => {
                write!(f, "session_id mismatch: got {got}, expected {expected}")
            }
            Self::Message(e) => write!(f, "inner message: {e}"),
        }
    }
}
impl std::error::Error for DecodeError {}

impl From<DecryptError> for DecodeError {
    fn from(e: DecryptError) -> Self {
        Self::Crypto(e)
    }
}

fn le_i64(bytes: &[u8]) -> i64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[..8]);
    i64::from_le_bytes(b)
}

/// MTProto 2.0 message encryption bound to one auth key.
#[derive(Clone, Debug)]
pub struct EncryptedEncoder {
    auth_key: AuthKey,
    side: Side,
}

impl EncryptedEncoder {
    /// An encoder for the client end of the connection.
    pub fn new(auth_key: AuthKey) -> Self {
        Self::for_side(auth_key, Side::Client)
    }

    /// An encoder that writes as `side` and reads what the other side wrote.
    pub fn for_side(auth_key: AuthKey, side: Side) -> Self {
        Self { auth_key, side }
    }

    pub fn auth_key(&self) -> &AuthKey {
        &self.auth_key
    }

    fn peer(&self) -> Side {
        match self.side {
            Side::Client => Side::Server,
            Side::Server => Side::Client,
        }
    }

    /// Encrypt an already framed inner message as `salt ‖ session_id ‖ message`.
    pub fn encode(&self, state: &MtprotoState, message: &[u8]) -> Vec<u8> {
        let mut plaintext = Vec::with_capacity(16 + message.len());
        plaintext.extend(state.salt.to_le_bytes());
        plaintext.extend(state.session_id.to_le_bytes());
        plaintext.extend_from_slice(message);
        encrypt_data_v2(&plaintext, &self.auth_key, self.side)
    }

    pub fn encode_message(&self, state: &MtprotoState, message: &Message) -> Vec<u8> {
        self.encode(state, &message.to_bytes())
    }

    /// Assign a message id and sequence number to `body`, then encrypt it.
    ///
    /// Returns the ciphertext and the allocated `msg_id`.
    pub fn wrap(&self, state: &mut MtprotoState, body: &[u8], content_related: bool) -> (Vec<u8>, i64) {
        let message = self.frame(state, body, content_related);
        (self.encode_message(state, &message), message.msg_id)
    }

    /// Frame `body` without encrypting, so it can join a container.
    pub fn frame(&self, state: &mut MtprotoState, body: &[u8], content_related: bool) -> Message {
        let seq_no = state.next_seq_no(content_related);
        let msg_id = state.next_msg_id();
        Message::new(msg_id, seq_no, body.to_vec())
    }

    /// Decrypt an inbound frame and verify salt and session id.
    ///
    /// A zero local salt accepts any server salt, to get through the first
    /// exchange before the real salt is known.
    pub fn decode(&self, state: &MtprotoState, frame: &[u8]) -> Result<Message, DecodeError> {
        let plaintext = decrypt_data_v2(frame, &self.auth_key, self.peer())?;
        if plaintext.len() < 16 {
            return Err(DecodeError::TooShort { len: plaintext.len() });
        }

        let salt = le_i64(&plaintext[..8]);
        if salt != state.salt {
            if state.salt != 0 {
                return Err(DecodeError::BadSalt { got: salt, expected: state.salt });
            }
            log::warn!("[gramkit] accepting server salt {salt} while local salt is unset");
        }

        let session_id = le_i64(&plaintext[8..16]);
        if session_id != state.session_id {
            return Err(DecodeError::BadSessionId { got: session_id, expected: state.session_id });
        }

        Message::from_bytes(&plaintext[16..]).map_err(DecodeError::Message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AuthKey {
        AuthKey::from_bytes(core::array::from_fn(|i| (i as u8).wrapping_mul(31).wrapping_add(7)))
    }

    fn pair() -> (EncryptedEncoder, EncryptedEncoder, MtprotoState) {
        let mut state = MtprotoState::with_session_id(0x5e55);
        state.salt = 0x5a17;
        (EncryptedEncoder::new(key()), EncryptedEncoder::for_side(key(), Side::Server), state)
    }

    #[test]
    fn server_reads_client_frame() {
        let (client, server, mut state) = pair();
        let (frame, msg_id) = client.wrap(&mut state, &[1, 2, 3, 4], true);
        assert_eq!(&frame[..8], &key().key_id());
        let message = server.decode(&state, &frame).unwrap();
        assert_eq!(message.msg_id, msg_id);
        assert_eq!(message.seq_no, 1);
        assert_eq!(message.body, vec![1, 2, 3, 4]);
    }

    #[test]
    fn client_reads_server_frame() {
        let (client, server, state) = pair();
        let reply = Message::new(77 << 32 | 1, 2, vec![5; 8]);
        let frame = server.encode_message(&state, &reply);
        assert_eq!(client.decode(&state, &frame).unwrap(), reply);
    }

    #[test]
    fn salt_mismatch() {
        let (client, server, mut state) = pair();
        let frame = server.encode_message(&state, &Message::new(1, 0, vec![]));
        state.salt = 1;
        assert_eq!(
            client.decode(&state, &frame),
            Err(DecodeError::BadSalt { got: 0x5a17, expected: 1 })
        );
        state.salt = 0;
        assert!(client.decode(&state, &frame).is_ok());
    }

    #[test]
    fn session_mismatch() {
        let (client, server, mut state) = pair();
        let frame = server.encode_message(&state, &Message::new(1, 0, vec![]));
        state.session_id = 1;
        assert_eq!(
            client.decode(&state, &frame),
            Err(DecodeError::BadSessionId { got: 0x5e55, expected: 1 })
        );
    }

    #[test]
    fn own_frames_do_not_decode_as_peer() {
        let (client, _, mut state) = pair();
        let (frame, _) = client.wrap(&mut state, &[0; 4], false);
        assert!(matches!(client.decode(&state, &frame), Err(DecodeError::Crypto(_))));
    }

    #[test]
    fn unrelated_messages_keep_even_seq() {
        let (client, server, mut state) = pair();
        let (frame, _) = client.wrap(&mut state, &[0; 4], false);
        assert_eq!(server.decode(&state, &frame).unwrap().seq_no, 0);
        let (frame, _) = client.wrap(&mut state, &[0; 4], true);
        assert_eq!(server.decode(&state, &frame).unwrap().seq_no, 1);
        let (frame, _) = client.wrap(&mut state, &[0; 4], false);
        assert_eq!(server.decode(&state, &frame).unwrap().seq_no, 2);
    }
}
