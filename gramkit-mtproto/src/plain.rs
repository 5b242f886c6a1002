//! Plaintext message encoding, used only during the key exchange.
//!
//! ```text
//! auth_key_id:long  (always 0)
//! message_id:long
//! message_data_length:int
//! message_data:bytes
//! ```

use crate::state::MtprotoState;

/// Errors from [`decode`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeError {
    /// Fewer than the 20 header bytes.
    TooShort { len: usize },
    /// The `auth_key_id` field was not zero.
    NonZeroAuthKeyId { id: i64 },
    /// The declared length exceeds the bytes available.
    BadLength { declared: usize, available: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "plaintext message too short ({len} bytes)"),
            Self::NonZeroAuthKeyId { id } => write!(f, "plaintext message has auth_key_id {id}"),
            Self::BadLength { declared, available } => {
                write!(f, "declared length {declared} exceeds {available} available bytes")
            }
        }
    }
}
impl std::error::Error for DecodeError {}

/// A decoded plaintext message.
#[derive(Clone, Debug, PartialEq)]
pub struct PlainMessage {
    pub msg_id: i64,
    pub body: Vec<u8>,
}

/// Frame `body` with a fresh message id taken from `state`.
pub fn encode(state: &mut MtprotoState, body: &[u8]) -> Vec<u8> {
    encode_with_msg_id(state.next_msg_id(), body)
}

pub fn encode_with_msg_id(msg_id: i64, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(20 + body.len());
    buf.extend(0i64.to_le_bytes());
    buf.extend(msg_id.to_le_bytes());
    buf.extend((body.len() as u32).to_le_bytes());
    buf.extend_from_slice(body);
    buf
}

fn le_i64(bytes: &[u8]) -> i64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[..8]);
    i64::from_le_bytes(b)
}

/// Parse a plaintext message. Trailing bytes past the declared length are ignored.
pub fn decode(frame: &[u8]) -> Result<PlainMessage, DecodeError> {
    if frame.len() < 20 {
        return Err(DecodeError::TooShort { len: frame.len() });
    }
    let auth_key_id = le_i64(&frame[..8]);
    if auth_key_id != 0 {
        return Err(DecodeError::NonZeroAuthKeyId { id: auth_key_id });
    }
    let msg_id = le_i64(&frame[8..16]);
    let declared = u32::from_le_bytes([frame[16], frame[17], frame[18], frame[19]]) as usize;
    let available = frame.len() - 20;
    if declared > available {
        return Err(DecodeError::BadLength { declared, available });
    }
    Ok(PlainMessage { msg_id, body: frame[20..20 + declared].to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let frame = encode_with_msg_id(0x0102030405060708, &[9, 9, 9, 9]);
        assert_eq!(&frame[..8], &[0; 8]);
        assert_eq!(&frame[8..16], &0x0102030405060708i64.to_le_bytes());
        assert_eq!(&frame[16..20], &4u32.to_le_bytes());
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.msg_id, 0x0102030405060708);
        assert_eq!(decoded.body, vec![9; 4]);
    }

    #[test]
    fn encode_uses_state_clock() {
        let mut state = MtprotoState::with_session_id(0);
        let a = decode(&encode(&mut state, &[])).unwrap().msg_id;
        let b = decode(&encode(&mut state, &[])).unwrap().msg_id;
        assert!(b > a);
    }

    #[test]
    fn rejects_encrypted_frame() {
        let mut frame = encode_with_msg_id(1, &[0; 4]);
        frame[0] = 1;
        assert_eq!(decode(&frame), Err(DecodeError::NonZeroAuthKeyId { id: 1 }));
    }

    #[test]
    fn rejects_overlong_length() {
        let mut frame = encode_with_msg_id(1, &[0; 8]);
        frame.truncate(24);
        assert_eq!(decode(&frame), Err(DecodeError::BadLength { declared: 8, available: 4 }));
        assert_eq!(decode(&[0; 10]), Err(DecodeError::TooShort { len: 10 }));
    }
}
