//! A scripted server speaking encrypted MTProto over an in-memory stream.

#![allow(dead_code)]

use gramkit_client::Connection;
use gramkit_crypto::{AuthKey, Side, decrypt_data_v2};
use gramkit_mtproto::message::RpcResult;
use gramkit_mtproto::{EncryptedEncoder, Message, MtprotoState};
use gramkit_tl_types::{Deserializable, Identifiable, types};
use tokio::io::{AsyncRead, AsyncWrite};

pub const SALT: i64 = 0x0123_4567_89ab_cdef;
pub const MSGS_ACK_ID: u32 = <types::MsgsAck as Identifiable>::CONSTRUCTOR_ID;

pub fn auth_key_bytes() -> [u8; 256] {
    core::array::from_fn(|i| (i as u8).wrapping_mul(13).wrapping_add(5))
}

pub fn auth_key() -> AuthKey {
    AuthKey::from_bytes(auth_key_bytes())
}

/// What the client sent, with the envelope fields the tests look at.
#[derive(Debug)]
pub struct Inbound {
    pub salt: i64,
    pub session_id: i64,
    pub message: Message,
}

impl Inbound {
    pub fn constructor_id(&self) -> Option<u32> {
        self.message.constructor_id()
    }
}

pub struct Server {
    conn: Connection,
    key: AuthKey,
    encoder: EncryptedEncoder,
    state: MtprotoState,
    /// Salt stamped on outgoing messages.
    pub salt: i64,
}

impl Server {
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self {
            conn: Connection::from_stream(stream),
            key: auth_key(),
            encoder: EncryptedEncoder::for_side(auth_key(), Side::Server),
            state: MtprotoState::with_session_id(0),
            salt: SALT,
        }
    }

    /// Next client message of any kind. Replies go to the session it came from.
    pub async fn recv(&mut self) -> Inbound {
        let frame = self.conn.recv().await.unwrap();
        let plaintext = decrypt_data_v2(&frame, &self.key, Side::Client).unwrap();
        let salt = i64::from_le_bytes(plaintext[..8].try_into().unwrap());
        let session_id = i64::from_le_bytes(plaintext[8..16].try_into().unwrap());
        self.state.session_id = session_id;
        let message = Message::from_bytes(&plaintext[16..]).unwrap();
        Inbound { salt, session_id, message }
    }

    /// Next client message that is not an acknowledgement.
    pub async fn recv_request(&mut self) -> Inbound {
        loop {
            let inbound = self.recv().await;
            if inbound.constructor_id() != Some(MSGS_ACK_ID) {
                return inbound;
            }
        }
    }

    /// Send `body` as a top-level message and return its id.
    pub async fn send(&mut self, body: Vec<u8>, content_related: bool) -> i64 {
        self.state.salt = self.salt;
        let seq_no = self.state.next_seq_no(content_related);
        let msg_id = self.state.next_msg_id() | 1;
        let frame = self.encoder.encode_message(&self.state, &Message::new(msg_id, seq_no, body));
        self.conn.send(&frame).await.unwrap();
        msg_id
    }

    pub async fn reply(&mut self, req_msg_id: i64, result: Vec<u8>) {
        self.send(RpcResult { req_msg_id, result }.to_bytes(), true).await;
    }

    pub async fn hang_up(&self) {
        self.conn.disconnect().await;
    }
}
