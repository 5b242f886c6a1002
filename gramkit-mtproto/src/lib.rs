//! Sans-IO MTProto 2.0 core.
//!
//! This crate handles:
//! * The DH authorization key exchange ([`authentication`])
//! * Protocol counters: message ids, sequence numbers, clock drift ([`MtprotoState`])
//! * Plaintext and encrypted message encoding
//! * Message containers, `rpc_result` and `gzip_packed` envelopes
//! * Full transport framing with CRC32
//!
//! Nothing here performs IO: bring your own socket.

#![deny(unsafe_code)]

pub mod authentication;
pub mod encrypted;
pub mod message;
pub mod plain;
pub mod state;
pub mod transport;

pub use encrypted::EncryptedEncoder;
pub use message::Message;
pub use state::MtprotoState;
pub use transport::{Full, Transport};
