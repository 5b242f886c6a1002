//! # gramkit
//!
//! Telegram MTProto client library. The sub-crates are re-exported here:
//!
//! | Sub-crate          | Role                                                   |
//! |--------------------|--------------------------------------------------------|
//! | `gramkit-tl-types` | TL codec, constructors, functions and boxed enums      |
//! | `gramkit-crypto`   | AES-IGE, SHA, RSA, factorization, auth key derivation  |
//! | `gramkit-mtproto`  | Key exchange, message ids, encrypted framing, transport |
//! | `gramkit-client`   | Async connection, sessions, updates, sign-in           |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gramkit::{Client, Config, LoginCallbacks, UpdateEvent};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect(Config { api_id: 12345, api_hash: "hash".into(), ..Config::default() }).await?;
//! client.on_update(|event| {
//!     if let UpdateEvent::Skipped(channel) = event {
//!         println!("history skipped for {channel:?}");
//!     }
//!     Ok(())
//! });
//! client.start(&LoginCallbacks::stdin()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Raw API
//!
//! ```rust
//! use gramkit::tl::{functions, Serializable};
//!
//! let bytes = functions::help::GetConfig {}.to_bytes();
//! assert_eq!(bytes.len(), 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Re-export of [`gramkit_tl_types`]: constructors, functions and enums.
pub use gramkit_tl_types as tl;

/// Re-export of [`gramkit_mtproto`]: key exchange, protocol state, framing.
pub use gramkit_mtproto as mtproto;

/// Re-export of [`gramkit_crypto`]: AES-IGE, SHA, RSA, factorize, AuthKey.
pub use gramkit_crypto as crypto;

/// Re-export of [`gramkit_client`]: the async client.
pub use gramkit_client as client;

// ─── Convenience re-exports ───────────────────────────────────────────────────

pub use gramkit_client::{
    Client, ClientState, Config, InvocationError, LoginCallbacks, LoginToken, RpcError, SignInError,
    UpdateEvent,
};
pub use gramkit_tl_types::{Deserializable, Identifiable, LAYER, RemoteCall, Serializable};
