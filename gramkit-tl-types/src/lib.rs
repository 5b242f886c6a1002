//! Telegram's TL schema as Rust types, with the binary codec they share.
//!
//! Bare constructors are structs in [`types`]; each boxed type is an enum in
//! [`enums`] with one variant per constructor; RPC methods are structs in
//! [`functions`] that name their answer through [`RemoteCall::Return`].
//! [`walk`] gives a field-by-name view over decoded objects.
//!
//! ```rust
//! use gramkit_tl_types::{Serializable, functions};
//!
//! let request = functions::auth::SendCode {
//!     phone_number: "+1234567890".into(),
//!     api_id: 12345,
//!     api_hash: "abc".into(),
//!     settings: Default::default(),
//! };
//! assert_eq!(request.to_bytes().len() % 4, 0);
//! ```

#![deny(unsafe_code)]
#![allow(clippy::large_enum_variant)]

#[macro_use]
mod macros;

pub mod deserialize;
mod schema;
pub mod serialize;
pub mod walk;

pub use deserialize::{Cursor, Deserializable};
#[cfg(feature = "name-for-id")]
pub use schema::name_for_id;
pub use schema::{LAYER, enums, functions, types};
pub use serialize::Serializable;
pub use walk::TlObject;

/// `vector<T>` without the `0x1cb5c415` header that boxed `Vector<T>` carries.
#[derive(Clone, Debug, PartialEq)]
pub struct RawVec<T>(pub Vec<T>);

/// A constructor or method with a fixed 32-bit id in the schema.
pub trait Identifiable {
    const CONSTRUCTOR_ID: u32;
}

/// A method that can be invoked; the server answers with a `Return`.
pub trait RemoteCall: Serializable {
    type Return: Deserializable;
}
