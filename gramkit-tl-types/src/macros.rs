//! Declarative helpers that expand schema definitions into the same shape
//! of code for every constructor: a `struct`, [`Identifiable`](crate::Identifiable),
//! bare (de)serialization and the [`TlObject`](crate::walk::TlObject) view.
//!
//! Constructors carrying a `flags:#` word are written out by hand next to
//! their siblings because optional fields depend on the flag bits.

/// Implements [`TlObject`](crate::walk::TlObject) by visiting the listed fields in order.
macro_rules! impl_walk {
    ($name:ident { $($field:ident),* $(,)? }) => {
        impl crate::walk::TlObject for $name {
            fn as_any(&self) -> &dyn std::any::Any { self }

            #[allow(unused_variables)]
            fn walk_fields(&self, visit: &mut dyn FnMut(&'static str, &dyn crate::walk::TlObject)) {
                $( crate::walk::Walk::walk_as_field(&self.$field, stringify!($field), visit); )*
            }
        }
    };
}

/// A bare constructor without a flags word.
macro_rules! tl_type {
    (
        $(#[$meta:meta])*
        pub struct $name:ident = $id:literal {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl crate::Identifiable for $name {
            const CONSTRUCTOR_ID: u32 = $id;
        }

        impl crate::Serializable for $name {
            #[allow(unused_variables)]
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                $( crate::Serializable::serialize(&self.$field, buf); )*
            }
        }

        impl crate::Deserializable for $name {
            #[allow(unused_variables)]
            fn deserialize(buf: crate::deserialize::Buffer) -> crate::deserialize::Result<Self> {
                Ok(Self {
                    $( $field: <$ty as crate::Deserializable>::deserialize(buf)?, )*
                })
            }
        }

        impl_walk!($name { $($field),* });
    };
}

/// An RPC function without a flags word. Serialization is boxed (the
/// constructor id comes first); deserialization reads the bare body and is
/// only needed by in-process test servers.
macro_rules! tl_function {
    (
        $(#[$meta:meta])*
        pub struct $name:ident = $id:literal -> $ret:ty {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl crate::Identifiable for $name {
            const CONSTRUCTOR_ID: u32 = $id;
        }

        impl crate::Serializable for $name {
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                crate::Serializable::serialize(&<Self as crate::Identifiable>::CONSTRUCTOR_ID, buf);
                $( crate::Serializable::serialize(&self.$field, buf); )*
            }
        }

        impl crate::Deserializable for $name {
            #[allow(unused_variables)]
            fn deserialize(buf: crate::deserialize::Buffer) -> crate::deserialize::Result<Self> {
                Ok(Self {
                    $( $field: <$ty as crate::Deserializable>::deserialize(buf)?, )*
                })
            }
        }

        impl crate::RemoteCall for $name {
            type Return = $ret;
        }
    };
}

/// A boxed type: one variant per constructor, dispatched on the leading id.
macro_rules! tl_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident($ty:ty) ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub enum $name {
            $( $variant($ty), )*
        }

        impl $name {
            /// Constructor id of the active variant.
            pub fn constructor_id(&self) -> u32 {
                match self {
                    $( Self::$variant(_) => <$ty as crate::Identifiable>::CONSTRUCTOR_ID, )*
                }
            }
        }

        impl crate::Serializable for $name {
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                crate::Serializable::serialize(&self.constructor_id(), buf);
                match self {
                    $( Self::$variant(x) => crate::Serializable::serialize(x, buf), )*
                }
            }
        }

        impl crate::Deserializable for $name {
            fn deserialize(buf: crate::deserialize::Buffer) -> crate::deserialize::Result<Self> {
                let id = <u32 as crate::Deserializable>::deserialize(buf)?;
                $(
                    if id == <$ty as crate::Identifiable>::CONSTRUCTOR_ID {
                        return Ok(Self::$variant(<$ty as crate::Deserializable>::deserialize(buf)?));
                    }
                )*
                Err(crate::deserialize::Error::UnexpectedConstructor { id })
            }
        }

        $(
            impl From<$ty> for $name {
                fn from(x: $ty) -> Self { Self::$variant(x) }
            }
        )*

        impl crate::walk::TlObject for $name {
            fn as_any(&self) -> &dyn std::any::Any { self }

            fn walk_fields(&self, visit: &mut dyn FnMut(&'static str, &dyn crate::walk::TlObject)) {
                match self {
                    $( Self::$variant(x) => visit(stringify!($variant), x as &dyn crate::walk::TlObject), )*
                }
            }
        }
    };
}
