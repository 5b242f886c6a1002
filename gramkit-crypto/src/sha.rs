//! Hash helpers. Both macros hash the concatenation of their arguments
//! without allocating an intermediate buffer.

/// SHA-1 over one or more byte slices, as a `[u8; 20]`.
#[macro_export]
macro_rules! sha1 {
    ( $( $part:expr ),+ $(,)? ) => {{
        use $crate::__private::sha1::{Digest as _, Sha1};
        let mut hasher = Sha1::new();
        $( hasher.update($part); )+
        let digest: [u8; 20] = hasher.finalize().into();
        digest
    }};
}

/// SHA-256 over one or more byte slices, as a `[u8; 32]`.
#[macro_export]
macro_rules! sha256 {
    ( $( $part:expr ),+ $(,)? ) => {{
        use $crate::__private::sha2::{Digest as _, Sha256};
        let mut hasher = Sha256::new();
        $( hasher.update($part); )+
        let digest: [u8; 32] = hasher.finalize().into();
        digest
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn sha1_concatenates_parts() {
        assert_eq!(sha1!(b"ab", b"c"), sha1!(b"abc"));
        // SHA-1("abc")
        assert_eq!(sha1!(b"abc")[..4], [0xa9, 0x99, 0x3e, 0x36]);
    }

    #[test]
    fn sha256_concatenates_parts() {
        assert_eq!(sha256!(b"a", b"bc"), sha256!(b"abc"));
        // SHA-256("abc")
        assert_eq!(sha256!(b"abc")[..4], [0xba, 0x78, 0x16, 0xbf]);
    }
}
