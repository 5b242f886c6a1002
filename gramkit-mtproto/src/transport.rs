//! Sans-IO transport framing.
//!
//! A [`Transport`] turns payloads into frames and back without touching a
//! socket; the async connection in `gramkit-client` feeds it bytes.

use crc32fast::Hasher;

/// Errors produced while unpacking a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Not enough bytes buffered yet; at least `needed` in total are required.
    MissingBytes { needed: usize },
    /// The length field is impossible.
    BadLength { got: i32 },
    /// The frame's sequence number is not the one expected next.
    BadSeq { expected: i32, got: i32 },
    /// CRC32 over header and payload does not match the trailer.
    BadCrc { expected: u32, got: u32 },
    /// The server replied with a bare negative status code instead of a payload.
    BadStatus { status: i32 },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBytes { needed } => write!(f, "need {needed} bytes to complete the frame"),
            Self::BadLength { got } => write!(f, "bad frame length: {got}"),
            Self::BadSeq { expected, got } => write!(f, "bad frame seq: expected {expected}, got {got}"),
            Self::BadCrc { expected, got } => {
                write!(f, "bad frame crc: expected {expected:#010x}, got {got:#010x}")
            }
            Self::BadStatus { status } => write!(f, "transport status {status}"),
        }
    }
}
impl std::error::Error for Error {}

/// Location of an unpacked payload inside the input buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct UnpackedOffset {
    pub data_start: usize,
    pub data_end: usize,
    /// Total bytes the frame occupied; drop this many from the input.
    pub next_offset: usize,
}

/// A payload framing scheme.
pub trait Transport {
    /// Append the framed `input` to `output`.
    fn pack(&mut self, input: &[u8], output: &mut Vec<u8>);

    /// Locate the first complete frame in `input`.
    fn unpack(&mut self, input: &[u8]) -> Result<UnpackedOffset, Error>;

    /// Forget per-connection counters.
    fn reset(&mut self);
}

// ─── Full framing ─────────────────────────────────────────────────────────────

/// Largest frame accepted from the peer, header and trailer included.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// `length:int seq:int payload crc32:int`, little-endian, where `length`
/// covers the whole frame and the CRC covers everything before it.
#[derive(Clone, Debug, Default)]
pub struct Full {
    send_seq: i32,
    recv_seq: i32,
}

impl Full {
    pub fn new() -> Self {
        Self::default()
    }
}

fn le_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl Transport for Full {
    fn pack(&mut self, input: &[u8], output: &mut Vec<u8>) {
        let len = (input.len() + 12) as i32;
        let start = output.len();
        output.extend(len.to_le_bytes());
        output.extend(self.send_seq.to_le_bytes());
        output.extend_from_slice(input);

        let mut hasher = Hasher::new();
        hasher.update(&output[start..]);
        output.extend(hasher.finalize().to_le_bytes());

        self.send_seq += 1;
    }

    fn unpack(&mut self, input: &[u8]) -> Result<UnpackedOffset, Error> {
        if input.len() < 4 {
            return Err(Error::MissingBytes { needed: 4 });
        }
        let len = le_i32(&input[..4]);
        if len < 12 || len as usize > MAX_FRAME_LEN {
            return Err(Error::BadLength { got: len });
        }
        let len = len as usize;
        if input.len() < len {
            return Err(Error::MissingBytes { needed: len });
        }

        let mut hasher = Hasher::new();
        hasher.update(&input[..len - 4]);
        let computed = hasher.finalize();
        let trailer = le_u32(&input[len - 4..len]);
        if computed != trailer {
            return Err(Error::BadCrc { expected: computed, got: trailer });
        }

        let seq = le_i32(&input[4..8]);
        if seq != self.recv_seq {
            return Err(Error::BadSeq { expected: self.recv_seq, got: seq });
        }
        self.recv_seq += 1;

        if len == 16 {
            let status = le_i32(&input[8..12]);
            if status < 0 {
                return Err(Error::BadStatus { status });
            }
        }

        Ok(UnpackedOffset { data_start: 8, data_end: len - 4, next_offset: len })
    }

    fn reset(&mut self) {
        log::debug!("[gramkit] resetting full transport counters");
        self.send_seq = 0;
        self.recv_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        Full::new().pack(payload, &mut out);
        out
    }

    #[test]
    fn layout() {
        let out = frame(&[1, 2, 3, 4]);
        assert_eq!(out.len(), 16);
        assert_eq!(&out[..4], &16i32.to_le_bytes());
        assert_eq!(&out[4..8], &0i32.to_le_bytes());
        assert_eq!(&out[8..12], &[1, 2, 3, 4]);
        assert_eq!(&out[12..], &crc32fast::hash(&out[..12]).to_le_bytes());
    }

    #[test]
    fn unpack_roundtrip_with_trailing_bytes() {
        let mut sender = Full::new();
        let mut wire = Vec::new();
        sender.pack(&[7; 20], &mut wire);
        sender.pack(&[8; 8], &mut wire);

        let mut receiver = Full::new();
        let first = receiver.unpack(&wire).unwrap();
        assert_eq!(&wire[first.data_start..first.data_end], &[7; 20]);
        let rest = &wire[first.next_offset..];
        let second = receiver.unpack(rest).unwrap();
        assert_eq!(&rest[second.data_start..second.data_end], &[8; 8]);
    }

    #[test]
    fn partial_input_asks_for_more() {
        let out = frame(&[0; 32]);
        let mut t = Full::new();
        assert_eq!(t.unpack(&out[..2]), Err(Error::MissingBytes { needed: 4 }));
        assert_eq!(t.unpack(&out[..20]), Err(Error::MissingBytes { needed: 44 }));
    }

    #[test]
    fn sequence_is_checked() {
        let mut sender = Full::new();
        let mut skipped = Vec::new();
        sender.pack(&[0; 4], &mut skipped);
        let mut second = Vec::new();
        sender.pack(&[0; 4], &mut second);
        assert_eq!(Full::new().unpack(&second), Err(Error::BadSeq { expected: 0, got: 1 }));
    }

    #[test]
    fn negative_status_is_reported() {
        let out = frame(&(-404i32).to_le_bytes());
        assert_eq!(Full::new().unpack(&out), Err(Error::BadStatus { status: -404 }));
    }

    #[test]
    fn oversized_length_is_rejected_from_the_header_alone() {
        let mut t = Full::new();
        let huge = (MAX_FRAME_LEN as i32) + 1;
        assert_eq!(t.unpack(&huge.to_le_bytes()), Err(Error::BadLength { got: huge }));
        assert_eq!(t.unpack(&i32::MAX.to_le_bytes()), Err(Error::BadLength { got: i32::MAX }));

        let mut at_limit = (MAX_FRAME_LEN as i32).to_le_bytes().to_vec();
        at_limit.extend([0; 8]);
        assert_eq!(t.unpack(&at_limit), Err(Error::MissingBytes { needed: MAX_FRAME_LEN }));
    }

    #[test]
    fn flipped_payload_bit_fails_the_crc() {
        let mut out = frame(&[3; 8]);
        out[9] ^= 0x01;
        assert!(matches!(Full::new().unpack(&out), Err(Error::BadCrc { .. })));
    }

    #[test]
    fn short_length_is_rejected() {
        let mut out = frame(&[0; 4]);
        out[..4].copy_from_slice(&8i32.to_le_bytes());
        assert_eq!(Full::new().unpack(&out), Err(Error::BadLength { got: 8 }));
    }
}
