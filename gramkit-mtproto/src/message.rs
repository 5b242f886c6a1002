//! MTProto message framing: the inner `message` envelope and the
//! service constructors whose bodies are untyped (`Object`).

use gramkit_tl_types::deserialize::{Buffer, Error, Result};
use gramkit_tl_types::{Cursor, Deserializable, Serializable};

/// `msg_container#73f1f8dc messages:vector<message> = MessageContainer`
pub const MSG_CONTAINER_ID: u32 = 0x73f1f8dc;
/// `rpc_result#f35c6d01 req_msg_id:long result:Object = RpcResult`
pub const RPC_RESULT_ID: u32 = 0xf35c6d01;
/// `gzip_packed#3072cfa1 packed_data:bytes = Object`
pub const GZIP_PACKED_ID: u32 = 0x3072cfa1;

/// Size of `msg_id ‖ seqno ‖ bytes` in front of every body.
pub const HEADER_LEN: usize = 16;

/// One framed message: `msg_id:long seqno:int bytes:int body:bytes`.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Unique identifier for this message.
    pub msg_id: i64,
    /// Even for content-unrelated, odd for content-related messages.
    pub seq_no: i32,
    /// The serialized TL body (boxed: constructor ID + fields).
    pub body: Vec<u8>,
}

impl Message {
    pub fn new(msg_id: i64, seq_no: i32, body: Vec<u8>) -> Self {
        Self { msg_id, seq_no, body }
    }

    /// The constructor id at the start of the body, if there is one.
    pub fn constructor_id(&self) -> Option<u32> {
        Cursor::from_slice(&self.body).peek_u32().ok()
    }

    /// Odd sequence numbers mark content-related messages, which must be acknowledged.
    pub fn requires_ack(&self) -> bool {
        self.seq_no % 2 == 1
    }
}

impl Serializable for Message {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.msg_id.serialize(buf);
        self.seq_no.serialize(buf);
        (self.body.len() as i32).serialize(buf);
        buf.extend(self.body.iter().copied());
    }
}

impl Deserializable for Message {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let msg_id = i64::deserialize(buf)?;
        let seq_no = i32::deserialize(buf)?;
        let len = i32::deserialize(buf)?;
        if len < 0 || len as usize > buf.remaining() {
            return Err(Error::UnexpectedEof);
        }
        let body = buf.read_slice(len as usize)?.to_vec();
        Ok(Self { msg_id, seq_no, body })
    }
}

/// Expand a container body (constructor id included) into its messages,
/// ordered by ascending `seq_no`.
pub fn parse_container(body: &[u8]) -> Result<Vec<Message>> {
    let mut cursor = Cursor::from_slice(body);
    let id = u32::deserialize(&mut cursor)?;
    if id != MSG_CONTAINER_ID {
        return Err(Error::UnexpectedConstructor { id });
    }
    let count = i32::deserialize(&mut cursor)?.max(0) as usize;
    let mut messages = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        messages.push(Message::deserialize(&mut cursor)?);
    }
    messages.sort_by_key(|m| m.seq_no);
    Ok(messages)
}

/// Build a container body from `messages`, in the given order.
pub fn build_container(messages: &[Message]) -> Vec<u8> {
    let mut buf = Vec::new();
    MSG_CONTAINER_ID.serialize(&mut buf);
    (messages.len() as i32).serialize(&mut buf);
    for message in messages {
        message.serialize(&mut buf);
    }
    buf
}

/// A decoded `rpc_result`: the request it answers and the raw result body.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcResult {
    pub req_msg_id: i64,
    pub result: Vec<u8>,
}

impl RpcResult {
    /// Parse a body starting with [`RPC_RESULT_ID`].
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::from_slice(body);
        let id = u32::deserialize(&mut cursor)?;
        if id != RPC_RESULT_ID {
            return Err(Error::UnexpectedConstructor { id });
        }
        let req_msg_id = i64::deserialize(&mut cursor)?;
        let mut result = Vec::new();
        cursor.read_to_end(&mut result);
        Ok(Self { req_msg_id, result })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12 + self.result.len());
        RPC_RESULT_ID.serialize(&mut buf);
        self.req_msg_id.serialize(&mut buf);
        buf.extend_from_slice(&self.result);
        buf
    }
}

/// Packed data of a `gzip_packed` body, still compressed.
pub fn parse_gzip_packed(body: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::from_slice(body);
    let id = u32::deserialize(&mut cursor)?;
    if id != GZIP_PACKED_ID {
        return Err(Error::UnexpectedConstructor { id });
    }
    Vec::<u8>::deserialize(&mut cursor)
}

/// Wrap already-compressed `packed_data` in a `gzip_packed` body.
pub fn build_gzip_packed(packed_data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    GZIP_PACKED_ID.serialize(&mut buf);
    packed_data.serialize(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_layout() {
        let msg = Message::new(0x1122334455667788, 3, vec![1, 2, 3, 4]);
        let bytes = msg.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN + 4);
        assert_eq!(&bytes[12..16], &4i32.to_le_bytes());
        assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
        assert!(msg.requires_ack());
    }

    #[test]
    fn envelope_rejects_overlong_length() {
        let mut bytes = Message::new(1, 0, vec![0; 8]).to_bytes();
        bytes.truncate(20);
        assert_eq!(Message::from_bytes(&bytes), Err(Error::UnexpectedEof));
    }

    #[test]
    fn container_sorted_by_seq_no() {
        let body = build_container(&[
            Message::new(10, 5, 1i32.to_bytes()),
            Message::new(11, 1, 2i32.to_bytes()),
            Message::new(12, 3, 3i32.to_bytes()),
        ]);
        let seqs: Vec<i32> = parse_container(&body).unwrap().iter().map(|m| m.seq_no).collect();
        assert_eq!(seqs, vec![1, 3, 5]);
    }

    #[test]
    fn rpc_result_keeps_raw_tail() {
        let result = RpcResult { req_msg_id: 99, result: vec![9; 12] };
        assert_eq!(RpcResult::parse(&result.to_bytes()).unwrap(), result);
        assert!(RpcResult::parse(&build_container(&[])).is_err());
    }

    #[test]
    fn gzip_wrapper() {
        let body = build_gzip_packed(&[1, 2, 3]);
        assert_eq!(parse_gzip_packed(&body).unwrap(), vec![1, 2, 3]);
    }
}
