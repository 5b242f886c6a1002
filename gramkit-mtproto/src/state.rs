//! Per-connection protocol counters: clock offset, salt, session id,
//! sequence numbers and the last issued message id.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How far in the past a server `msg_id` may be, in seconds.
pub const MSG_ID_MAX_PAST: i64 = 300;
/// How far in the future a server `msg_id` may be, in seconds.
pub const MSG_ID_MAX_FUTURE: i64 = 30;

/// Violations detected while tracking inbound messages.
#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    /// The server went backwards in its content-related sequence.
    SeqNoReduced { got: i32, remote: i32 },
    /// The server's `msg_id` is outside the accepted time window.
    MsgIdOutOfRange { msg_id: i64 },
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SeqNoReduced { got, remote } => {
                write!(f, "seqno was reduced by the server ({got} < 2*{remote})")
            }
            Self::MsgIdOutOfRange { msg_id } => write!(f, "msg_id from server out of range ({msg_id})"),
        }
    }
}
impl std::error::Error for StateError {}

fn unix_now() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// Protocol state for one logical session.
///
/// Every method takes `&mut self` or `&self`; owners that share it between
/// tasks put it behind a single lock so reads and writes are linearized.
#[derive(Clone, Debug)]
pub struct MtprotoState {
    /// Seconds to add to the local clock to get server time.
    pub time_offset: i32,
    /// Server salt attached to outgoing encrypted messages. Zero until known.
    pub salt: i64,
    /// Random id for this session. Regenerated per connection.
    pub session_id: i64,
    sequence: i32,
    remote_content_related_seq: i32,
    last_msg_id: i64,
}

impl MtprotoState {
    /// Fresh state with a random session id.
    pub fn new() -> Self {
        Self::with_session_id(gramkit_crypto::random::i64())
    }

    pub fn with_session_id(session_id: i64) -> Self {
        Self {
            time_offset: 0,
            salt: 0,
            session_id,
            sequence: 0,
            remote_content_related_seq: -1,
            last_msg_id: 0,
        }
    }

    /// Allocate a message id from the offset-corrected clock.
    pub fn next_msg_id(&mut self) -> i64 {
        self.next_msg_id_at(unix_now())
    }

    /// Like [`next_msg_id`](Self::next_msg_id) with an explicit wall clock.
    ///
    /// Ids are strictly increasing: if the clock yields an id not above the
    /// last one, the last one plus 4 is used instead.
    pub fn next_msg_id_at(&mut self, now: Duration) -> i64 {
        let secs = (now.as_secs() as i64 + self.time_offset as i64) as u64;
        let nanos = now.subsec_nanos() as u64;
        let mut id = ((secs << 32) | (nanos << 2)) as i64;
        if id <= self.last_msg_id {
            id = self.last_msg_id + 4;
        }
        self.last_msg_id = id;
        id
    }

    pub fn last_msg_id(&self) -> i64 {
        self.last_msg_id
    }

    /// Sequence number for an outgoing message.
    ///
    /// Content-related messages get `2n + 1` and consume a slot; the rest get
    /// `2n` and leave the counter alone.
    pub fn next_seq_no(&mut self, content_related: bool) -> i32 {
        if content_related {
            let seq = self.sequence * 2 + 1;
            self.sequence += 1;
            seq
        } else {
            self.sequence * 2
        }
    }

    /// Record an inbound top-level `seq_no`.
    pub fn update_seq_no(&mut self, seq_no: i32) -> Result<(), StateError> {
        if seq_no / 2 < self.remote_content_related_seq {
            return Err(StateError::SeqNoReduced { got: seq_no, remote: self.remote_content_related_seq });
        }
        if seq_no % 2 == 1 {
            self.remote_content_related_seq += 1;
        }
        Ok(())
    }

    /// Check that a server `msg_id` lies within the accepted window around
    /// the offset-corrected clock.
    pub fn validate_msg_id(&self, msg_id: i64) -> Result<(), StateError> {
        self.validate_msg_id_at(msg_id, unix_now())
    }

    pub fn validate_msg_id_at(&self, msg_id: i64, now: Duration) -> Result<(), StateError> {
        let server_time = (msg_id as u64 >> 32) as i64;
        let corrected = now.as_secs() as i64 + self.time_offset as i64;
        if server_time < corrected - MSG_ID_MAX_PAST || server_time > corrected + MSG_ID_MAX_FUTURE {
            return Err(StateError::MsgIdOutOfRange { msg_id });
        }
        Ok(())
    }

    /// Set the clock offset so that local time matches `server_time` now.
    pub fn update_time_offset(&mut self, server_time: i32) {
        self.update_time_offset_at(server_time, unix_now());
    }

    pub fn update_time_offset_at(&mut self, server_time: i32, now: Duration) {
        let old = self.time_offset;
        self.time_offset = (server_time as i64 - now.as_secs() as i64) as i32;
        log::debug!("[gramkit] time offset {old} -> {}", self.time_offset);
    }

    /// Resynchronize from a server message id after `bad_msg_notification`
    /// codes 16/17. The next id starts fresh from the corrected clock.
    pub fn sync_time_from_msg_id(&mut self, server_msg_id: i64) {
        self.sync_time_from_msg_id_at(server_msg_id, unix_now());
    }

    pub fn sync_time_from_msg_id_at(&mut self, server_msg_id: i64, now: Duration) {
        self.update_time_offset_at((server_msg_id as u64 >> 32) as i32, now);
        self.last_msg_id = 0;
    }

    /// Shift `last_msg_id` by `delta` (codes 32/33 use ±16).
    pub fn correct_last_msg_id(&mut self, delta: i64) {
        self.last_msg_id += delta;
    }

    /// Start a new session: new id, counters reset. Salt and clock offset survive.
    pub fn reset_session(&mut self) {
        let fresh = Self::new();
        self.session_id = fresh.session_id;
        self.sequence = 0;
        self.remote_content_related_seq = -1;
        self.last_msg_id = 0;
    }
}

impl Default for MtprotoState {
    fn default() -> Self {
        Self::new()
    }
}
