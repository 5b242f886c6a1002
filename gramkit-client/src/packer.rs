//! Request multiplexing over one encrypted connection.
//!
//! [`MessagePacker::send_and_recv`] frames a request, registers it under its
//! message id and waits. [`MessagePacker::pump`] decodes every inbound frame,
//! walks containers and envelopes, and completes the matching waiters.
//! Service messages (salt corrections, bad-message notifications, pongs,
//! state requests) are handled here; `Updates` go to the update handler.

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::Arc;

use gramkit_mtproto::message::{self, GZIP_PACKED_ID, MSG_CONTAINER_ID, RPC_RESULT_ID, RpcResult};
use gramkit_mtproto::{EncryptedEncoder, Message, MtprotoState};
use gramkit_tl_types::{Deserializable, Identifiable, Serializable, enums, types};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::errors::{ConnectionError, InvocationError, RpcError};

const RPC_ERROR_ID: u32 = <types::RpcError as Identifiable>::CONSTRUCTOR_ID;
const PONG_ID: u32 = <types::Pong as Identifiable>::CONSTRUCTOR_ID;
const BAD_MSG_ID: u32 = <types::BadMsgNotification as Identifiable>::CONSTRUCTOR_ID;
const BAD_SALT_ID: u32 = <types::BadServerSalt as Identifiable>::CONSTRUCTOR_ID;
const MSGS_ACK_ID: u32 = <types::MsgsAck as Identifiable>::CONSTRUCTOR_ID;
const MSGS_STATE_REQ_ID: u32 = <types::MsgsStateReq as Identifiable>::CONSTRUCTOR_ID;
const NEW_SESSION_ID: u32 = <types::NewSessionCreated as Identifiable>::CONSTRUCTOR_ID;
const FUTURE_SALTS_ID: u32 = <types::FutureSalts as Identifiable>::CONSTRUCTOR_ID;

const UPDATES_IDS: [u32; 7] = [
    <types::UpdatesTooLong as Identifiable>::CONSTRUCTOR_ID,
    <types::UpdateShortMessage as Identifiable>::CONSTRUCTOR_ID,
    <types::UpdateShortChatMessage as Identifiable>::CONSTRUCTOR_ID,
    <types::UpdateShort as Identifiable>::CONSTRUCTOR_ID,
    <types::UpdatesCombined as Identifiable>::CONSTRUCTOR_ID,
    <types::Updates as Identifiable>::CONSTRUCTOR_ID,
    <types::UpdateShortSentMessage as Identifiable>::CONSTRUCTOR_ID,
];

fn is_updates(id: u32) -> bool {
    UPDATES_IDS.contains(&id)
}

fn leading_id(body: &[u8]) -> Option<u32> {
    body.get(..4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// What a waiting request should do next.
enum UnpackAction {
    /// The raw result body.
    Return(Vec<u8>),
    /// Send the same request again under a new message id.
    Retry,
    Fail(InvocationError),
}

#[derive(Default)]
struct Outbox {
    acks: Vec<i64>,
    replies: Vec<Vec<u8>>,
}

/// Multiplexes requests over one [`Connection`].
pub struct MessagePacker {
    conn: Arc<Connection>,
    encoder: EncryptedEncoder,
    state: Mutex<MtprotoState>,
    pending: Mutex<HashMap<i64, oneshot::Sender<UnpackAction>>>,
    outbox: Mutex<Outbox>,
    // Keeps msg_id order equal to wire order.
    send_lock: tokio::sync::Mutex<()>,
    updates: mpsc::UnboundedSender<enums::Updates>,
    // Tripped once `pump` returns; nothing can be answered after that.
    closed: CancellationToken,
}

impl MessagePacker {
    pub fn new(
        conn: Arc<Connection>,
        encoder: EncryptedEncoder,
        state: MtprotoState,
        updates: mpsc::UnboundedSender<enums::Updates>,
    ) -> Self {
        Self {
            conn,
            encoder,
            state: Mutex::new(state),
            pending: Mutex::new(HashMap::new()),
            outbox: Mutex::new(Outbox::default()),
            send_lock: tokio::sync::Mutex::new(()),
            updates,
            closed: CancellationToken::new(),
        }
    }

    /// A snapshot of the protocol counters (salt, clock offset, session id).
    pub fn state(&self) -> MtprotoState {
        self.state.lock().clone()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    /// Whether the receive side has stopped. A closed packer refuses requests.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of requests still waiting for an answer.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Send a serialized request and wait for its result body.
    ///
    /// Salt corrections and retryable bad-message notifications resend the
    /// same body transparently; the caller only sees the final outcome.
    pub async fn send_and_recv(&self, body: &[u8]) -> Result<Vec<u8>, InvocationError> {
        loop {
            let (tx, rx) = oneshot::channel();
            let msg_id = self.enqueue(body, tx).await?;
            match rx.await {
                Ok(UnpackAction::Return(result)) => return Ok(result),
                Ok(UnpackAction::Retry) => {
                    log::debug!("[gramkit] resending request {msg_id}");
                }
                Ok(UnpackAction::Fail(e)) => return Err(e),
                Err(_) => return Err(InvocationError::Dropped),
            }
        }
    }

    async fn enqueue(&self, body: &[u8], tx: oneshot::Sender<UnpackAction>) -> Result<i64, InvocationError> {
        let _order = self.send_lock.lock().await;
        if self.is_closed() {
            return Err(InvocationError::Connection(ConnectionError::Closed));
        }
        let (frame, msg_id) = {
            let mut state = self.state.lock();
            self.encoder.wrap(&mut state, body, true)
        };
        self.pending.lock().insert(msg_id, tx);
        // `pump` may have drained `pending` between the check above and the insert.
        if self.is_closed() {
            self.pending.lock().remove(&msg_id);
            return Err(InvocationError::Connection(ConnectionError::Closed));
        }
        if let Err(e) = self.conn.send(&frame).await {
            self.pending.lock().remove(&msg_id);
            return Err(e.into());
        }
        Ok(msg_id)
    }

    /// Send a content-unrelated service message without waiting for anything.
    async fn send_service(&self, body: &[u8]) -> Result<(), ConnectionError> {
        let _order = self.send_lock.lock().await;
        let (frame, _) = {
            let mut state = self.state.lock();
            self.encoder.wrap(&mut state, body, false)
        };
        self.conn.send(&frame).await
    }

    /// Process inbound frames until `cancel` fires or the connection dies.
    ///
    /// A bad frame or message is logged and skipped. When the connection
    /// fails, every waiting request fails with that error.
    pub async fn pump(
        &self,
        mut frames: mpsc::Receiver<Result<Vec<u8>, ConnectionError>>,
        cancel: CancellationToken,
    ) {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = frames.recv() => frame,
            };
            match frame {
                Some(Ok(frame)) => {
                    self.process_frame(&frame);
                    self.flush_outbox().await;
                }
                Some(Err(e)) => {
                    log::warn!("[gramkit] connection lost: {e}");
                    self.closed.cancel();
                    self.fail_all(&e);
                    break;
                }
                None => break,
            }
        }
        self.closed.cancel();
        // Whatever is still waiting sees `Dropped`.
        self.pending.lock().clear();
        log::debug!("[gramkit] pump stopped");
    }

    fn fail_all(&self, error: &ConnectionError) {
        let pending: Vec<_> = self.pending.lock().drain().collect();
        for (_, tx) in pending {
            let _ = tx.send(UnpackAction::Fail(InvocationError::Connection(error.clone())));
        }
    }

    fn process_frame(&self, frame: &[u8]) {
        let decoded = {
            let state = self.state.lock();
            self.encoder.decode(&state, frame)
        };
        let message = match decoded {
            Ok(message) => message,
            Err(e) => {
                log::warn!("[gramkit] dropping undecodable frame: {e}");
                return;
            }
        };

        {
            let mut state = self.state.lock();
            if !is_time_sync(&message) {
                if let Err(e) = state.validate_msg_id(message.msg_id) {
                    log::warn!("[gramkit] dropping message: {e}");
                    return;
                }
            }
            if let Err(e) = state.update_seq_no(message.seq_no) {
                log::warn!("[gramkit] dropping message: {e}");
                return;
            }
        }

        if message.requires_ack() {
            self.outbox.lock().acks.push(message.msg_id);
        }
        self.unpack(message);
    }

    fn unpack(&self, message: Message) {
        let Some(id) = message.constructor_id() else {
            log::warn!("[gramkit] dropping empty message {}", message.msg_id);
            return;
        };
        log::debug!("[gramkit] unpacking {id:#010x} (msg_id {}, seq {})", message.msg_id, message.seq_no);

        match id {
            MSG_CONTAINER_ID => match message::parse_container(&message.body) {
                Ok(inner) => {
                    for m in inner {
                        if m.requires_ack() {
                            self.outbox.lock().acks.push(m.msg_id);
                        }
                        self.unpack(m);
                    }
                }
                Err(e) => log::warn!("[gramkit] dropping malformed container: {e}"),
            },
            GZIP_PACKED_ID => match inflate_packed(&message.body) {
                Ok(body) => self.unpack(Message { body, ..message }),
                Err(e) => log::warn!("[gramkit] dropping gzip_packed message: {e}"),
            },
            RPC_RESULT_ID => self.handle_rpc_result(&message),
            BAD_SALT_ID | BAD_MSG_ID => self.handle_bad_msg(&message),
            PONG_ID => match enums::Pong::from_bytes(&message.body) {
                Ok(enums::Pong::Pong(pong)) => self.complete(pong.msg_id, UnpackAction::Return(message.body)),
                Err(e) => log::warn!("[gramkit] dropping malformed pong: {e}"),
            },
            FUTURE_SALTS_ID => match enums::FutureSalts::from_bytes(&message.body) {
                Ok(enums::FutureSalts::FutureSalts(salts)) => {
                    self.complete(salts.req_msg_id, UnpackAction::Return(message.body))
                }
                Err(e) => log::warn!("[gramkit] dropping malformed future_salts: {e}"),
            },
            MSGS_STATE_REQ_ID => match enums::MsgsStateReq::from_bytes(&message.body) {
                Ok(enums::MsgsStateReq::MsgsStateReq(req)) => {
                    // 1 = nothing is known about the message.
                    let reply = enums::MsgsStateInfo::MsgsStateInfo(types::MsgsStateInfo {
                        req_msg_id: message.msg_id,
                        info: vec![1; req.msg_ids.len()],
                    });
                    self.outbox.lock().replies.push(reply.to_bytes());
                }
                Err(e) => log::warn!("[gramkit] dropping malformed msgs_state_req: {e}"),
            },
            NEW_SESSION_ID => match enums::NewSession::from_bytes(&message.body) {
                Ok(enums::NewSession::Created(created)) => {
                    log::info!("[gramkit] new session created, salt {}", created.server_salt);
                    self.state.lock().salt = created.server_salt;
                }
                Err(e) => log::warn!("[gramkit] dropping malformed new_session_created: {e}"),
            },
            MSGS_ACK_ID => log::debug!("[gramkit] server acknowledged messages"),
            id if is_updates(id) => self.forward_updates(&message.body),
            other => log::warn!("[gramkit] dropping message with unknown constructor {other:#010x}"),
        }
    }

    fn handle_rpc_result(&self, message: &Message) {
        let result = match RpcResult::parse(&message.body) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("[gramkit] dropping malformed rpc_result: {e}");
                return;
            }
        };

        let body = if leading_id(&result.result) == Some(GZIP_PACKED_ID) {
            match inflate_packed(&result.result) {
                Ok(body) => body,
                Err(e) => {
                    let error = InvocationError::Deserialize(format!("gzip_packed result: {e}"));
                    self.complete(result.req_msg_id, UnpackAction::Fail(error));
                    return;
                }
            }
        } else {
            result.result
        };

        let action = match leading_id(&body) {
            Some(RPC_ERROR_ID) => match enums::RpcError::from_bytes(&body) {
                Ok(e) => UnpackAction::Fail(InvocationError::Rpc(RpcError::from_tl(&e))),
                Err(e) => UnpackAction::Fail(e.into()),
            },
            Some(id) if is_updates(id) => {
                self.forward_updates(&body);
                UnpackAction::Return(body)
            }
            _ => UnpackAction::Return(body),
        };
        self.complete(result.req_msg_id, action);
    }

    fn handle_bad_msg(&self, message: &Message) {
        let notification = match enums::BadMsgNotification::from_bytes(&message.body) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("[gramkit] dropping malformed bad_msg_notification: {e}");
                return;
            }
        };

        let n = match notification {
            enums::BadMsgNotification::BadServerSalt(s) => {
                log::info!("[gramkit] server salt corrected to {}", s.new_server_salt);
                self.state.lock().salt = s.new_server_salt;
                self.complete(s.bad_msg_id, UnpackAction::Retry);
                return;
            }
            enums::BadMsgNotification::BadMsgNotification(n) => n,
        };

        let action = match n.error_code {
            16 | 17 => {
                log::info!("[gramkit] msg_id rejected (code {}), resyncing clock", n.error_code);
                self.state.lock().sync_time_from_msg_id(message.msg_id);
                UnpackAction::Retry
            }
            18 | 19 => {
                log::warn!("[gramkit] server reports invalid msg_id {} (code {})", n.bad_msg_id, n.error_code);
                UnpackAction::Retry
            }
            20 => UnpackAction::Retry,
            32 => {
                self.state.lock().correct_last_msg_id(16);
                UnpackAction::Retry
            }
            33 => {
                self.state.lock().correct_last_msg_id(-16);
                UnpackAction::Retry
            }
            48 => {
                log::debug!("[gramkit] bad salt notice for {}, correction follows", n.bad_msg_id);
                return;
            }
            code => {
                log::error!("[gramkit] message {} rejected with code {code}", n.bad_msg_id);
                UnpackAction::Fail(InvocationError::BadMessage { code })
            }
        };
        self.complete(n.bad_msg_id, action);
    }

    fn forward_updates(&self, body: &[u8]) {
        match enums::Updates::from_bytes(body) {
            Ok(updates) => {
                if self.updates.send(updates).is_err() {
                    log::debug!("[gramkit] no update handler, dropping updates");
                }
            }
            Err(e) => log::warn!("[gramkit] dropping malformed updates: {e}"),
        }
    }

    fn complete(&self, msg_id: i64, action: UnpackAction) {
        let waiter = self.pending.lock().remove(&msg_id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(action);
            }
            None => log::debug!("[gramkit] no pending request for msg_id {msg_id}"),
        }
    }

    async fn flush_outbox(&self) {
        let Outbox { acks, mut replies } = std::mem::take(&mut *self.outbox.lock());
        if !acks.is_empty() {
            replies.push(enums::MsgsAck::MsgsAck(types::MsgsAck { msg_ids: acks }).to_bytes());
        }
        for body in replies {
            if let Err(e) = self.send_service(&body).await {
                log::warn!("[gramkit] failed to send service message: {e}");
            }
        }
    }
}

/// A `bad_msg_notification` asking for a clock resync, possibly inside a container.
/// Such messages are exempt from msg_id validation.
fn is_time_sync(message: &Message) -> bool {
    match message.constructor_id() {
        Some(BAD_MSG_ID) => matches!(
            enums::BadMsgNotification::from_bytes(&message.body),
            Ok(enums::BadMsgNotification::BadMsgNotification(n)) if n.error_code == 16 || n.error_code == 17
        ),
        Some(MSG_CONTAINER_ID) => message::parse_container(&message.body)
            .map(|inner| inner.iter().any(is_time_sync))
            .unwrap_or(false),
        _ => false,
    }
}

fn inflate_packed(body: &[u8]) -> io::Result<Vec<u8>> {
    let packed = message::parse_gzip_packed(body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut out = Vec::new();
    if flate2::read::GzDecoder::new(packed.as_slice()).read_to_end(&mut out).is_ok() && !out.is_empty() {
        return Ok(out);
    }
    out.clear();
    flate2::read::ZlibDecoder::new(packed.as_slice()).read_to_end(&mut out)?;
    Ok(out)
}
