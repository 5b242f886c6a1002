//! Update delivery: gap detection, ordering and recovery.
//!
//! Telegram numbers update events with per-scope positions (`pts`) and a
//! global batch sequence (`seq`). [`UpdateHandler`] applies incoming batches
//! against local watermarks so that callbacks see every scope's events in
//! order, waits briefly when a gap appears, and fetches the difference when
//! the gap does not close on its own.

mod access_hash;
mod handler;

use std::future::Future;

use gramkit_tl_types::{RemoteCall, TlObject, enums, types};

pub use access_hash::AccessHashGetter;
pub use handler::UpdateHandler;

use crate::errors::InvocationError;

/// Position scope: `None` for the account-wide counter, `Some(channel_id)` for a channel.
pub type Scope = Option<i64>;

/// What update callbacks receive.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateEvent {
    /// One update, in order within its scope.
    Update(enums::Update),
    /// The server refused to replay history for this channel (`None` for the
    /// account-wide scope). Events were skipped; local caches for it are stale.
    Skipped(Scope),
}

/// Something that can run RPCs on the handler's behalf.
pub trait Invoker: Send + Sync + 'static {
    fn invoke<R>(&self, request: &R) -> impl Future<Output = Result<R::Return, InvocationError>> + Send
    where
        R: RemoteCall + Sync,
        R::Return: TlObject + Send;
}

// ─── Normalization ────────────────────────────────────────────────────────────

/// Where an event sits in its scope's position stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Position {
    pub scope: Scope,
    pub pts: i32,
    pub pts_count: i32,
}

impl Position {
    pub fn applicable_pts(&self) -> i32 {
        self.pts - self.pts_count
    }
}

/// One event of a batch. `update` is `None` for position-only acknowledgements
/// (`updateShortSentMessage`).
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Entry {
    pub update: Option<enums::Update>,
    pub position: Option<Position>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SeqRange {
    pub start: i32,
    pub end: i32,
}

/// A flattened `Updates` value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Batch {
    pub entries: Vec<Entry>,
    /// `None` when the batch is not ordered by `seq`.
    pub seq: Option<SeqRange>,
    pub date: i32,
    /// Users referenced only by id (short messages); their hash may be unknown.
    pub mentioned_users: Vec<(i64, Position)>,
}

fn message_channel(message: &enums::Message) -> Option<i64> {
    let peer = match message {
        enums::Message::Empty(m) => m.peer_id.as_ref(),
        enums::Message::Message(m) => Some(&m.peer_id),
        enums::Message::Service(m) => Some(&m.peer_id),
    };
    match peer {
        Some(enums::Peer::Channel(p)) => Some(p.channel_id),
        _ => None,
    }
}

/// Position in the stream of the channel the message belongs to. A channel
/// update whose message names no channel has no scope to order it in, so it
/// gets no position rather than the account-wide one.
fn channel_position(message: &enums::Message, pts: i32, pts_count: i32) -> Option<Position> {
    match message_channel(message) {
        Some(channel_id) => Some(Position { scope: Some(channel_id), pts, pts_count }),
        None => {
            log::warn!("[gramkit] channel update at pts {pts} carries no channel peer; delivering it unordered");
            None
        }
    }
}

/// The position an update occupies, if it has one.
///
/// Exhaustive on purpose: a new variant must be classified here.
pub(crate) fn position_of(update: &enums::Update) -> Option<Position> {
    use enums::Update as U;
    let at = |scope, pts, pts_count| Some(Position { scope, pts, pts_count });
    match update {
        U::NewMessage(u) => at(None, u.pts, u.pts_count),
        U::DeleteMessages(u) => at(None, u.pts, u.pts_count),
        U::EditMessage(u) => at(None, u.pts, u.pts_count),
        U::ReadHistoryOutbox(u) => at(None, u.pts, u.pts_count),
        U::NewChannelMessage(u) => channel_position(&u.message, u.pts, u.pts_count),
        U::EditChannelMessage(u) => channel_position(&u.message, u.pts, u.pts_count),
        U::DeleteChannelMessages(u) => at(Some(u.channel_id), u.pts, u.pts_count),
        U::ReadChannelInbox(u) => at(Some(u.channel_id), u.pts, 0),
        U::MessageId(_) | U::ChannelTooLong(_) | U::Channel(_) | U::NewEncryptedMessage(_) => None,
    }
}

fn entry(update: enums::Update) -> Entry {
    Entry { position: position_of(&update), update: Some(update) }
}

fn short_message(
    out: bool,
    id: i32,
    from: Option<i64>,
    peer: enums::Peer,
    date: i32,
    text: String,
    pts: i32,
    pts_count: i32,
) -> enums::Update {
    types::UpdateNewMessage {
        message: types::Message {
            out,
            mentioned: false,
            silent: false,
            post: false,
            id,
            from_id: from.map(|user_id| types::PeerUser { user_id }.into()),
            peer_id: peer,
            date,
            message: text,
        }
        .into(),
        pts,
        pts_count,
    }
    .into()
}

/// Flatten `updates` into a [`Batch`]; `None` means `updatesTooLong`.
pub(crate) fn normalize(updates: enums::Updates) -> Option<Batch> {
    use enums::Updates as U;
    let batch = |entries, seq, date| Batch { entries, seq, date, mentioned_users: Vec::new() };

    Some(match updates {
        U::TooLong(_) => return None,
        U::UpdateShortMessage(u) => {
            let update = short_message(
                u.out,
                u.id,
                (!u.out).then_some(u.user_id),
                types::PeerUser { user_id: u.user_id }.into(),
                u.date,
                u.message,
                u.pts,
                u.pts_count,
            );
            let position = Position { scope: None, pts: u.pts, pts_count: u.pts_count };
            let mut b = batch(vec![entry(update)], None, u.date);
            b.mentioned_users.push((u.user_id, position));
            b
        }
        U::UpdateShortChatMessage(u) => {
            let update = short_message(
                u.out,
                u.id,
                Some(u.from_id),
                types::PeerChat { chat_id: u.chat_id }.into(),
                u.date,
                u.message,
                u.pts,
                u.pts_count,
            );
            let position = Position { scope: None, pts: u.pts, pts_count: u.pts_count };
            let mut b = batch(vec![entry(update)], None, u.date);
            b.mentioned_users.push((u.from_id, position));
            b
        }
        U::UpdateShort(u) => batch(vec![entry(u.update)], None, u.date),
        U::Combined(u) => batch(
            u.updates.into_iter().map(entry).collect(),
            Some(SeqRange { start: u.seq_start, end: u.seq }),
            u.date,
        ),
        U::Updates(u) => batch(
            u.updates.into_iter().map(entry).collect(),
            Some(SeqRange { start: u.seq, end: u.seq }),
            u.date,
        ),
        U::UpdateShortSentMessage(u) => batch(
            vec![Entry {
                update: None,
                position: Some(Position { scope: None, pts: u.pts, pts_count: u.pts_count }),
            }],
            None,
            u.date,
        ),
    })
}
