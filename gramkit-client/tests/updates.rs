use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gramkit_client::{AccessHashGetter, EntityKind, InvocationError, Invoker, UpdateEvent, UpdateHandler, UpdateState};
use gramkit_tl_types::{
    Deserializable, Identifiable, RemoteCall, Serializable, TlObject, enums, functions, types,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

const GET_STATE: u32 = <functions::updates::GetState as Identifiable>::CONSTRUCTOR_ID;
const GET_DIFFERENCE: u32 = <functions::updates::GetDifference as Identifiable>::CONSTRUCTOR_ID;
const GET_CHANNEL_DIFFERENCE: u32 = <functions::updates::GetChannelDifference as Identifiable>::CONSTRUCTOR_ID;
const GET_FULL_CHANNEL: u32 = <functions::channels::GetFullChannel as Identifiable>::CONSTRUCTOR_ID;

const GAP_TIMEOUT: Duration = Duration::from_millis(200);

/// Answers requests from per-constructor queues and records what was asked.
#[derive(Default)]
struct Script {
    replies: Mutex<HashMap<u32, VecDeque<Vec<u8>>>>,
    requests: Mutex<Vec<Vec<u8>>>,
    latency: Duration,
}

impl Script {
    fn with_latency(latency: Duration) -> Self {
        Self { latency, ..Self::default() }
    }

    fn answer(&self, request_id: u32, reply: impl Serializable) {
        self.replies.lock().entry(request_id).or_default().push_back(reply.to_bytes());
    }

    fn calls(&self, request_id: u32) -> Vec<Vec<u8>> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r[..4] == request_id.to_le_bytes())
            .cloned()
            .collect()
    }
}

#[derive(Clone)]
struct Scripted(Arc<Script>);

impl Invoker for Scripted {
    fn invoke<R>(&self, request: &R) -> impl Future<Output = Result<R::Return, InvocationError>> + Send
    where
        R: RemoteCall + Sync,
        R::Return: TlObject + Send,
    {
        let bytes = request.to_bytes();
        let id = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.0.requests.lock().push(bytes);
        let reply = self.0.replies.lock().get_mut(&id).and_then(VecDeque::pop_front);
        let latency = self.0.latency;
        async move {
            tokio::time::sleep(latency).await;
            let reply = reply.ok_or(InvocationError::Dropped)?;
            Ok(R::Return::from_bytes(&reply)?)
        }
    }
}

struct Fixture {
    handler: Arc<UpdateHandler<Scripted>>,
    script: Arc<Script>,
    events: mpsc::UnboundedReceiver<UpdateEvent>,
}

fn fixture(state: UpdateState, script: Script) -> Fixture {
    let script = Arc::new(script);
    let (tx, events) = mpsc::unbounded_channel();
    let handler = UpdateHandler::new(Scripted(Arc::clone(&script)), Arc::new(AccessHashGetter::new()), state, tx)
        .with_gap_timeout(GAP_TIMEOUT);
    Fixture { handler: Arc::new(handler), script, events }
}

fn global(pts: i32) -> UpdateState {
    UpdateState { pts: Some(pts), ..UpdateState::default() }
}

fn message(id: i32, peer: enums::Peer) -> enums::Message {
    types::Message {
        out: false,
        mentioned: false,
        silent: false,
        post: false,
        id,
        from_id: None,
        peer_id: peer,
        date: 0,
        message: format!("message {id}"),
    }
    .into()
}

fn user_peer() -> enums::Peer {
    types::PeerUser { user_id: 1 }.into()
}

fn new_message(pts: i32, pts_count: i32) -> enums::Updates {
    let update: enums::Update =
        types::UpdateNewMessage { message: message(pts, user_peer()), pts, pts_count }.into();
    types::UpdateShort { update, date: 0 }.into()
}

fn drain(events: &mut mpsc::UnboundedReceiver<UpdateEvent>) -> Vec<UpdateEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn message_ids(events: &[UpdateEvent]) -> Vec<i32> {
    events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::Update(enums::Update::NewMessage(u)) => Some(&u.message),
            UpdateEvent::Update(enums::Update::NewChannelMessage(u)) => Some(&u.message),
            _ => None,
        })
        .map(|m| match m {
            enums::Message::Message(m) => m.id,
            enums::Message::Empty(m) => m.id,
            enums::Message::Service(m) => m.id,
        })
        .collect()
}

fn state(pts: i32, seq: i32) -> enums::updates::State {
    types::updates::State { pts, qts: 0, date: 1000, seq, unread_count: 0 }.into()
}

// ── Ordering ─────────────────────────────────────────────────────────

#[tokio::test]
async fn consecutive_batches_dispatch_in_order() {
    let Fixture { handler, script, mut events } = fixture(global(100), Script::default());
    for pts in [102, 104, 106] {
        handler.handle(new_message(pts, 2)).await;
    }
    assert_eq!(message_ids(&drain(&mut events)), vec![102, 104, 106]);
    assert_eq!(handler.state().pts, Some(106));
    assert!(script.requests.lock().is_empty());
}

#[tokio::test]
async fn out_of_order_batches_are_reordered() {
    let Fixture { handler, script, mut events } = fixture(global(100), Script::default());

    let early = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { handler.handle(new_message(106, 2)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    handler.handle(new_message(102, 2)).await;
    handler.handle(new_message(104, 2)).await;
    early.await.unwrap();

    assert_eq!(message_ids(&drain(&mut events)), vec![102, 104, 106]);
    assert_eq!(handler.state().pts, Some(106));
    assert!(script.calls(GET_DIFFERENCE).is_empty());
}

// ── Gap recovery ─────────────────────────────────────────────────────

#[tokio::test]
async fn unfilled_gap_fetches_difference_once() {
    let script = Script::with_latency(Duration::from_millis(50));
    script.answer(
        GET_DIFFERENCE,
        enums::updates::Difference::from(types::updates::Difference {
            new_messages: vec![message(101, user_peer()), message(102, user_peer()), message(103, user_peer())],
            new_encrypted_messages: vec![],
            other_updates: vec![],
            chats: vec![],
            users: vec![],
            state: state(103, 7),
        }),
    );
    let Fixture { handler, script, mut events } = fixture(global(100), script);

    // Two batches wait on the same hole; only one may trigger recovery.
    let a = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { handler.handle(new_message(102, 1)).await })
    };
    let b = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { handler.handle(new_message(103, 1)).await })
    };
    a.await.unwrap();
    b.await.unwrap();

    let calls = script.calls(GET_DIFFERENCE);
    assert_eq!(calls.len(), 1);
    let request = functions::updates::GetDifference::from_bytes(&calls[0][4..]).unwrap();
    assert_eq!(request.pts, 100);

    assert_eq!(message_ids(&drain(&mut events)), vec![101, 102, 103]);
    let after = handler.state();
    assert_eq!(after.pts, Some(103));
    assert_eq!(after.seq, Some(7));
}

#[tokio::test]
async fn too_long_accumulates_slices() {
    let script = Script::default();
    let slice = |ids: Vec<i32>, intermediate: i32| {
        enums::updates::Difference::from(types::updates::DifferenceSlice {
            new_messages: ids.into_iter().map(|id| message(id, user_peer())).collect(),
            new_encrypted_messages: vec![],
            other_updates: vec![],
            chats: vec![],
            users: vec![],
            intermediate_state: state(intermediate, 3),
        })
    };
    script.answer(GET_DIFFERENCE, slice(vec![11, 12], 12));
    script.answer(
        GET_DIFFERENCE,
        enums::updates::Difference::from(types::updates::Difference {
            new_messages: vec![message(13, user_peer())],
            new_encrypted_messages: vec![],
            other_updates: vec![types::UpdateMessageId { id: 13, random_id: 42 }.into()],
            chats: vec![],
            users: vec![],
            state: state(13, 4),
        }),
    );
    let Fixture { handler, script, mut events } = fixture(global(10), script);

    handler.handle(types::UpdatesTooLong {}.into()).await;

    let calls = script.calls(GET_DIFFERENCE);
    assert_eq!(calls.len(), 2);
    let second = functions::updates::GetDifference::from_bytes(&calls[1][4..]).unwrap();
    assert_eq!(second.pts, 12);

    let got = drain(&mut events);
    assert_eq!(message_ids(&got), vec![11, 12, 13]);
    assert_eq!(
        got.last(),
        Some(&UpdateEvent::Update(types::UpdateMessageId { id: 13, random_id: 42 }.into()))
    );
    assert_eq!(handler.state().pts, Some(13));
}

#[tokio::test]
async fn difference_too_long_jumps_ahead() {
    let script = Script::default();
    script.answer(GET_DIFFERENCE, enums::updates::Difference::from(types::updates::DifferenceTooLong { pts: 500 }));
    script.answer(
        GET_DIFFERENCE,
        enums::updates::Difference::from(types::updates::DifferenceEmpty { date: 2000, seq: 9 }),
    );
    let Fixture { handler, .. } = fixture(global(10), script);

    handler.handle(types::UpdatesTooLong {}.into()).await;

    let after = handler.state();
    assert_eq!(after.pts, Some(500));
    assert_eq!(after.seq, Some(9));
    assert_eq!(after.date, 2000);
}

// ── Channels ─────────────────────────────────────────────────────────

fn channel_state(channel_id: i64, pts: i32) -> UpdateState {
    let mut state = global(1);
    state.channel_pts.insert(channel_id, pts);
    state
}

#[tokio::test]
async fn channel_too_long_history_is_skipped() {
    let script = Script::default();
    script.answer(
        GET_CHANNEL_DIFFERENCE,
        enums::updates::ChannelDifference::from(types::updates::ChannelDifferenceTooLong {
            r#final: true,
            timeout: None,
            dialog: types::Dialog {
                pinned: false,
                unread_mark: false,
                peer: types::PeerChannel { channel_id: 77 }.into(),
                top_message: 900,
                read_inbox_max_id: 0,
                read_outbox_max_id: 0,
                unread_count: 0,
                pts: Some(300),
            }
            .into(),
            messages: vec![],
            chats: vec![],
            users: vec![],
        }),
    );
    let Fixture { handler, script, mut events } = fixture(channel_state(77, 10), script);

    let update: enums::Update = types::UpdateChannelTooLong { channel_id: 77, pts: Some(300) }.into();
    handler.handle(types::UpdateShort { update, date: 0 }.into()).await;

    assert_eq!(script.calls(GET_CHANNEL_DIFFERENCE).len(), 1);
    assert_eq!(drain(&mut events), vec![UpdateEvent::Skipped(Some(77))]);
    assert_eq!(handler.state().channel_pts.get(&77), Some(&300));
}

#[tokio::test]
async fn channel_difference_pages_until_final() {
    let channel = || -> enums::Peer { types::PeerChannel { channel_id: 5 }.into() };
    let script = Script::default();
    script.answer(
        GET_CHANNEL_DIFFERENCE,
        enums::updates::ChannelDifference::from(types::updates::ChannelDifference {
            r#final: false,
            pts: 12,
            timeout: None,
            new_messages: vec![message(1, channel()), message(2, channel())],
            other_updates: vec![],
            chats: vec![],
            users: vec![],
        }),
    );
    script.answer(
        GET_CHANNEL_DIFFERENCE,
        enums::updates::ChannelDifference::from(types::updates::ChannelDifferenceEmpty {
            r#final: true,
            pts: 12,
            timeout: None,
        }),
    );
    let Fixture { handler, script, mut events } = fixture(channel_state(5, 10), script);
    handler.handle(types::UpdateShort {
        update: types::UpdateChannelTooLong { channel_id: 5, pts: None }.into(),
        date: 0,
    }
    .into())
    .await;

    let calls = script.calls(GET_CHANNEL_DIFFERENCE);
    assert_eq!(calls.len(), 2);
    let second = functions::updates::GetChannelDifference::from_bytes(&calls[1][4..]).unwrap();
    assert_eq!(second.pts, 12);
    assert_eq!(second.limit, 100);
    assert_eq!(message_ids(&drain(&mut events)), vec![1, 2]);
    assert_eq!(handler.state().channel_pts.get(&5), Some(&12));
}

#[tokio::test]
async fn unknown_channel_position_comes_from_full_info() {
    let script = Script::default();
    script.answer(
        GET_FULL_CHANNEL,
        enums::messages::ChatFull::from(types::messages::ChatFull {
            full_chat: types::ChannelFull {
                can_view_participants: false,
                id: 9,
                about: String::new(),
                participants_count: None,
                pts: 4321,
            }
            .into(),
            chats: vec![],
            users: vec![],
        }),
    );
    let Fixture { handler, script, .. } = fixture(global(1), script);
    handler.handle(types::UpdateShort {
        update: types::UpdateChannelTooLong { channel_id: 9, pts: None }.into(),
        date: 0,
    }
    .into())
    .await;

    assert_eq!(script.calls(GET_FULL_CHANNEL).len(), 1);
    assert!(script.calls(GET_CHANNEL_DIFFERENCE).is_empty());
    assert_eq!(handler.state().channel_pts.get(&9), Some(&4321));
}

// ── Bootstrap and entities ───────────────────────────────────────────

#[tokio::test]
async fn sync_state_fetches_state_when_nothing_is_known() {
    let script = Script::default();
    script.answer(GET_STATE, state(55, 6));
    let Fixture { handler, script, .. } = fixture(UpdateState::default(), script);

    handler.sync_state().await.unwrap();

    assert_eq!(script.calls(GET_STATE).len(), 1);
    let after = handler.state();
    assert_eq!((after.pts, after.seq, after.date), (Some(55), Some(6), 1000));
}

#[tokio::test]
async fn short_message_from_unknown_user_refetches_entities() {
    let script = Script::default();
    script.answer(
        GET_DIFFERENCE,
        enums::updates::Difference::from(types::updates::DifferenceSlice {
            new_messages: vec![],
            new_encrypted_messages: vec![],
            other_updates: vec![],
            chats: vec![],
            users: vec![types::User {
                is_self: false,
                contact: false,
                bot: false,
                min: false,
                id: 8,
                access_hash: Some(888),
                first_name: Some("Eight".into()),
                last_name: None,
                username: None,
                phone: None,
            }
            .into()],
            intermediate_state: state(21, 0),
        }),
    );
    let script = Arc::new(script);
    let entities = Arc::new(AccessHashGetter::new());
    let (tx, mut events) = mpsc::unbounded_channel();
    let handler = UpdateHandler::new(Scripted(Arc::clone(&script)), Arc::clone(&entities), global(20), tx);

    let short = types::UpdateShortMessage {
        out: false,
        mentioned: false,
        media_unread: false,
        silent: false,
        id: 3,
        user_id: 8,
        message: "hello".into(),
        pts: 21,
        pts_count: 1,
        date: 0,
    };
    handler.handle(short.into()).await;

    let calls = script.calls(GET_DIFFERENCE);
    assert_eq!(calls.len(), 1);
    let request = functions::updates::GetDifference::from_bytes(&calls[0][4..]).unwrap();
    assert_eq!((request.pts, request.pts_total_limit), (20, Some(1)));
    assert_eq!(entities.get(EntityKind::User, 8), Some(888));
    assert_eq!(message_ids(&drain(&mut events)), vec![3]);
    assert_eq!(handler.state().pts, Some(21));
}
