//! Ordered update delivery with gap recovery.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use gramkit_tl_types::{enums, functions, types};
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::{AccessHashGetter, Invoker, Position, Scope, SeqRange, UpdateEvent, normalize};
use crate::errors::InvocationError;
use crate::session::{EntityKind, UpdateState};

const DEFAULT_GAP_TIMEOUT: Duration = Duration::from_millis(500);
const DEFAULT_CHANNEL_DIFFERENCE_LIMIT: i32 = 100;

/// What a parked batch is waiting for: the watermark of a scope to reach a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum WaitKey {
    Pts(Scope, i32),
    Seq(i32),
}

/// Why a batch stopped before all of it was applied.
#[derive(Debug)]
enum Abandon {
    Gap,
    Cancelled,
}

#[derive(Default)]
struct Inner {
    state: UpdateState,
    waiters: HashMap<WaitKey, Vec<oneshot::Sender<()>>>,
    recovering: HashSet<Scope>,
}

impl Inner {
    fn wake(&mut self, filled: impl Fn(&WaitKey) -> bool) {
        let ready: Vec<WaitKey> = self.waiters.keys().filter(|k| filled(k)).copied().collect();
        for key in ready {
            for tx in self.waiters.remove(&key).into_iter().flatten() {
                let _ = tx.send(());
            }
        }
    }

    fn advance_pts(&mut self, scope: Scope, pts: i32) {
        self.state.set_pts(scope, pts);
        self.wake(|k| matches!(*k, WaitKey::Pts(s, at) if s == scope && at <= pts));
    }

    fn advance_seq(&mut self, seq: i32, date: i32) {
        self.state.seq = Some(seq);
        if date > 0 {
            self.state.date = date;
        }
        self.wake(|k| matches!(*k, WaitKey::Seq(at) if at <= seq));
    }

    fn adopt(&mut self, state: &types::updates::State) {
        self.state.qts = state.qts;
        self.advance_pts(None, state.pts);
        self.advance_seq(state.seq, state.date);
    }

    fn park(&mut self, key: WaitKey) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.waiters.entry(key).or_default().push(tx);
        rx
    }

    fn prune_waiters(&mut self) {
        self.waiters.retain(|_, senders| {
            senders.retain(|tx| !tx.is_closed());
            !senders.is_empty()
        });
    }
}

fn describe(scope: Scope) -> String {
    match scope {
        None => "account".to_string(),
        Some(id) => format!("channel {id}"),
    }
}

/// Applies update batches against the local watermarks and emits
/// [`UpdateEvent`]s in position order.
///
/// Each batch runs on its own task so that a batch parked on a gap does not
/// hold up the ones that may fill it. A gap that stays open for the gap
/// timeout triggers one difference fetch for its scope.
pub struct UpdateHandler<I: Invoker> {
    invoker: I,
    entities: Arc<AccessHashGetter>,
    inner: Mutex<Inner>,
    out: mpsc::UnboundedSender<UpdateEvent>,
    gap_timeout: Duration,
    channel_difference_limit: i32,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl<I: Invoker> UpdateHandler<I> {
    pub fn new(
        invoker: I,
        entities: Arc<AccessHashGetter>,
        state: UpdateState,
        out: mpsc::UnboundedSender<UpdateEvent>,
    ) -> Self {
        Self {
            invoker,
            entities,
            inner: Mutex::new(Inner { state, ..Inner::default() }),
            out,
            gap_timeout: DEFAULT_GAP_TIMEOUT,
            channel_difference_limit: DEFAULT_CHANNEL_DIFFERENCE_LIMIT,
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// How long a batch waits for a gap to close before recovery starts.
    pub fn with_gap_timeout(mut self, gap_timeout: Duration) -> Self {
        self.gap_timeout = gap_timeout;
        self
    }

    /// `limit` sent with `updates.getChannelDifference`.
    pub fn with_channel_difference_limit(mut self, limit: i32) -> Self {
        self.channel_difference_limit = limit;
        self
    }

    /// Snapshot of the watermarks, for persistence.
    pub fn state(&self) -> UpdateState {
        self.inner.lock().state.clone()
    }

    /// Stop [`run`](Self::run) and make parked batches give up.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Consume batches from `inbox` until it closes or [`shutdown`](Self::shutdown)
    /// is called, then wait for in-flight batches.
    pub async fn run(self: Arc<Self>, mut inbox: mpsc::UnboundedReceiver<enums::Updates>) {
        loop {
            let updates = tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = inbox.recv() => match next {
                    Some(updates) => updates,
                    None => break,
                },
            };
            let handler = Arc::clone(&self);
            self.tasks.spawn(async move { handler.handle(updates).await });
        }
        self.tasks.close();
        self.tasks.wait().await;
        debug!("[gramkit] update handler stopped");
    }

    /// Apply one batch. Returns once every event of it was dispatched, dropped
    /// as a duplicate, or handed over to recovery.
    pub async fn handle(&self, updates: enums::Updates) {
        self.entities.harvest(&updates);
        let Some(batch) = normalize(updates) else {
            debug!("[gramkit] updatesTooLong: fetching difference");
            self.recover(None).await;
            return;
        };
        self.refetch_unknown_users(&batch.mentioned_users).await;

        let mut unordered = Vec::new();
        let mut channels_too_long = Vec::new();
        for entry in batch.entries {
            let Some(position) = entry.position else {
                match entry.update {
                    Some(enums::Update::ChannelTooLong(u)) => channels_too_long.push(u.channel_id),
                    Some(update) => unordered.push(update),
                    None => {}
                }
                continue;
            };
            match self.apply_position(position, entry.update).await {
                Ok(()) => {}
                Err(Abandon::Gap) => {
                    self.recover(position.scope).await;
                    return;
                }
                Err(Abandon::Cancelled) => return,
            }
        }

        match self.apply_seq(batch.seq, batch.date, unordered).await {
            Ok(()) => {}
            Err(Abandon::Gap) => {
                self.recover(None).await;
                return;
            }
            Err(Abandon::Cancelled) => return,
        }

        for channel_id in channels_too_long {
            self.recover(Some(channel_id)).await;
        }
    }

    /// Establish the watermarks after sign-in: `updates.getState` when none
    /// are known, otherwise catch up through `updates.getDifference`.
    pub async fn sync_state(&self) -> Result<(), InvocationError> {
        let known = self.inner.lock().state.pts.is_some();
        if known {
            let channels = self.recover_global().await?;
            for channel_id in channels {
                self.recover(Some(channel_id)).await;
            }
            return Ok(());
        }
        let enums::updates::State::State(state) =
            self.invoker.invoke(&functions::updates::GetState {}).await?;
        info!("[gramkit] update state: pts={} seq={}", state.pts, state.seq);
        self.inner.lock().adopt(&state);
        Ok(())
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    fn emit(&self, event: UpdateEvent) {
        if self.out.send(event).is_err() {
            debug!("[gramkit] update receiver gone; event discarded");
        }
    }

    async fn apply_position(&self, position: Position, update: Option<enums::Update>) -> Result<(), Abandon> {
        let applicable = position.applicable_pts();
        loop {
            let filled = {
                let mut inner = self.inner.lock();
                let Some(local) = inner.state.pts(position.scope) else {
                    // Watermark unknown until recovery or sync sets it.
                    if let Some(update) = update {
                        self.emit(UpdateEvent::Update(update));
                    }
                    return Ok(());
                };
                if applicable == 0 || (position.pts_count == 0 && position.pts >= local - 1) {
                    if let Some(update) = update {
                        self.emit(UpdateEvent::Update(update));
                    }
                    return Ok(());
                }
                if applicable == local {
                    if let Some(update) = update {
                        self.emit(UpdateEvent::Update(update));
                    }
                    inner.advance_pts(position.scope, position.pts);
                    return Ok(());
                }
                if applicable < local {
                    debug!(
                        "[gramkit] duplicate update for {} (pts {} <= {local})",
                        describe(position.scope),
                        position.pts
                    );
                    return Ok(());
                }
                debug!(
                    "[gramkit] gap in {}: have {local}, need {applicable}",
                    describe(position.scope)
                );
                inner.park(WaitKey::Pts(position.scope, applicable))
            };
            self.wait(filled).await?;
        }
    }

    async fn apply_seq(&self, seq: Option<SeqRange>, date: i32, updates: Vec<enums::Update>) -> Result<(), Abandon> {
        let range = match seq {
            Some(range) if range.end != 0 => range,
            _ => {
                let _order = self.inner.lock();
                for update in updates {
                    self.emit(UpdateEvent::Update(update));
                }
                return Ok(());
            }
        };
        let applicable = range.start - 1;
        loop {
            let filled = {
                let mut inner = self.inner.lock();
                let Some(local) = inner.state.seq else {
                    for update in updates {
                        self.emit(UpdateEvent::Update(update));
                    }
                    return Ok(());
                };
                if applicable == local {
                    for update in updates {
                        self.emit(UpdateEvent::Update(update));
                    }
                    inner.advance_seq(range.end, date);
                    return Ok(());
                }
                if applicable < local {
                    debug!("[gramkit] duplicate batch (seq {} <= {local})", range.end);
                    return Ok(());
                }
                debug!("[gramkit] seq gap: have {local}, need {applicable}");
                inner.park(WaitKey::Seq(applicable))
            };
            self.wait(filled).await?;
        }
    }

    async fn wait(&self, filled: oneshot::Receiver<()>) -> Result<(), Abandon> {
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => None,
            res = tokio::time::timeout(self.gap_timeout, filled) => Some(matches!(res, Ok(Ok(())))),
        };
        match outcome {
            None => Err(Abandon::Cancelled),
            Some(true) => Ok(()),
            Some(false) => {
                self.inner.lock().prune_waiters();
                Err(Abandon::Gap)
            }
        }
    }

    /// Emit the content of a difference as one block, so live batches cannot
    /// interleave with it. Returns channels reported as too long.
    fn emit_difference(&self, channel: Scope, messages: Vec<enums::Message>, others: Vec<enums::Update>) -> Vec<i64> {
        let _order = self.inner.lock();
        for message in messages {
            let update: enums::Update = match channel {
                None => types::UpdateNewMessage { message, pts: 0, pts_count: 0 }.into(),
                Some(_) => types::UpdateNewChannelMessage { message, pts: 0, pts_count: 0 }.into(),
            };
            self.emit(UpdateEvent::Update(update));
        }
        let mut too_long = Vec::new();
        for update in others {
            match update {
                enums::Update::ChannelTooLong(u) => {
                    if channel != Some(u.channel_id) {
                        too_long.push(u.channel_id);
                    }
                }
                update => self.emit(UpdateEvent::Update(update)),
            }
        }
        too_long
    }

    // ── Recovery ─────────────────────────────────────────────────────────

    /// Fetch what was missed in `scope`. Concurrent calls for a scope that is
    /// already recovering return immediately.
    async fn recover(&self, scope: Scope) {
        let claimed = self.inner.lock().recovering.insert(scope);
        if !claimed {
            debug!("[gramkit] {} already recovering", describe(scope));
            return;
        }
        let result = match scope {
            None => self.recover_global().await,
            Some(channel_id) => self.recover_channel(channel_id).await.map(|()| Vec::new()),
        };
        self.inner.lock().recovering.remove(&scope);

        match result {
            Ok(channels) => {
                for channel_id in channels {
                    let claimed = self.inner.lock().recovering.insert(Some(channel_id));
                    if !claimed {
                        continue;
                    }
                    let result = self.recover_channel(channel_id).await;
                    self.inner.lock().recovering.remove(&Some(channel_id));
                    if let Err(e) = result {
                        warn!("[gramkit] could not recover channel {channel_id}: {e}");
                    }
                }
            }
            Err(e) => warn!("[gramkit] could not recover {}: {e}", describe(scope)),
        }
    }

    async fn recover_global(&self) -> Result<Vec<i64>, InvocationError> {
        let mut messages = Vec::new();
        let mut others = Vec::new();
        loop {
            let (pts, date, qts) = {
                let inner = self.inner.lock();
                (inner.state.pts, inner.state.date, inner.state.qts)
            };
            let Some(pts) = pts else {
                let enums::updates::State::State(state) =
                    self.invoker.invoke(&functions::updates::GetState {}).await?;
                self.inner.lock().adopt(&state);
                break;
            };

            let request = functions::updates::GetDifference {
                pts,
                pts_limit: None,
                pts_total_limit: None,
                date,
                qts,
                qts_limit: None,
            };
            let difference = self.invoker.invoke(&request).await?;
            self.entities.harvest(&difference);

            match difference {
                enums::updates::Difference::Empty(d) => {
                    self.inner.lock().advance_seq(d.seq, d.date);
                    break;
                }
                enums::updates::Difference::Difference(d) => {
                    messages.extend(d.new_messages);
                    others.extend(d.other_updates);
                    let enums::updates::State::State(state) = d.state;
                    self.inner.lock().adopt(&state);
                    break;
                }
                enums::updates::Difference::Slice(d) => {
                    messages.extend(d.new_messages);
                    others.extend(d.other_updates);
                    let enums::updates::State::State(state) = d.intermediate_state;
                    debug!("[gramkit] difference slice up to pts {}", state.pts);
                    self.inner.lock().adopt(&state);
                }
                enums::updates::Difference::TooLong(d) => {
                    info!("[gramkit] difference too long; jumping to pts {}", d.pts);
                    self.inner.lock().advance_pts(None, d.pts);
                }
            }
        }
        Ok(self.emit_difference(None, messages, others))
    }

    async fn recover_channel(&self, channel_id: i64) -> Result<(), InvocationError> {
        let channel = self.entities.input_channel(channel_id);
        loop {
            let local = self.inner.lock().state.pts(Some(channel_id));
            let Some(pts) = local else {
                let request = functions::channels::GetFullChannel { channel: channel.clone() };
                let full = self.invoker.invoke(&request).await?;
                self.entities.harvest(&full);
                let enums::messages::ChatFull::ChatFull(full) = full;
                match full.full_chat {
                    enums::ChatFull::ChannelFull(c) => {
                        debug!("[gramkit] channel {channel_id} starts at pts {}", c.pts);
                        self.inner.lock().advance_pts(Some(channel_id), c.pts);
                    }
                    enums::ChatFull::ChatFull(_) => {
                        warn!("[gramkit] {channel_id} is not a channel; no position to track");
                    }
                }
                return Ok(());
            };

            let request = functions::updates::GetChannelDifference {
                force: false,
                channel: channel.clone(),
                filter: types::ChannelMessagesFilterEmpty {}.into(),
                pts,
                limit: self.channel_difference_limit,
            };
            let difference = self.invoker.invoke(&request).await?;
            self.entities.harvest(&difference);

            match difference {
                enums::updates::ChannelDifference::Empty(d) => {
                    self.inner.lock().advance_pts(Some(channel_id), d.pts);
                    if d.r#final {
                        return Ok(());
                    }
                }
                enums::updates::ChannelDifference::TooLong(d) => {
                    info!("[gramkit] channel {channel_id} difference too long; history skipped");
                    let enums::Dialog::Dialog(dialog) = d.dialog;
                    let mut inner = self.inner.lock();
                    self.emit(UpdateEvent::Skipped(Some(channel_id)));
                    if let Some(pts) = dialog.pts {
                        inner.advance_pts(Some(channel_id), pts);
                    }
                    return Ok(());
                }
                enums::updates::ChannelDifference::Difference(d) => {
                    self.emit_difference(Some(channel_id), d.new_messages, d.other_updates);
                    self.inner.lock().advance_pts(Some(channel_id), d.pts);
                    if d.r#final {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Short messages name their sender by id only. When that user's hash is
    /// unknown, a one-update difference returns the full user object.
    async fn refetch_unknown_users(&self, mentioned: &[(i64, Position)]) {
        for &(user_id, position) in mentioned {
            if self.entities.contains(EntityKind::User, user_id) {
                continue;
            }
            let (date, qts) = {
                let inner = self.inner.lock();
                (inner.state.date, inner.state.qts)
            };
            let request = functions::updates::GetDifference {
                pts: position.applicable_pts(),
                pts_limit: None,
                pts_total_limit: Some(1),
                date,
                qts,
                qts_limit: None,
            };
            match self.invoker.invoke(&request).await {
                Ok(difference) => {
                    self.entities.harvest(&difference);
                }
                Err(e) => debug!("[gramkit] could not fetch user {user_id}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    use gramkit_tl_types::{RemoteCall, TlObject};

    /// Fails every request; for tests that must not reach the network.
    struct Offline;

    impl Invoker for Offline {
        fn invoke<R>(&self, _: &R) -> impl Future<Output = Result<R::Return, InvocationError>> + Send
        where
            R: RemoteCall + Sync,
            R::Return: TlObject + Send,
        {
            async { Err(InvocationError::Dropped) }
        }
    }

    fn new_message(pts: i32, pts_count: i32) -> enums::Updates {
        let update: enums::Update = types::UpdateNewMessage {
            message: types::MessageEmpty { id: pts, peer_id: None }.into(),
            pts,
            pts_count,
        }
        .into();
        types::UpdateShort { update, date: 0 }.into()
    }

    fn handler(pts: Option<i32>) -> (Arc<UpdateHandler<Offline>>, mpsc::UnboundedReceiver<UpdateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = UpdateState { pts, ..UpdateState::default() };
        let handler = UpdateHandler::new(Offline, Arc::new(AccessHashGetter::new()), state, tx)
            .with_gap_timeout(Duration::from_millis(200));
        (Arc::new(handler), rx)
    }

    fn pts_of(event: UpdateEvent) -> i32 {
        match event {
            UpdateEvent::Update(enums::Update::NewMessage(u)) => u.pts,
            other => panic!("unexpected event {other:?}"),
        }
    }

    // ── Ordering ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn in_order_events_advance_the_watermark() {
        let (handler, mut rx) = handler(Some(10));
        handler.handle(new_message(11, 1)).await;
        handler.handle(new_message(13, 2)).await;
        assert_eq!(pts_of(rx.try_recv().unwrap()), 11);
        assert_eq!(pts_of(rx.try_recv().unwrap()), 13);
        assert_eq!(handler.state().pts, Some(13));
    }

    #[tokio::test]
    async fn duplicates_are_dropped() {
        let (handler, mut rx) = handler(Some(10));
        handler.handle(new_message(10, 1)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(handler.state().pts, Some(10));
    }

    #[tokio::test]
    async fn unknown_watermark_dispatches_without_setting_it() {
        let (handler, mut rx) = handler(None);
        handler.handle(new_message(50, 1)).await;
        assert_eq!(pts_of(rx.try_recv().unwrap()), 50);
        assert_eq!(handler.state().pts, None);
    }

    #[tokio::test]
    async fn gap_filled_in_time_is_delivered_in_order() {
        let (handler, mut rx) = handler(Some(10));
        let late = {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { handler.handle(new_message(12, 1)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        handler.handle(new_message(11, 1)).await;
        late.await.unwrap();

        assert_eq!(pts_of(rx.try_recv().unwrap()), 11);
        assert_eq!(pts_of(rx.try_recv().unwrap()), 12);
        assert_eq!(handler.state().pts, Some(12));
    }

    #[tokio::test]
    async fn peerless_channel_update_leaves_account_pts_alone() {
        let (handler, mut rx) = handler(Some(10));
        let update: enums::Update = types::UpdateNewChannelMessage {
            message: types::MessageEmpty { id: 1, peer_id: None }.into(),
            pts: 11,
            pts_count: 1,
        }
        .into();
        handler.handle(types::UpdateShort { update: update.clone(), date: 0 }.into()).await;

        assert_eq!(rx.try_recv().unwrap(), UpdateEvent::Update(update));
        assert_eq!(handler.state().pts, Some(10));
        assert!(handler.state().channel_pts.is_empty());

        // A later account-wide event still applies against the untouched watermark.
        handler.handle(new_message(11, 1)).await;
        assert_eq!(pts_of(rx.try_recv().unwrap()), 11);
    }

    #[tokio::test]
    async fn unordered_updates_pass_through() {
        let (handler, mut rx) = handler(Some(10));
        let update: enums::Update = types::UpdateMessageId { id: 1, random_id: 2 }.into();
        handler.handle(types::UpdateShort { update: update.clone(), date: 0 }.into()).await;
        assert_eq!(rx.try_recv().unwrap(), UpdateEvent::Update(update));
    }

    #[tokio::test]
    async fn seq_gap_times_out_without_regressing() {
        let (handler, mut rx) = handler(Some(10));
        handler.inner.lock().state.seq = Some(5);
        let batch = types::Updates {
            updates: vec![types::UpdateMessageId { id: 1, random_id: 2 }.into()],
            users: vec![],
            chats: vec![],
            date: 0,
            seq: 8,
        };
        handler.handle(batch.into()).await;
        assert!(rx.try_recv().is_err());
        let state = handler.state();
        assert_eq!(state.seq, Some(5));
        assert_eq!(state.pts, Some(10));
    }
}
