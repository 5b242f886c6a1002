//! # gramkit-client
//!
//! Async Telegram client built on MTProto.
//!
//! ## Features
//! - Auth key exchange on first connect, persisted sessions afterwards
//! - Concurrent requests multiplexed over one connection
//! - Transparent salt correction, clock resync and `FLOOD_WAIT` retry
//! - DC migration on `*_MIGRATE_X` redirects
//! - Ordered update delivery with gap detection and difference recovery
//! - Access-hash harvesting from every response and update
//! - Phone sign-in with an optional sign-up consent step
//!
//! ```rust,no_run
//! use gramkit_client::{Client, Config, LoginCallbacks};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect(Config { api_id: 12345, api_hash: "hash".into(), ..Config::default() }).await?;
//! client.on_update(|event| {
//!     println!("{event:?}");
//!     Ok(())
//! });
//! let me = client.start(&LoginCallbacks::stdin()).await?;
//! println!("signed in as {:?}", me.first_name);
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

mod connection;
mod errors;
mod handshake;
mod login;
mod packer;
mod retry;
pub mod session;
pub mod session_backend;
pub mod updates;

pub use connection::Connection;
pub use errors::{ConnectionError, InvocationError, RpcError, RpcErrorKind, SignInError};
pub use login::{LoginCallbacks, LoginToken};
pub use packer::MessagePacker;
pub use retry::{AutoSleep, NoRetries, RetryContext, RetryPolicy};
pub use session::{CachedEntity, EntityKind, Session, UpdateState};
pub use session_backend::{InMemoryBackend, JsonFileBackend, SessionBackend};
pub use updates::{AccessHashGetter, Invoker, UpdateEvent, UpdateHandler};

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use gramkit_crypto::{AuthKey, RsaKeyStore};
use gramkit_mtproto::{EncryptedEncoder, MtprotoState};
use gramkit_tl_types::{self as tl, Deserializable, LAYER, RemoteCall, Serializable, TlObject};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

// ─── Config ───────────────────────────────────────────────────────────────────

/// Configuration for [`Client::connect`].
#[derive(Clone)]
pub struct Config {
    pub api_id:           i32,
    pub api_hash:         String,
    pub device_model:     String,
    pub system_version:   String,
    pub app_version:      String,
    pub system_lang_code: String,
    pub lang_pack:        String,
    pub lang_code:        String,
    /// Session persistence backend (default: JSON file `"gramkit.session"`).
    pub session_backend:  Arc<dyn SessionBackend>,
    /// Server keys trusted during the key exchange.
    pub rsa_keys:         RsaKeyStore,
    /// Reaction to failed requests; [`AutoSleep`] holds the flood-wait ceiling.
    pub retry_policy:     Arc<dyn RetryPolicy>,
    /// How long an update batch waits for a gap to close.
    pub gap_timeout:      Duration,
    /// Page size for `updates.getChannelDifference`.
    pub channel_difference_limit: i32,
    /// Data center used when no session exists yet.
    pub dc_id:            i32,
    pub dc_addr:          String,
    /// Per-step timeout of the key exchange.
    pub handshake_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_id:           0,
            api_hash:         String::new(),
            device_model:     "gramkit".into(),
            system_version:   std::env::consts::OS.into(),
            app_version:      env!("CARGO_PKG_VERSION").into(),
            system_lang_code: "en".into(),
            lang_pack:        String::new(),
            lang_code:        "en".into(),
            session_backend:  Arc::new(JsonFileBackend::new("gramkit.session")),
            rsa_keys:         RsaKeyStore::builtin(),
            retry_policy:     Arc::new(AutoSleep::default()),
            gap_timeout:      Duration::from_millis(500),
            channel_difference_limit: 100,
            dc_id:            2,
            dc_addr:          "149.154.167.51:443".into(),
            handshake_timeout: Duration::from_secs(15),
        }
    }
}

// ─── ClientState ──────────────────────────────────────────────────────────────

/// Lifecycle of a [`Client`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    KeyExchange,
    /// An auth key is in place; the account may not be signed in yet.
    Authenticated,
    /// Signed in and receiving updates.
    Ready,
}

// ─── Client ───────────────────────────────────────────────────────────────────

type UpdateCallback =
    Arc<dyn Fn(&UpdateEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

/// The live half of a connection: packer plus its receive tasks.
struct Sender {
    packer: Arc<MessagePacker>,
    cancel: CancellationToken,
    tasks:  TaskTracker,
}

struct ClientInner {
    config:     Config,
    session:    Mutex<Session>,
    entities:   Arc<AccessHashGetter>,
    sender:     Mutex<Option<Sender>>,
    dc_options: Mutex<HashMap<i32, String>>,
    updates:    Arc<UpdateHandler<ClientRef>>,
    updates_tx: mpsc::UnboundedSender<tl::enums::Updates>,
    callbacks:  Arc<RwLock<Vec<UpdateCallback>>>,
    state:      Mutex<ClientState>,
    // Restores `Ready` after a reconnect.
    signed_in:  AtomicBool,
    // One reconnect at a time.
    reconnect:  tokio::sync::Mutex<()>,
    cancel:     CancellationToken,
    tasks:      TaskTracker,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.updates.shutdown();
        self.cancel.cancel();
    }
}

/// The main client handle. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// Non-owning handle the update handler invokes through, so the handler
/// held by the client does not keep the client alive.
struct ClientRef(Weak<ClientInner>);

impl Invoker for ClientRef {
    fn invoke<R>(&self, request: &R) -> impl Future<Output = Result<R::Return, InvocationError>> + Send
    where
        R: RemoteCall + Sync,
        R::Return: TlObject + Send,
    {
        let client = self.0.upgrade().map(|inner| Client { inner });
        async move {
            match client {
                Some(client) => client.invoke(request).await,
                None => Err(InvocationError::Dropped),
            }
        }
    }
}

impl Client {
    /// Connect over TCP to the session's data center (or `config.dc_addr`
    /// when there is no session), exchanging a key first if needed.
    pub async fn connect(config: Config) -> Result<Self, InvocationError> {
        let client = Self::build(config)?;
        client.open_sender(None).await?;
        client.init_connection().await?;
        Ok(client)
    }

    /// Like [`connect`](Self::connect), but over an already open stream.
    /// Migrations and reconnects after a lost connection go over TCP.
    pub async fn connect_with_stream<S>(config: Config, stream: S) -> Result<Self, InvocationError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let client = Self::build(config)?;
        client.open_sender(Some(Connection::from_stream(stream))).await?;
        client.init_connection().await?;
        Ok(client)
    }

    fn build(config: Config) -> Result<Self, InvocationError> {
        let session = match config.session_backend.load()? {
            Some(session) => {
                info!(
                    "[gramkit] loaded session from {} (DC{})",
                    config.session_backend.name(),
                    session.dc_id
                );
                session
            }
            None => Session::new(config.dc_id, &config.dc_addr),
        };

        let entities = Arc::new(AccessHashGetter::from_records(&session.entities));
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let update_state = session.update_state.clone();

        let inner = Arc::new_cyclic(|weak| {
            let updates = UpdateHandler::new(
                ClientRef(weak.clone()),
                Arc::clone(&entities),
                update_state,
                events_tx,
            )
            .with_gap_timeout(config.gap_timeout)
            .with_channel_difference_limit(config.channel_difference_limit);

            ClientInner {
                config,
                session: Mutex::new(session),
                entities,
                sender: Mutex::new(None),
                dc_options: Mutex::new(session::default_dc_addresses()),
                updates: Arc::new(updates),
                updates_tx,
                callbacks: Arc::new(RwLock::new(Vec::new())),
                state: Mutex::new(ClientState::Disconnected),
                signed_in: AtomicBool::new(false),
                reconnect: tokio::sync::Mutex::new(()),
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
            }
        });

        let client = Self { inner };
        client.spawn_update_tasks(updates_rx, events_rx);
        Ok(client)
    }

    pub fn state(&self) -> ClientState {
        *self.inner.state.lock()
    }

    fn set_state(&self, state: ClientState) {
        let mut current = self.inner.state.lock();
        if *current != state {
            debug!("[gramkit] state {:?} -> {state:?}", *current);
            *current = state;
        }
    }

    /// Entity access hashes seen so far.
    pub fn entities(&self) -> &AccessHashGetter {
        &self.inner.entities
    }

    // ── Connection lifecycle ─────────────────────────────────────────────

    async fn open_sender(&self, stream: Option<Connection>) -> Result<(), InvocationError> {
        let (addr, auth_key, salt, time_offset) = {
            let s = self.inner.session.lock();
            (s.addr(), s.auth_key, s.salt, s.time_offset)
        };

        self.set_state(ClientState::Connecting);
        let conn = match stream {
            Some(conn) => conn,
            None => Connection::connect(&addr).await?,
        };

        let mut state = MtprotoState::new();
        state.time_offset = time_offset;
        let auth_key = match auth_key {
            Some(bytes) => {
                state.salt = salt;
                AuthKey::from_bytes(bytes)
            }
            None => {
                self.set_state(ClientState::KeyExchange);
                let finished = handshake::generate_auth_key(
                    &conn,
                    &mut state,
                    &self.inner.config.rsa_keys,
                    self.inner.config.handshake_timeout,
                )
                .await;
                let finished = match finished {
                    Ok(finished) => finished,
                    Err(e) => {
                        self.set_state(ClientState::Disconnected);
                        return Err(e.into());
                    }
                };
                info!("[gramkit] auth key exchange complete");
                let mut s = self.inner.session.lock();
                s.auth_key = Some(finished.auth_key.to_bytes());
                s.salt = finished.first_salt;
                s.time_offset = finished.time_offset;
                finished.auth_key
            }
        };

        self.install_sender(Arc::new(conn), auth_key, state);
        self.set_state(ClientState::Authenticated);
        Ok(())
    }

    fn install_sender(&self, conn: Arc<Connection>, auth_key: AuthKey, state: MtprotoState) {
        let packer = Arc::new(MessagePacker::new(
            Arc::clone(&conn),
            EncryptedEncoder::new(auth_key),
            state,
            self.inner.updates_tx.clone(),
        ));
        let cancel = self.inner.cancel.child_token();
        let tasks = TaskTracker::new();
        let (frames_tx, frames_rx) = mpsc::channel(64);

        {
            let cancel = cancel.clone();
            tasks.spawn(async move {
                if let Err(e) = conn.recv_loop(frames_tx, cancel).await {
                    debug!("[gramkit] receive loop ended: {e}");
                }
            });
        }
        {
            let packer = Arc::clone(&packer);
            let cancel = cancel.clone();
            tasks.spawn(async move { packer.pump(frames_rx, cancel).await });
        }
        tasks.close();

        let previous = self.inner.sender.lock().replace(Sender { packer, cancel, tasks });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    /// Stop the receive tasks, wait for them, then close the transport.
    async fn teardown_sender(&self) {
        let taken = self.inner.sender.lock().take();
        if let Some(sender) = taken {
            self.shutdown_sender(sender).await;
        }
    }

    /// Remove the sender if its receive side has stopped, so the next
    /// request reconnects instead of writing into a dead transport.
    async fn discard_dead_sender(&self) {
        let dead = {
            let mut slot = self.inner.sender.lock();
            let closed = slot.as_ref().is_some_and(|sender| sender.packer.is_closed());
            if closed { slot.take() } else { None }
        };
        if let Some(sender) = dead {
            warn!("[gramkit] connection lost; reconnecting on the next request");
            self.shutdown_sender(sender).await;
            self.set_state(ClientState::Disconnected);
        }
    }

    /// Open a fresh connection to the home DC if the previous one was lost.
    /// Does nothing after [`disconnect`](Self::disconnect).
    async fn ensure_sender(&self) -> Result<(), InvocationError> {
        if self.inner.cancel.is_cancelled() || self.inner.sender.lock().is_some() {
            return Ok(());
        }
        let _one = self.inner.reconnect.lock().await;
        if self.inner.sender.lock().is_some() {
            return Ok(());
        }
        info!("[gramkit] reconnecting to DC{}", self.inner.session.lock().dc_id);
        self.open_sender(None).await?;
        self.init_connection().await?;
        if self.inner.signed_in.load(Ordering::Acquire) {
            self.set_state(ClientState::Ready);
        }
        Ok(())
    }

    async fn shutdown_sender(&self, sender: Sender) {
        let counters = sender.packer.state();
        {
            let mut s = self.inner.session.lock();
            s.salt = counters.salt;
            s.time_offset = counters.time_offset;
        }
        sender.cancel.cancel();
        sender.tasks.wait().await;
        sender.packer.connection().disconnect().await;
    }

    /// `help.getNearestDc`, then `initConnection` wrapped in `invokeWithLayer`
    /// carrying `help.getConfig`, whose DC table is kept for migrations.
    async fn init_connection(&self) -> Result<(), InvocationError> {
        let tl::enums::NearestDc::NearestDc(nearest) =
            self.invoke_once(&tl::functions::help::GetNearestDc {}).await?;
        debug!(
            "[gramkit] nearest DC {} (this DC {}, country {})",
            nearest.nearest_dc, nearest.this_dc, nearest.country
        );

        let cfg = &self.inner.config;
        let request = tl::functions::InvokeWithLayer {
            layer: LAYER,
            query: tl::functions::InitConnection {
                api_id:           cfg.api_id,
                device_model:     cfg.device_model.clone(),
                system_version:   cfg.system_version.clone(),
                app_version:      cfg.app_version.clone(),
                system_lang_code: cfg.system_lang_code.clone(),
                lang_pack:        cfg.lang_pack.clone(),
                lang_code:        cfg.lang_code.clone(),
                query:            tl::functions::help::GetConfig {},
            },
        };
        let tl::enums::Config::Config(server) = self.invoke_once(&request).await?;

        let mut options = self.inner.dc_options.lock();
        for option in server.dc_options {
            let tl::enums::DcOption::DcOption(o) = option;
            if o.ipv6 || o.media_only || o.cdn {
                continue;
            }
            options.insert(o.id, format!("{}:{}", o.ip_address, o.port));
        }
        info!("[gramkit] connected to DC{} (layer {LAYER})", server.this_dc);
        Ok(())
    }

    fn dc_addr(&self, dc_id: i32) -> Option<String> {
        self.inner.dc_options.lock().get(&dc_id).cloned()
    }

    /// Drop the current connection and key, and reconnect to `dc_id`.
    async fn migrate(&self, dc_id: i32) -> Result<(), InvocationError> {
        let addr = self.dc_addr(dc_id).ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, format!("no address known for DC{dc_id}"))
        })?;
        info!("[gramkit] migrating to DC{dc_id} ({addr})");
        self.teardown_sender().await;
        self.inner.session.lock().move_to(dc_id, &addr);
        self.open_sender(None).await?;
        self.init_connection().await?;
        self.save_session()
    }

    fn spawn_update_tasks(
        &self,
        updates_rx: mpsc::UnboundedReceiver<tl::enums::Updates>,
        mut events_rx: mpsc::UnboundedReceiver<UpdateEvent>,
    ) {
        let handler = Arc::clone(&self.inner.updates);
        self.inner.tasks.spawn(handler.run(updates_rx));

        let callbacks = Arc::clone(&self.inner.callbacks);
        let cancel = self.inner.cancel.clone();
        self.inner.tasks.spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events_rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                let current: Vec<UpdateCallback> = callbacks.read().clone();
                for callback in &current {
                    if let Err(e) = callback(&event) {
                        warn!("[gramkit] update callback failed: {e}");
                    }
                }
            }
            debug!("[gramkit] update drain stopped");
        });
    }

    /// Persist the session through the configured backend.
    pub fn save_session(&self) -> Result<(), InvocationError> {
        let counters = self.inner.sender.lock().as_ref().map(|s| s.packer.state());
        let session = {
            let mut s = self.inner.session.lock();
            if let Some(counters) = counters {
                s.salt = counters.salt;
                s.time_offset = counters.time_offset;
            }
            s.update_state = self.inner.updates.state();
            s.entities = self.inner.entities.records();
            s.clone()
        };
        self.inner.config.session_backend.save(&session)?;
        debug!("[gramkit] session saved ({})", self.inner.config.session_backend.name());
        Ok(())
    }

    /// Save the session, stop every background task and close the connection.
    pub async fn disconnect(&self) -> Result<(), InvocationError> {
        let saved = self.save_session();
        self.inner.updates.shutdown();
        self.inner.cancel.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.teardown_sender().await;
        self.set_state(ClientState::Disconnected);
        info!("[gramkit] disconnected");
        saved
    }

    // ── Requests ─────────────────────────────────────────────────────────

    /// Send one request, without retries or migration.
    async fn invoke_once<R>(&self, request: &R) -> Result<R::Return, InvocationError>
    where
        R: RemoteCall,
        R::Return: TlObject,
    {
        let packer = self
            .inner
            .sender
            .lock()
            .as_ref()
            .map(|s| Arc::clone(&s.packer))
            .ok_or(InvocationError::Connection(ConnectionError::Closed))?;
        let body = packer.send_and_recv(&request.to_bytes()).await?;
        let result = R::Return::from_bytes(&body)?;
        self.inner.entities.harvest(&result);
        Ok(result)
    }

    /// Invoke any raw API call.
    ///
    /// `*_MIGRATE_X` errors move the client to DC X and retry once; other
    /// failures go through the configured [`RetryPolicy`].
    pub async fn invoke<R>(&self, request: &R) -> Result<R::Return, InvocationError>
    where
        R: RemoteCall,
        R::Return: TlObject,
    {
        let mut fail_count = NonZeroU32::MIN;
        let mut slept_so_far = Duration::ZERO;
        let mut migrated = false;
        loop {
            let attempt = match self.ensure_sender().await {
                Ok(()) => self.invoke_once(request).await,
                Err(e) => Err(e),
            };
            let error = match attempt {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };
            if matches!(error, InvocationError::Connection(_)) {
                self.discard_dead_sender().await;
            }

            if let Some(dc_id) = error.migrate_dc() {
                if migrated {
                    return Err(error);
                }
                migrated = true;
                self.migrate(dc_id).await?;
                continue;
            }

            let ctx = RetryContext { fail_count, slept_so_far, error };
            match self.inner.config.retry_policy.should_retry(&ctx) {
                ControlFlow::Continue(delay) => {
                    tokio::time::sleep(delay).await;
                    slept_so_far += delay;
                    fail_count = fail_count.saturating_add(1);
                }
                ControlFlow::Break(()) => return Err(ctx.error),
            }
        }
    }

    /// Round-trip a `ping` and return how long it took.
    pub async fn ping(&self) -> Result<Duration, InvocationError> {
        let ping_id = gramkit_crypto::random::i64();
        let started = Instant::now();
        let tl::enums::Pong::Pong(pong) = self.invoke(&tl::functions::Ping { ping_id }).await?;
        if pong.ping_id != ping_id {
            warn!("[gramkit] pong for {} answered ping {ping_id}", pong.ping_id);
        }
        Ok(started.elapsed())
    }

    /// Fetch the signed-in user.
    pub async fn get_me(&self) -> Result<tl::types::User, InvocationError> {
        let request = tl::functions::users::GetUsers {
            id: vec![tl::types::InputUserSelf {}.into()],
        };
        self.invoke(&request)
            .await?
            .into_iter()
            .find_map(|u| match u {
                tl::enums::User::User(u) => Some(u),
                tl::enums::User::Empty(_) => None,
            })
            .ok_or_else(|| InvocationError::Deserialize("getUsers returned no user".into()))
    }

    // ── Updates ──────────────────────────────────────────────────────────

    /// Register a callback for every [`UpdateEvent`]. A callback error is
    /// logged and does not stop delivery.
    pub fn on_update<F>(&self, callback: F)
    where
        F: Fn(&UpdateEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static,
    {
        self.inner.callbacks.write().push(Arc::new(callback));
    }

    /// Current update watermarks.
    pub fn update_state(&self) -> UpdateState {
        self.inner.updates.state()
    }
}
