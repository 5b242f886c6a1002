mod common;

use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use common::{SALT, Server, auth_key_bytes};
use gramkit_client::{
    AutoSleep, Client, ClientState, Config, ConnectionError, InMemoryBackend, InvocationError, NoRetries,
    RetryContext, RetryPolicy, Session, SessionBackend, UpdateEvent,
};
use gramkit_tl_types::{Deserializable, Identifiable, LAYER, Serializable, enums, functions, types};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const API_ID: i32 = 4242;

fn seeded_backend() -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new());
    let mut session = Session::new(2, "149.154.167.51:443");
    session.auth_key = Some(auth_key_bytes());
    session.salt = SALT;
    backend.save(&session).unwrap();
    backend
}

fn config(backend: Arc<InMemoryBackend>) -> Config {
    Config {
        api_id: API_ID,
        api_hash: "0123456789abcdef".into(),
        session_backend: backend,
        ..Config::default()
    }
}

fn server_config() -> Vec<u8> {
    let option = |id: i32, ipv6: bool, ip: &str| -> enums::DcOption {
        types::DcOption {
            ipv6,
            media_only: false,
            tcpo_only: false,
            cdn: false,
            r#static: false,
            this_port_only: false,
            id,
            ip_address: ip.into(),
            port: 443,
            secret: None,
        }
        .into()
    };
    enums::Config::from(types::Config {
        date: 1_700_000_000,
        expires: 1_700_003_600,
        test_mode: false,
        this_dc: 2,
        dc_options: vec![option(2, false, "149.154.167.51"), option(2, true, "2001:67c:4e8:f002::a")],
    })
    .to_bytes()
}

/// Answer the two requests every connection starts with.
async fn accept(server: &mut Server) {
    let nearest = server.recv_request().await;
    assert_eq!(
        nearest.constructor_id(),
        Some(<functions::help::GetNearestDc as Identifiable>::CONSTRUCTOR_ID)
    );
    let reply = enums::NearestDc::from(types::NearestDc { country: "NL".into(), this_dc: 2, nearest_dc: 2 });
    server.reply(nearest.message.msg_id, reply.to_bytes()).await;

    let init = server.recv_request().await;
    let body = &init.message.body;
    assert_eq!(init.constructor_id(), Some(0xda9b0d0d));
    assert_eq!(i32::from_le_bytes(body[4..8].try_into().unwrap()), LAYER);
    assert_eq!(u32::from_le_bytes(body[8..12].try_into().unwrap()), 0xc1cd5ea9);
    assert_eq!(i32::from_le_bytes(body[16..20].try_into().unwrap()), API_ID);
    server.reply(init.message.msg_id, server_config()).await;
}

async fn connected(config: Config) -> (Client, Server) {
    let (client_io, server_io) = tokio::io::duplex(1 << 16);
    let mut server = Server::new(server_io);
    let (client, ()) = tokio::join!(
        async { Client::connect_with_stream(config, client_io).await.unwrap() },
        accept(&mut server),
    );
    (client, server)
}

// ── Connection ───────────────────────────────────────────────────────

#[tokio::test]
async fn stored_key_skips_the_exchange() {
    let backend = seeded_backend();
    let (client, mut server) = connected(config(Arc::clone(&backend))).await;
    assert_eq!(client.state(), ClientState::Authenticated);

    let ping = {
        let client = client.clone();
        tokio::spawn(async move { client.ping().await })
    };
    let request = server.recv_request().await;
    let sent = functions::Ping::from_bytes(&request.message.body[4..]).unwrap();
    let pong = enums::Pong::from(types::Pong { msg_id: request.message.msg_id, ping_id: sent.ping_id });
    server.send(pong.to_bytes(), false).await;
    assert!(ping.await.unwrap().is_ok());

    client.disconnect().await.unwrap();
    assert_eq!(client.state(), ClientState::Disconnected);
}

#[tokio::test]
async fn disconnect_persists_the_session() {
    let backend = seeded_backend();
    let (client, _server) = connected(config(Arc::clone(&backend))).await;
    client.disconnect().await.unwrap();

    let saved = backend.load().unwrap().unwrap();
    assert_eq!(saved.auth_key, Some(auth_key_bytes()));
    assert_eq!(saved.salt, SALT);
    assert_eq!(saved.dc_id, 2);
}

// ── Retries ──────────────────────────────────────────────────────────

/// Retries any failure once after a short pause.
struct RetryOnce;

impl RetryPolicy for RetryOnce {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration> {
        if ctx.fail_count.get() == 1 {
            ControlFlow::Continue(Duration::from_millis(10))
        } else {
            ControlFlow::Break(())
        }
    }
}

fn flood_wait() -> Vec<u8> {
    enums::RpcError::from(types::RpcError { error_code: 420, error_message: "FLOOD_WAIT_3".into() }).to_bytes()
}

#[tokio::test]
async fn retry_policy_decides_on_flood_wait() {
    let config = Config { retry_policy: Arc::new(RetryOnce), ..config(seeded_backend()) };
    let (client, mut server) = connected(config).await;

    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.invoke(&functions::help::GetNearestDc {}).await })
    };
    let first = server.recv_request().await;
    server.reply(first.message.msg_id, flood_wait()).await;

    let second = server.recv_request().await;
    assert_eq!(second.message.body, first.message.body);
    assert!(second.message.msg_id > first.message.msg_id);
    let reply = enums::NearestDc::from(types::NearestDc { country: "DE".into(), this_dc: 2, nearest_dc: 4 });
    server.reply(second.message.msg_id, reply.to_bytes()).await;

    let enums::NearestDc::NearestDc(nearest) = call.await.unwrap().unwrap();
    assert_eq!(nearest.country, "DE");
    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn flood_wait_beyond_the_policy_is_returned() {
    let config = Config { retry_policy: Arc::new(NoRetries), ..config(seeded_backend()) };
    let (client, mut server) = connected(config).await;

    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.invoke(&functions::help::GetConfig {}).await })
    };
    let request = server.recv_request().await;
    server.reply(request.message.msg_id, flood_wait()).await;

    let err = call.await.unwrap().unwrap_err();
    assert_eq!(err.flood_wait_seconds(), Some(3));
    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn migration_to_an_unknown_dc_fails() {
    let (client, mut server) = connected(config(seeded_backend())).await;

    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.invoke(&functions::help::GetConfig {}).await })
    };
    let request = server.recv_request().await;
    let redirect = enums::RpcError::from(types::RpcError { error_code: 303, error_message: "PHONE_MIGRATE_9".into() });
    server.reply(request.message.msg_id, redirect.to_bytes()).await;

    match call.await.unwrap() {
        Err(InvocationError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::AddrNotAvailable),
        other => panic!("expected a missing-address error, got {other:?}"),
    }
    client.disconnect().await.unwrap();
}

// ── Lost connections ─────────────────────────────────────────────────

#[tokio::test]
async fn request_after_the_connection_dropped_fails_fast() {
    let config = Config { retry_policy: Arc::new(NoRetries), ..config(seeded_backend()) };
    let (client, server) = connected(config).await;
    server.hang_up().await;

    let result = tokio::time::timeout(Duration::from_secs(5), client.invoke(&functions::help::GetConfig {}))
        .await
        .expect("a request on a dead connection must not hang");
    assert!(matches!(result, Err(InvocationError::Connection(ConnectionError::Closed))));
    assert_eq!(client.state(), ClientState::Disconnected);
    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn dropped_connection_is_reopened_and_the_request_resent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = Arc::new(InMemoryBackend::new());
    let mut session = Session::new(2, &listener.local_addr().unwrap().to_string());
    session.auth_key = Some(auth_key_bytes());
    session.salt = SALT;
    backend.save(&session).unwrap();
    let policy = AutoSleep { io_pause: Some(Duration::from_millis(10)), ..AutoSleep::default() };
    let config = Config { retry_policy: Arc::new(policy), ..config(backend) };

    let (client, first) = tokio::join!(async { Client::connect(config).await.unwrap() }, async {
        let mut server = Server::new(listener.accept().await.unwrap().0);
        accept(&mut server).await;
        server
    });
    first.hang_up().await;

    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.invoke(&functions::help::GetNearestDc {}).await })
    };
    let mut second = Server::new(listener.accept().await.unwrap().0);
    accept(&mut second).await;
    let request = second.recv_request().await;
    assert_eq!(
        request.constructor_id(),
        Some(<functions::help::GetNearestDc as Identifiable>::CONSTRUCTOR_ID)
    );
    let reply = enums::NearestDc::from(types::NearestDc { country: "SE".into(), this_dc: 2, nearest_dc: 2 });
    second.reply(request.message.msg_id, reply.to_bytes()).await;

    let enums::NearestDc::NearestDc(nearest) = call.await.unwrap().unwrap();
    assert_eq!(nearest.country, "SE");
    assert_eq!(client.state(), ClientState::Authenticated);
    client.disconnect().await.unwrap();
}

// ── Updates ──────────────────────────────────────────────────────────

#[tokio::test]
async fn pushed_updates_reach_callbacks() {
    let (client, mut server) = connected(config(seeded_backend())).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on_update(move |event| {
        tx.send(event.clone())?;
        Ok(())
    });
    client.on_update(|_| Err("a failing callback does not stop delivery".into()));

    let update: enums::Update = types::UpdateMessageId { id: 7, random_id: 70 }.into();
    server.send(enums::Updates::from(types::UpdateShort { update: update.clone(), date: 1 }).to_bytes(), true).await;

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(event, UpdateEvent::Update(update));

    let second: enums::Update = types::UpdateMessageId { id: 8, random_id: 80 }.into();
    server.send(enums::Updates::from(types::UpdateShort { update: second.clone(), date: 2 }).to_bytes(), true).await;
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(event, UpdateEvent::Update(second));
    client.disconnect().await.unwrap();
}
