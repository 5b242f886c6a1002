//! Drives the sans-IO key exchange over a live [`Connection`].

use std::time::Duration;

use gramkit_crypto::RsaKeyStore;
use gramkit_mtproto::MtprotoState;
use gramkit_mtproto::authentication::{self, DhGenOutcome, Finished};
use gramkit_mtproto::plain;
use gramkit_tl_types::{Deserializable, RemoteCall, Serializable};

use crate::connection::Connection;
use crate::errors::ConnectionError;

/// One unauthenticated round-trip. Message ids come from `state`'s clock.
async fn plain_call<R: RemoteCall>(
    conn: &Connection,
    state: &mut MtprotoState,
    request: &R,
    timeout: Duration,
) -> Result<R::Return, ConnectionError> {
    conn.send(&plain::encode(state, &request.to_bytes())).await?;
    let frame = tokio::time::timeout(timeout, conn.recv())
        .await
        .map_err(|_| ConnectionError::Timeout)??;
    let message = plain::decode(&frame)?;
    Ok(R::Return::from_bytes(&message.body)?)
}

/// Run the full DH exchange and return the new key, clock offset and first salt.
///
/// Each server answer must arrive within `timeout`.
pub async fn generate_auth_key(
    conn: &Connection,
    state: &mut MtprotoState,
    keys: &RsaKeyStore,
    timeout: Duration,
) -> Result<Finished, ConnectionError> {
    log::info!("[gramkit] starting auth key exchange");

    let (request, step1) = authentication::step1();
    let res_pq = plain_call(conn, state, &request, timeout).await?;

    let (request, step2) = authentication::step2(step1, res_pq, keys)?;
    let dh_params = plain_call(conn, state, &request, timeout).await?;

    let (mut request, mut step3) = authentication::step3(step2, dh_params)?;
    loop {
        let answer = plain_call(conn, state, &request, timeout).await?;
        match authentication::finish(step3, answer)? {
            DhGenOutcome::Done(finished) => {
                state.time_offset = finished.time_offset;
                state.salt = finished.first_salt;
                return Ok(finished);
            }
            DhGenOutcome::Retry(next_request, next_step) => {
                request = next_request;
                step3 = next_step;
            }
        }
    }
}
