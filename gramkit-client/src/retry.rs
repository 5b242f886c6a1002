//! What to do when a request fails: give up, or wait and send it again.

use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::errors::{ConnectionError, InvocationError};

/// Decides, per failure, whether a request is resent and after how long.
///
/// `Continue(delay)` resends after `delay`; `Break(())` hands the error back
/// to the caller.
pub trait RetryPolicy: Send + Sync + 'static {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration>;
}

/// One failed attempt of a request.
pub struct RetryContext {
    /// 1 on the first failure of this request.
    pub fail_count: NonZeroU32,
    /// Sum of the delays already granted to this request.
    pub slept_so_far: Duration,
    pub error: InvocationError,
}

/// Every error goes straight back to the caller.
pub struct NoRetries;

impl RetryPolicy for NoRetries {
    fn should_retry(&self, _: &RetryContext) -> ControlFlow<(), Duration> {
        ControlFlow::Break(())
    }
}

/// Whether `error` means the transport went away, so a reconnect may help.
fn is_lost_connection(error: &InvocationError) -> bool {
    matches!(
        error,
        InvocationError::Io(_) | InvocationError::Connection(ConnectionError::Io(_) | ConnectionError::Closed)
    )
}

/// Waits out short flood-waits and pauses once after a dropped connection.
///
/// A `FLOOD_WAIT_N` is slept through if `N` is at most `flood_ceiling` and the
/// request's total waiting stays within `total_budget`.
pub struct AutoSleep {
    pub flood_ceiling: Duration,
    /// Pause before resending after an I/O failure; `None` surfaces it.
    pub io_pause: Option<Duration>,
    pub total_budget: Duration,
}

impl Default for AutoSleep {
    fn default() -> Self {
        Self {
            flood_ceiling: Duration::from_secs(60),
            io_pause: Some(Duration::from_secs(1)),
            total_budget: Duration::from_secs(120),
        }
    }
}

impl AutoSleep {
    fn within_budget(&self, ctx: &RetryContext, delay: Duration) -> bool {
        ctx.slept_so_far + delay <= self.total_budget
    }
}

impl RetryPolicy for AutoSleep {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration> {
        let delay = match &ctx.error {
            err if is_lost_connection(err) && ctx.fail_count.get() == 1 => match self.io_pause {
                Some(pause) => pause,
                None => return ControlFlow::Break(()),
            },
            err => match err.flood_wait_seconds().map(Duration::from_secs) {
                Some(wait) if wait <= self.flood_ceiling => wait,
                _ => return ControlFlow::Break(()),
            },
        };
        if !self.within_budget(ctx, delay) {
            log::warn!("[gramkit] retry budget spent after {:?}; giving up", ctx.slept_so_far);
            return ControlFlow::Break(());
        }
        log::info!("[gramkit] attempt {} failed ({}); retrying in {delay:?}", ctx.fail_count, ctx.error);
        ControlFlow::Continue(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RpcError;

    fn failure(error: InvocationError, fail_count: u32, slept: u64) -> RetryContext {
        RetryContext {
            fail_count: NonZeroU32::new(fail_count).unwrap(),
            slept_so_far: Duration::from_secs(slept),
            error,
        }
    }

    fn flood(secs: u32) -> InvocationError {
        InvocationError::Rpc(RpcError::from_telegram(420, &format!("FLOOD_WAIT_{secs}")))
    }

    #[test]
    fn repeated_short_floods_sleep_until_the_budget_runs_out() {
        let policy = AutoSleep { total_budget: Duration::from_secs(12), ..AutoSleep::default() };
        assert_eq!(policy.should_retry(&failure(flood(5), 1, 0)), ControlFlow::Continue(Duration::from_secs(5)));
        assert_eq!(policy.should_retry(&failure(flood(5), 2, 5)), ControlFlow::Continue(Duration::from_secs(5)));
        assert_eq!(policy.should_retry(&failure(flood(5), 3, 10)), ControlFlow::Break(()));
    }

    #[test]
    fn flood_above_the_ceiling_is_surfaced() {
        let policy = AutoSleep { flood_ceiling: Duration::from_secs(10), ..AutoSleep::default() };
        assert_eq!(policy.should_retry(&failure(flood(11), 1, 0)), ControlFlow::Break(()));
    }

    #[test]
    fn io_failure_pauses_only_once() {
        let policy = AutoSleep::default();
        let io = || InvocationError::Io(std::io::Error::other("reset"));
        assert_eq!(policy.should_retry(&failure(io(), 1, 0)), ControlFlow::Continue(Duration::from_secs(1)));
        assert_eq!(policy.should_retry(&failure(io(), 2, 1)), ControlFlow::Break(()));

        let dropped = InvocationError::Connection(ConnectionError::Closed);
        assert_eq!(policy.should_retry(&failure(dropped, 1, 0)), ControlFlow::Continue(Duration::from_secs(1)));
        let reset = InvocationError::Connection(ConnectionError::Io(std::io::Error::other("reset")));
        assert_eq!(policy.should_retry(&failure(reset, 1, 0)), ControlFlow::Continue(Duration::from_secs(1)));
        let corrupt = InvocationError::Connection(ConnectionError::Checksum { expected: 1, got: 2 });
        assert_eq!(policy.should_retry(&failure(corrupt, 1, 0)), ControlFlow::Break(()));

        let strict = AutoSleep { io_pause: None, ..AutoSleep::default() };
        assert_eq!(strict.should_retry(&failure(io(), 1, 0)), ControlFlow::Break(()));
    }

    #[test]
    fn no_retries_ignores_the_error() {
        assert_eq!(NoRetries.should_retry(&failure(flood(1), 1, 0)), ControlFlow::Break(()));
    }
}
