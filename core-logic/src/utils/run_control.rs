use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep as tokio_sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Granularity at which suspended work re-checks the stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Whether a cycle is running, waiting for its next scheduled fire,
/// or neither. Exactly one holds at a time; "stopping" is observed
/// through the cancellation token while still `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Scheduled,
}

/// Shared run control passed to every component of a cycle.
///
/// Holds the stop token (renewed per run), the in-flight suspension
/// counter, the run-state cell and the cancel handle for a scheduled
/// cycle. Cancellation is cooperative: it is only observed at loop
/// boundaries and inside [`RunContext::sleep`], never preemptively,
/// so an in-flight network submission always completes.
pub struct RunContext {
    stop: Mutex<CancellationToken>,
    active_ops: AtomicUsize,
    interrupt_logged: AtomicBool,
    state: Mutex<RunState>,
    scheduled: Mutex<Option<CancellationToken>>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            stop: Mutex::new(CancellationToken::new()),
            active_ops: AtomicUsize::new(0),
            interrupt_logged: AtomicBool::new(false),
            state: Mutex::new(RunState::Idle),
            scheduled: Mutex::new(None),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().expect("run state poisoned")
    }

    /// Transitions `Idle`/`Scheduled` -> `Running` with a fresh stop
    /// token. Fails if a cycle is already running.
    pub fn try_begin_run(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().expect("run state poisoned");
        if *state == RunState::Running {
            anyhow::bail!("Cycle is still running. Stop or cancel the current cycle first.");
        }
        *state = RunState::Running;
        *self.stop.lock().expect("stop token poisoned") = CancellationToken::new();
        self.interrupt_logged.store(false, Ordering::SeqCst);
        *self.scheduled.lock().expect("schedule handle poisoned") = None;
        Ok(())
    }

    /// Transitions `Running` -> `Scheduled` and returns the cancel
    /// handle for the pending timer.
    pub fn finish_to_scheduled(&self) -> CancellationToken {
        *self.state.lock().expect("run state poisoned") = RunState::Scheduled;
        let token = CancellationToken::new();
        *self.scheduled.lock().expect("schedule handle poisoned") = Some(token.clone());
        token
    }

    pub fn finish_to_idle(&self) {
        *self.state.lock().expect("run state poisoned") = RunState::Idle;
        *self.scheduled.lock().expect("schedule handle poisoned") = None;
    }

    /// Cancels a pending scheduled cycle, if any. A direct operation:
    /// the waiter observes the cancel and settles to `Idle`.
    pub fn cancel_scheduled(&self) {
        if let Some(token) = self
            .scheduled
            .lock()
            .expect("schedule handle poisoned")
            .take()
        {
            token.cancel();
        }
    }

    /// Requests a cooperative stop of the running cycle.
    pub fn request_stop(&self) {
        self.stop.lock().expect("stop token poisoned").cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.lock().expect("stop token poisoned").is_cancelled()
    }

    pub fn stop_token(&self) -> CancellationToken {
        self.stop.lock().expect("stop token poisoned").clone()
    }

    pub fn active_ops(&self) -> usize {
        self.active_ops.load(Ordering::SeqCst)
    }

    fn log_interrupt_once(&self) {
        if !self.interrupt_logged.swap(true, Ordering::SeqCst) {
            info!(target: "activity", "Process interrupted.");
        }
    }

    /// Interruptible sleep: the suspension point every delay in the
    /// cycle goes through. Returns immediately if a stop is already
    /// active; otherwise counts itself in-flight and wakes early when
    /// the stop token fires, checking at `POLL_INTERVAL` resolution.
    /// The counter is released on every exit path.
    pub async fn sleep(&self, duration: Duration) {
        let token = self.stop_token();
        if token.is_cancelled() {
            self.log_interrupt_once();
            return;
        }

        self.active_ops.fetch_add(1, Ordering::SeqCst);
        let _guard = OpGuard(self);

        let mut remaining = duration;
        while remaining > Duration::ZERO {
            let step = remaining.min(POLL_INTERVAL);
            tokio::select! {
                _ = token.cancelled() => {
                    self.log_interrupt_once();
                    return;
                }
                _ = tokio_sleep(step) => {}
            }
            remaining = remaining.saturating_sub(step);
        }
    }

    /// Waits until no suspended operation remains in flight. The stop
    /// sequence runs this before declaring the run fully stopped, so
    /// a new cycle cannot start while stale work is still unwinding.
    pub async fn wait_for_drain(&self) {
        while self.active_ops.load(Ordering::SeqCst) > 0 {
            tokio_sleep(POLL_INTERVAL).await;
        }
    }
}

struct OpGuard<'a>(&'a RunContext);

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.0.active_ops.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn begin_run_rejects_concurrent_cycle() {
        let ctx = RunContext::new();
        ctx.try_begin_run().unwrap();
        assert!(ctx.try_begin_run().is_err());
        ctx.finish_to_idle();
        assert!(ctx.try_begin_run().is_ok());
    }

    #[tokio::test]
    async fn begin_run_resets_stop_flag() {
        let ctx = RunContext::new();
        ctx.try_begin_run().unwrap();
        ctx.request_stop();
        assert!(ctx.is_stopped());
        ctx.finish_to_idle();
        ctx.try_begin_run().unwrap();
        assert!(!ctx.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_wakes_on_stop_and_drains_counter() {
        let ctx = Arc::new(RunContext::new());
        ctx.try_begin_run().unwrap();

        let sleeper = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.sleep(Duration::from_secs(3600)).await })
        };

        // Let the sleeper register itself.
        while ctx.active_ops() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        ctx.request_stop();
        sleeper.await.unwrap();
        assert_eq!(ctx.active_ops(), 0);
    }

    #[tokio::test]
    async fn sleep_returns_immediately_when_already_stopped() {
        let ctx = RunContext::new();
        ctx.try_begin_run().unwrap();
        ctx.request_stop();
        let start = std::time::Instant::now();
        ctx.sleep(Duration::from_secs(10)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(ctx.active_ops(), 0);
    }

    #[tokio::test]
    async fn cancel_scheduled_fires_the_handle() {
        let ctx = RunContext::new();
        ctx.try_begin_run().unwrap();
        let token = ctx.finish_to_scheduled();
        assert_eq!(ctx.state(), RunState::Scheduled);
        ctx.cancel_scheduled();
        assert!(token.is_cancelled());
    }
}
