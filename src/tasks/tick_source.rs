//! Periodic tick source backing the countdown

use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::debug;

/// What a tick handle reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Countdown still running with this much time left
    Tick { remaining_ms: u64 },
    /// Countdown reached zero; sent exactly once
    Finished,
}

/// Event emitted by a tick handle, tagged with the generation that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub generation: u64,
    pub kind: TickKind,
}

impl TickEvent {
    pub fn tick(generation: u64, remaining_ms: u64) -> Self {
        Self {
            generation,
            kind: TickKind::Tick { remaining_ms },
        }
    }

    pub fn finished(generation: u64) -> Self {
        Self {
            generation,
            kind: TickKind::Finished,
        }
    }
}

/// Factory for countdown tick handles
pub trait TickSource {
    type Handle: TickHandle;

    /// Create a stopped handle that counts `duration` down in `interval` steps
    fn create(&self, generation: u64, duration: Duration, interval: Duration) -> Self::Handle;
}

/// A single countdown. Must not report anything after `cancel`.
pub trait TickHandle {
    /// Begin ticking. Starting an already started handle does nothing.
    fn start(&mut self);
    fn cancel(&mut self);
    fn is_started(&self) -> bool;
}

/// Tick source running each countdown as a tokio task
#[derive(Debug, Clone)]
pub struct TokioTickSource {
    tx: mpsc::UnboundedSender<TickEvent>,
}

impl TokioTickSource {
    pub fn new(tx: mpsc::UnboundedSender<TickEvent>) -> Self {
        Self { tx }
    }

    /// Create a source together with the receiver its events arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TickEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl TickSource for TokioTickSource {
    type Handle = TokioTickHandle;

    fn create(&self, generation: u64, duration: Duration, interval: Duration) -> TokioTickHandle {
        TokioTickHandle {
            generation,
            duration,
            interval,
            tx: self.tx.clone(),
            task: None,
            cancelled: false,
        }
    }
}

/// Handle to one spawned countdown task. Dropping it cancels the countdown.
#[derive(Debug)]
pub struct TokioTickHandle {
    generation: u64,
    duration: Duration,
    interval: Duration,
    tx: mpsc::UnboundedSender<TickEvent>,
    task: Option<JoinHandle<()>>,
    cancelled: bool,
}

impl TickHandle for TokioTickHandle {
    fn start(&mut self) {
        if self.task.is_some() || self.cancelled {
            return;
        }

        debug!(
            "Starting tick task gen={} duration={:?} interval={:?}",
            self.generation, self.duration, self.interval
        );
        self.task = Some(tokio::spawn(run_countdown(
            self.generation,
            self.duration,
            self.interval,
            self.tx.clone(),
        )));
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        if let Some(task) = self.task.take() {
            debug!("Cancelling tick task gen={}", self.generation);
            task.abort();
        }
    }

    fn is_started(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for TokioTickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Emit a tick every `interval` until `duration` has elapsed, then finish.
/// The final wait is shortened so `Finished` lands on the deadline.
async fn run_countdown(
    generation: u64,
    duration: Duration,
    interval: Duration,
    tx: mpsc::UnboundedSender<TickEvent>,
) {
    let deadline = Instant::now() + duration;
    let mut next = Instant::now();

    loop {
        let now = Instant::now();
        if now >= deadline {
            let _ = tx.send(TickEvent::finished(generation));
            debug!("Tick task gen={} finished", generation);
            return;
        }

        let remaining_ms = (deadline - now).as_millis() as u64;
        if tx.send(TickEvent::tick(generation, remaining_ms)).is_err() {
            debug!("Tick receiver closed, stopping gen={}", generation);
            return;
        }

        next += interval;
        if next < now {
            // fell behind; skip missed ticks instead of bursting
            next = now + interval;
        }
        sleep_until(next.min(deadline)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(rx: &mut mpsc::UnboundedReceiver<TickEvent>, count: usize) -> Vec<TickEvent> {
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            events.push(rx.recv().await.expect("tick channel closed"));
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_down_then_finishes_once() {
        let (source, mut rx) = TokioTickSource::channel();
        let mut handle = source.create(1, Duration::from_secs(10), Duration::from_secs(1));
        handle.start();

        let events = collect(&mut rx, 11).await;
        let ticks: Vec<u64> = events[..10]
            .iter()
            .map(|e| match e.kind {
                TickKind::Tick { remaining_ms } => remaining_ms,
                TickKind::Finished => panic!("finished early"),
            })
            .collect();
        assert_eq!(ticks, (1..=10).rev().map(|s| s * 1000).collect::<Vec<_>>());
        assert_eq!(events[10], TickEvent::finished(1));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn final_wait_is_shortened_to_deadline() {
        let (source, mut rx) = TokioTickSource::channel();
        let mut handle = source.create(7, Duration::from_millis(2500), Duration::from_secs(1));
        let started = Instant::now();
        handle.start();

        let events = collect(&mut rx, 4).await;
        assert_eq!(events[2], TickEvent::tick(7, 500));
        assert_eq!(events[3], TickEvent::finished(7));
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_finish() {
        let (source, mut rx) = TokioTickSource::channel();
        let mut handle = source.create(3, Duration::from_secs(5), Duration::from_secs(1));
        handle.start();
        assert!(handle.is_started());

        let events = collect(&mut rx, 2).await;
        assert_eq!(events[1], TickEvent::tick(3, 4000));

        handle.cancel();
        assert!(!handle.is_started());
        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(event) = rx.try_recv() {
            assert_ne!(event.kind, TickKind::Finished);
        }

        // a cancelled handle cannot be restarted
        handle.start();
        assert!(!handle.is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let (source, mut rx) = TokioTickSource::channel();
        let mut handle = source.create(1, Duration::from_secs(2), Duration::from_secs(1));
        handle.start();
        handle.start();

        let events = collect(&mut rx, 3).await;
        assert_eq!(events[0], TickEvent::tick(1, 2000));
        assert_eq!(events[1], TickEvent::tick(1, 1000));
        assert_eq!(events[2], TickEvent::finished(1));
        assert!(rx.try_recv().is_err());
    }
}
