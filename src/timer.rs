//! Cancellable round countdown.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Tick cadence for the seconds-granularity countdown display.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { generation: u64, remaining: u32 },
    Expired { generation: u64 },
}

/// At most one countdown is ever live: `start` aborts the previous task
/// before spawning the next one, so two timers' callbacks never interleave.
/// Events carry a generation counter so consumers can drop anything already
/// queued from a superseded timer.
pub struct RoundTimer {
    events: mpsc::UnboundedSender<TimerEvent>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl RoundTimer {
    pub fn new(events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            events,
            task: None,
            generation: 0,
        }
    }

    /// Start a countdown of `seconds`, cancelling any active timer first.
    /// Emits `Tick { remaining }` with `remaining = max(floor(duration -
    /// elapsed), 0)` on every interval and exactly one `Expired` at the
    /// deadline. Returns the new timer's generation.
    pub fn start(&mut self, seconds: u32) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let events = self.events.clone();

        self.task = Some(tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            let deadline = started + Duration::from_secs(u64::from(seconds));
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        let _ = events.send(TimerEvent::Expired { generation });
                        break;
                    }
                    _ = ticker.tick() => {
                        let elapsed = started.elapsed().as_secs_f64();
                        let remaining = (f64::from(seconds) - elapsed).floor().max(0.0) as u32;
                        let _ = events.send(TimerEvent::Tick { generation, remaining });
                    }
                }
            }
        }));
        generation
    }

    /// Idempotent; safe to call when no timer is active.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_monotonic_and_expiry_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = RoundTimer::new(tx);
        timer.start(2);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let events = drain(&mut rx);

        let ticks: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::Tick { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert!(!ticks.is_empty());
        assert!(ticks.windows(2).all(|w| w[0] >= w[1]), "ticks increased: {ticks:?}");
        assert_eq!(*ticks.last().unwrap(), 0, "countdown never reached 0");

        let expirations = events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Expired { .. }))
            .count();
        assert_eq!(expirations, 1);
        assert!(
            matches!(events.last(), Some(TimerEvent::Expired { .. })),
            "ticks continued after expiry"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_expiry_suppresses_expiration() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = RoundTimer::new(tx);
        timer.start(5);

        tokio::time::sleep(Duration::from_secs(1)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .all(|e| !matches!(e, TimerEvent::Expired { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timer = RoundTimer::new(tx);
        timer.cancel();
        timer.start(1);
        timer.cancel();
        timer.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_supersedes_previous_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = RoundTimer::new(tx);
        let first = timer.start(5);
        let second = timer.start(2);
        assert_ne!(first, second);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let events = drain(&mut rx);

        assert!(!events.is_empty());
        for event in &events {
            let generation = match event {
                TimerEvent::Tick { generation, .. } => *generation,
                TimerEvent::Expired { generation } => *generation,
            };
            assert_eq!(generation, second, "observed event from cancelled timer");
        }
        let expirations = events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Expired { .. }))
            .count();
        assert_eq!(expirations, 1);
    }
}
