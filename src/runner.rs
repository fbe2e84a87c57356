//! Host shell for the session state machine.
//!
//! The runner owns the tokio machinery the session itself must not touch: the
//! event channel, the round timer, the service client and the media/display
//! collaborators. It executes every [`Command`] the session returns, spawning
//! fire-and-forget fetch tasks whose completions come back as events.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::backend::QuizService;
use crate::protocol::{Command, DisplayUpdate, NavDirection, SessionEvent};
use crate::session::QuizSession;
use crate::timer::{RoundTimer, TimerEvent};
use crate::types::RoundSeq;

/// Media playback primitives supplied by the embedding frontend. The core
/// only issues commands here; lifecycle events flow back through a
/// [`SessionHandle`].
pub trait MediaPlayer: Send {
    fn load(&mut self, url: &str);
    fn seek_and_play(&mut self, position_secs: f64);
}

/// Rendering surface for display updates. Implementations must not block.
pub trait SessionView: Send {
    fn apply(&mut self, update: &DisplayUpdate);
}

/// Cloneable entry point for feeding events into a running session.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Create the event channel a runner will consume.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events }, rx)
    }

    pub fn send(&self, event: SessionEvent) {
        // A closed channel means the runner is gone; nothing left to notify.
        let _ = self.events.send(event);
    }

    pub fn toggle_pause(&self) {
        self.send(SessionEvent::PauseToggled);
    }

    pub fn advance(&self) {
        self.send(SessionEvent::AdvanceRequested);
    }

    pub fn input(&self, text: impl Into<String>) {
        self.send(SessionEvent::InputChanged { text: text.into() });
    }

    pub fn navigate(&self, dir: NavDirection) {
        self.send(SessionEvent::Navigate { dir });
    }

    pub fn confirm(&self) {
        self.send(SessionEvent::ConfirmPressed);
    }

    pub fn media_loaded(&self, duration_secs: f64) {
        self.send(SessionEvent::MediaLoaded { duration_secs });
    }

    pub fn media_started(&self) {
        self.send(SessionEvent::MediaStarted);
    }

    pub fn shutdown(&self) {
        self.send(SessionEvent::Shutdown);
    }
}

pub struct SessionRunner<P: MediaPlayer, V: SessionView> {
    session: QuizSession,
    service: Arc<dyn QuizService>,
    player: P,
    view: V,
    handle: SessionHandle,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    timer: RoundTimer,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    /// Generation whose timer events are current; anything else is stale.
    active_timer: Option<u64>,
    schedule_poll: Duration,
}

impl<P: MediaPlayer, V: SessionView> SessionRunner<P, V> {
    pub fn new(
        session: QuizSession,
        service: Arc<dyn QuizService>,
        player: P,
        view: V,
        handle: SessionHandle,
        events_rx: mpsc::UnboundedReceiver<SessionEvent>,
        schedule_poll: Duration,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            session,
            service,
            player,
            view,
            handle,
            events_rx,
            timer: RoundTimer::new(timer_tx),
            timer_rx,
            active_timer: None,
            schedule_poll,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Drive the session until shutdown. All session work happens on this
    /// task; spawned fetches only post completion events back.
    pub async fn run(mut self) {
        let mut schedule_ticker = tokio::time::interval(self.schedule_poll);
        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(SessionEvent::Shutdown) | None => {
                            tracing::info!("session shutting down");
                            break;
                        }
                        Some(event) => self.dispatch(event),
                    }
                }
                timer_event = self.timer_rx.recv() => {
                    if let Some(timer_event) = timer_event {
                        self.on_timer_event(timer_event);
                    }
                }
                _ = schedule_ticker.tick() => self.refresh_schedule(),
            }
        }
    }

    fn dispatch(&mut self, event: SessionEvent) {
        for command in self.session.handle(event) {
            self.execute(command);
        }
    }

    fn on_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick {
                generation,
                remaining,
            } if Some(generation) == self.active_timer => {
                self.dispatch(SessionEvent::TimerTick { remaining });
            }
            TimerEvent::Expired { generation } if Some(generation) == self.active_timer => {
                self.active_timer = None;
                self.dispatch(SessionEvent::TimerExpired);
            }
            // Queued events from a superseded timer.
            _ => {}
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Display(update) => self.view.apply(&update),
            Command::StartTimer { seconds } => {
                self.active_timer = Some(self.timer.start(seconds));
            }
            Command::CancelTimer => {
                self.timer.cancel();
                self.active_timer = None;
            }
            Command::LoadMedia { url } => self.player.load(&url),
            Command::SeekAndPlay { position_secs } => self.player.seek_and_play(position_secs),
            Command::FetchRound { seq } => self.spawn_round_fetch(seq),
            Command::FetchSongInfo {
                seq,
                song_id,
                ann_song_id,
            } => self.spawn_song_info_fetch(seq, song_id, ann_song_id),
            Command::ReportAnswer { answer_time } => self.spawn_answer_report(answer_time),
        }
    }

    fn spawn_round_fetch(&self, seq: RoundSeq) {
        let service = self.service.clone();
        let events = self.handle.clone();
        tokio::spawn(async move {
            match service.next_round(seq).await {
                Ok(round) => events.send(SessionEvent::RoundLoaded { round }),
                Err(e) => {
                    tracing::error!(seq, "round fetch failed: {e}");
                    events.send(SessionEvent::RoundLoadFailed {
                        seq,
                        reason: e.to_string(),
                    });
                }
            }
        });
    }

    fn spawn_song_info_fetch(&self, seq: RoundSeq, song_id: i64, ann_song_id: i64) {
        let service = self.service.clone();
        let events = self.handle.clone();
        tokio::spawn(async move {
            match service.song_details(song_id, ann_song_id).await {
                Ok(details) => events.send(SessionEvent::SongInfoResolved { seq, details }),
                Err(e) => {
                    tracing::warn!(song_id, "song info fetch failed: {e}");
                    events.send(SessionEvent::ServiceError {
                        reason: e.to_string(),
                    });
                }
            }
        });
    }

    fn spawn_answer_report(&self, answer_time: Option<u32>) {
        let service = self.service.clone();
        let events = self.handle.clone();
        tokio::spawn(async move {
            if let Err(e) = service.report_answer(answer_time).await {
                tracing::error!("answer report failed: {e}");
                events.send(SessionEvent::ServiceError {
                    reason: e.to_string(),
                });
                return;
            }
            // The schedule moves after every reported answer.
            match service.schedule_stats().await {
                Ok(stats) => events.send(SessionEvent::ScheduleUpdated { stats }),
                Err(e) => tracing::warn!("schedule refresh failed: {e}"),
            }
        });
    }

    fn refresh_schedule(&self) {
        let service = self.service.clone();
        let events = self.handle.clone();
        tokio::spawn(async move {
            match service.schedule_stats().await {
                Ok(stats) => events.send(SessionEvent::ScheduleUpdated { stats }),
                Err(e) => tracing::warn!("schedule poll failed: {e}"),
            }
        });
    }
}
