//! Events into and commands out of the quiz session state machine.
//!
//! The session itself performs no I/O: the embedding shell feeds it
//! `SessionEvent`s and executes the `Command`s it returns. Display-only
//! effects are grouped under `DisplayUpdate` so a frontend can handle them
//! uniformly.

use crate::types::{Round, RoundSeq, ScheduleStats, SongDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User toggled the session-level pause flag.
    PauseToggled,
    /// Explicit advance/retry request, independent of the pause flag.
    AdvanceRequested,
    /// Guess input text changed.
    InputChanged { text: String },
    /// Keyboard navigation through the suggestion list.
    Navigate { dir: NavDirection },
    /// Confirm action (Enter): submit during Playing, advance during Reviewing.
    ConfirmPressed,
    TimerTick { remaining: u32 },
    TimerExpired,
    /// Round fetch completed.
    RoundLoaded { round: Round },
    RoundLoadFailed { seq: RoundSeq, reason: String },
    /// Media metadata is available; playback can be positioned.
    MediaLoaded { duration_secs: f64 },
    /// Media playback actually began (after a seek).
    MediaStarted,
    /// Fire-and-forget metadata enrichment resolved.
    SongInfoResolved { seq: RoundSeq, details: SongDetails },
    ScheduleUpdated { stats: ScheduleStats },
    /// Non-fatal backend failure to surface to the user.
    ServiceError { reason: String },
    /// Dispose the session; consumed by the runner, never by the session.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchRound {
        seq: RoundSeq,
    },
    LoadMedia {
        url: String,
    },
    SeekAndPlay {
        position_secs: f64,
    },
    StartTimer {
        seconds: u32,
    },
    CancelTimer,
    /// Report the round outcome: `Some(elapsed)` for a correct guess,
    /// `None` for incorrect or unanswered.
    ReportAnswer {
        answer_time: Option<u32>,
    },
    FetchSongInfo {
        seq: RoundSeq,
        song_id: i64,
        ann_song_id: i64,
    },
    Display(DisplayUpdate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUpdate {
    Countdown(u32),
    Suggestions(Vec<String>),
    /// Highlight moved; only the previous and new entries change.
    Highlight { prev: Option<usize>, next: usize },
    GuessText(String),
    ClearGuess,
    GuessEnabled(bool),
    MarkGuess { correct: bool },
    Reveal(String),
    CoverVisible(bool),
    Schedule(ScheduleStats),
    Error(String),
}
