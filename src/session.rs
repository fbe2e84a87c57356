//! The quiz session state machine.
//!
//! `QuizSession` owns all round-cycle state and performs no I/O of its own:
//! every external happening arrives as a [`SessionEvent`] and every side
//! effect leaves as a [`Command`] for the host shell to execute. Phases cycle
//! Loading -> Playing -> Reviewing -> Loading forever once started; Idle only
//! exists before the first start.

use rand::Rng;
use tokio::time::Instant;

use crate::answer;
use crate::autocomplete::{AutocompleteIndex, AutocompleteState};
use crate::protocol::{Command, DisplayUpdate, NavDirection, SessionEvent};
use crate::types::{Round, RoundSeq, SessionPhase, SongDetails};

pub struct QuizSession {
    phase: SessionPhase,
    round: Option<Round>,
    /// Bumped on every load; the stale-update guard for async completions.
    seq: RoundSeq,
    play_duration_secs: u32,
    index: AutocompleteIndex,
    suggestions: AutocompleteState,
    guess: String,
    /// Gates only the Reviewing auto-advance, never an in-flight cycle.
    paused: bool,
    /// Sole concurrency guard against duplicate concurrent round fetches.
    loading: bool,
    load_failed: bool,
    timer_active: bool,
    playing_since: Option<Instant>,
    start_offset_secs: f64,
}

impl QuizSession {
    /// Sessions begin idle and paused; the first unpause (or an explicit
    /// advance request) starts the first round.
    pub fn new(index: AutocompleteIndex, play_duration_secs: u32) -> Self {
        Self {
            phase: SessionPhase::Idle,
            round: None,
            seq: 0,
            play_duration_secs,
            index,
            suggestions: AutocompleteState::default(),
            guess: String::new(),
            paused: true,
            loading: false,
            load_failed: false,
            timer_active: false,
            playing_since: None,
            start_offset_secs: 0.0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Dispatch one event, returning the side-effect commands it produced.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        let mut cmds = Vec::new();
        match event {
            SessionEvent::PauseToggled => self.on_pause_toggled(&mut cmds),
            SessionEvent::AdvanceRequested => self.on_advance_requested(&mut cmds),
            SessionEvent::InputChanged { text } => self.on_input_changed(text, &mut cmds),
            SessionEvent::Navigate { dir } => self.on_navigate(dir, &mut cmds),
            SessionEvent::ConfirmPressed => self.on_confirm(&mut cmds),
            SessionEvent::TimerTick { remaining } => self.on_timer_tick(remaining, &mut cmds),
            SessionEvent::TimerExpired => self.on_timer_expired(&mut cmds),
            SessionEvent::RoundLoaded { round } => self.on_round_loaded(round, &mut cmds),
            SessionEvent::RoundLoadFailed { seq, reason } => {
                self.on_round_load_failed(seq, reason, &mut cmds)
            }
            SessionEvent::MediaLoaded { duration_secs } => {
                self.on_media_loaded(duration_secs, &mut cmds)
            }
            SessionEvent::MediaStarted => self.on_media_started(&mut cmds),
            SessionEvent::SongInfoResolved { seq, details } => {
                self.on_song_info(seq, details, &mut cmds)
            }
            SessionEvent::ScheduleUpdated { stats } => {
                cmds.push(Command::Display(DisplayUpdate::Schedule(stats)));
            }
            SessionEvent::ServiceError { reason } => {
                cmds.push(Command::Display(DisplayUpdate::Error(reason)));
            }
            SessionEvent::Shutdown => {}
        }
        cmds
    }

    fn on_pause_toggled(&mut self, cmds: &mut Vec<Command>) {
        self.paused = !self.paused;
        tracing::info!(paused = self.paused, "pause toggled");
        if self.paused {
            return;
        }
        match self.phase {
            SessionPhase::Idle => self.begin_loading(cmds),
            // Resume triggers the advance that expiry deferred while paused.
            SessionPhase::Reviewing if !self.timer_active => self.begin_loading(cmds),
            // A failed load is retried on resume as well.
            SessionPhase::Loading if self.load_failed => self.begin_loading(cmds),
            _ => {}
        }
    }

    fn on_advance_requested(&mut self, cmds: &mut Vec<Command>) {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Reviewing => self.begin_loading(cmds),
            SessionPhase::Loading if self.load_failed => self.begin_loading(cmds),
            _ => {}
        }
    }

    fn on_input_changed(&mut self, text: String, cmds: &mut Vec<Command>) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        self.guess = text;
        let matches = self.index.query(&self.guess);
        self.suggestions.set_matches(matches.clone());
        cmds.push(Command::Display(DisplayUpdate::Suggestions(matches)));
    }

    fn on_navigate(&mut self, dir: NavDirection, cmds: &mut Vec<Command>) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        let prev = self.suggestions.highlighted();
        if let Some(next) = self.suggestions.navigate(dir) {
            cmds.push(Command::Display(DisplayUpdate::Highlight { prev, next }));
        }
    }

    fn on_confirm(&mut self, cmds: &mut Vec<Command>) {
        match self.phase {
            SessionPhase::Playing => {
                // A highlighted suggestion overwrites the typed guess before
                // evaluation.
                if let Some(i) = self.suggestions.highlighted() {
                    if let Some(title) = self.suggestions.matches().get(i) {
                        self.guess = title.clone();
                        cmds.push(Command::Display(DisplayUpdate::GuessText(self.guess.clone())));
                    }
                }
                self.submit(false, cmds);
            }
            SessionPhase::Reviewing if !self.paused => self.begin_loading(cmds),
            _ => {}
        }
    }

    fn on_timer_tick(&mut self, remaining: u32, cmds: &mut Vec<Command>) {
        if self.timer_active {
            cmds.push(Command::Display(DisplayUpdate::Countdown(remaining)));
        }
    }

    fn on_timer_expired(&mut self, cmds: &mut Vec<Command>) {
        if !self.timer_active {
            return;
        }
        self.timer_active = false;
        match self.phase {
            // Expiry submits whatever is currently typed, not a forced blank.
            SessionPhase::Playing => self.submit(true, cmds),
            SessionPhase::Reviewing if !self.paused => self.begin_loading(cmds),
            // Paused: the advance is deferred until resume.
            _ => {}
        }
    }

    fn on_round_loaded(&mut self, round: Round, cmds: &mut Vec<Command>) {
        if !self.loading || round.seq != self.seq {
            tracing::debug!(seq = round.seq, "ignoring stale round load");
            return;
        }
        self.loading = false;
        tracing::info!(seq = round.seq, url = %round.media_url, "round loaded");
        cmds.push(Command::Display(DisplayUpdate::Countdown(
            self.play_duration_secs,
        )));
        cmds.push(Command::Display(DisplayUpdate::Reveal(String::new())));
        cmds.push(Command::Display(DisplayUpdate::CoverVisible(true)));
        cmds.push(Command::Display(DisplayUpdate::ClearGuess));
        cmds.push(Command::LoadMedia {
            url: round.media_url.clone(),
        });
        self.round = Some(round);
    }

    fn on_round_load_failed(&mut self, seq: RoundSeq, reason: String, cmds: &mut Vec<Command>) {
        if seq != self.seq {
            return;
        }
        self.loading = false;
        self.load_failed = true;
        tracing::error!(seq, %reason, "round load failed");
        cmds.push(Command::Display(DisplayUpdate::Error(reason)));
    }

    fn on_media_loaded(&mut self, duration_secs: f64, cmds: &mut Vec<Command>) {
        if self.phase != SessionPhase::Loading || self.round.is_none() || self.loading {
            return;
        }
        let span = (duration_secs - f64::from(self.play_duration_secs)).max(0.0);
        self.start_offset_secs = if span > 0.0 {
            rand::rng().random_range(0.0..span)
        } else {
            0.0
        };
        cmds.push(Command::SeekAndPlay {
            position_secs: self.start_offset_secs,
        });
    }

    fn on_media_started(&mut self, cmds: &mut Vec<Command>) {
        match self.phase {
            SessionPhase::Loading if self.round.is_some() && !self.loading => {
                self.phase = SessionPhase::Playing;
                self.playing_since = Some(Instant::now());
                self.guess.clear();
                self.suggestions.clear();
                cmds.push(Command::Display(DisplayUpdate::ClearGuess));
                cmds.push(Command::Display(DisplayUpdate::GuessEnabled(true)));
                cmds.push(Command::Display(DisplayUpdate::Suggestions(Vec::new())));
                cmds.push(Command::StartTimer {
                    seconds: self.play_duration_secs,
                });
                self.timer_active = true;
            }
            // Review replay began: run the review countdown, whose expiry is
            // the auto-advance trigger.
            SessionPhase::Reviewing => {
                cmds.push(Command::StartTimer {
                    seconds: self.play_duration_secs,
                });
                self.timer_active = true;
            }
            _ => {}
        }
    }

    fn on_song_info(&mut self, seq: RoundSeq, details: SongDetails, cmds: &mut Vec<Command>) {
        let current = self
            .round
            .as_ref()
            .is_some_and(|round| round.seq == seq && self.phase == SessionPhase::Reviewing);
        if !current {
            tracing::debug!(seq, "ignoring stale song info");
            return;
        }
        let line = self
            .round
            .as_ref()
            .map(|round| details.reveal_line(round.canonical_answer()))
            .unwrap_or_default();
        cmds.push(Command::Display(DisplayUpdate::Reveal(line)));
    }

    /// Playing -> Reviewing: evaluate the guess, report the outcome, reveal
    /// the canonical answer and replay the clip from its start offset. The
    /// full reveal line arrives later via `SongInfoResolved`.
    fn submit(&mut self, expired: bool, cmds: &mut Vec<Command>) {
        let Some(round) = self.round.as_ref() else {
            return;
        };
        if !expired && self.timer_active {
            cmds.push(Command::CancelTimer);
            self.timer_active = false;
        }

        let correct = answer::is_correct(&round.accepted_answers, &self.guess);
        let elapsed = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let answer_time = correct.then(|| elapsed.round() as u32);
        tracing::info!(
            correct,
            ?answer_time,
            answers = ?round.accepted_answers,
            "guess submitted"
        );

        let canonical = round.canonical_answer().to_string();
        let (seq, song_id, ann_song_id) = (round.seq, round.song_id, round.ann_song_id);

        self.phase = SessionPhase::Reviewing;
        self.suggestions.clear();
        cmds.push(Command::Display(DisplayUpdate::Suggestions(Vec::new())));
        cmds.push(Command::ReportAnswer { answer_time });
        cmds.push(Command::Display(DisplayUpdate::MarkGuess { correct }));
        cmds.push(Command::Display(DisplayUpdate::GuessEnabled(false)));
        cmds.push(Command::Display(DisplayUpdate::Reveal(canonical)));
        cmds.push(Command::Display(DisplayUpdate::CoverVisible(false)));
        cmds.push(Command::FetchSongInfo {
            seq,
            song_id,
            ann_song_id,
        });
        cmds.push(Command::SeekAndPlay {
            position_secs: self.start_offset_secs,
        });
    }

    /// Enter Loading: cancel any live timer, bump the seq and request the
    /// next round. No-op while a fetch is already in flight.
    fn begin_loading(&mut self, cmds: &mut Vec<Command>) {
        if self.loading {
            tracing::debug!("round load already in flight");
            return;
        }
        if self.timer_active {
            cmds.push(Command::CancelTimer);
            self.timer_active = false;
        }
        self.loading = true;
        self.load_failed = false;
        self.seq += 1;
        self.phase = SessionPhase::Loading;
        self.guess.clear();
        self.suggestions.clear();
        self.playing_since = None;
        cmds.push(Command::Display(DisplayUpdate::GuessEnabled(false)));
        cmds.push(Command::FetchRound { seq: self.seq });
    }
}
