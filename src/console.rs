//! Line-oriented terminal shell around the session core.
//!
//! The console cannot decode media, so its player only simulates the playback
//! lifecycle: loading a clip immediately reports a configurable assumed
//! duration, and seeking immediately reports playback start.

use crate::protocol::DisplayUpdate;
use crate::runner::{MediaPlayer, SessionHandle, SessionView};

pub struct ConsolePlayer {
    handle: SessionHandle,
    assumed_duration_secs: f64,
}

impl ConsolePlayer {
    pub fn new(handle: SessionHandle, assumed_duration_secs: f64) -> Self {
        Self {
            handle,
            assumed_duration_secs,
        }
    }
}

impl MediaPlayer for ConsolePlayer {
    fn load(&mut self, url: &str) {
        println!("[media] loading {url}");
        self.handle.media_loaded(self.assumed_duration_secs);
    }

    fn seek_and_play(&mut self, position_secs: f64) {
        println!("[media] playing from {position_secs:.1}s");
        self.handle.media_started();
    }
}

#[derive(Default)]
pub struct ConsoleView {
    last_countdown: Option<u32>,
}

impl SessionView for ConsoleView {
    fn apply(&mut self, update: &DisplayUpdate) {
        match update {
            DisplayUpdate::Countdown(remaining) => {
                // Ticks arrive sub-second; only whole-second changes print.
                if self.last_countdown != Some(*remaining) {
                    self.last_countdown = Some(*remaining);
                    println!("[timer] {remaining}s");
                }
            }
            DisplayUpdate::Suggestions(titles) => {
                for (i, title) in titles.iter().enumerate() {
                    println!("  {i}: {title}");
                }
            }
            DisplayUpdate::Highlight { next, .. } => println!("[pick] {next}"),
            DisplayUpdate::GuessText(text) => println!("[guess] {text}"),
            DisplayUpdate::MarkGuess { correct } => {
                if *correct {
                    println!("[result] correct!");
                } else {
                    println!("[result] wrong");
                }
            }
            DisplayUpdate::Reveal(text) => {
                if !text.is_empty() {
                    println!("[answer] {text}");
                }
            }
            DisplayUpdate::Schedule(stats) => println!("[schedule] {}", stats.summary()),
            DisplayUpdate::Error(msg) => eprintln!("[error] {msg}"),
            DisplayUpdate::ClearGuess
            | DisplayUpdate::GuessEnabled(_)
            | DisplayUpdate::CoverVisible(_) => {}
        }
    }
}

/// Map one stdin line to session events: `/p` toggles pause, `/n` advances,
/// `/q` quits, a `?` prefix previews suggestions without submitting, and
/// anything else is submitted as a guess.
pub fn dispatch_line(handle: &SessionHandle, line: &str) {
    let line = line.trim();
    match line {
        "/p" => handle.toggle_pause(),
        "/n" => handle.advance(),
        "/q" => handle.shutdown(),
        _ if line.starts_with('?') => handle.input(line[1..].trim_start()),
        _ => {
            handle.input(line);
            handle.confirm();
        }
    }
}
