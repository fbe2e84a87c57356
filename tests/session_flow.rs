//! End-to-end session flow against a mocked quiz service: the real runner,
//! timer and session wired to in-process collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use songdrill::autocomplete::AutocompleteIndex;
use songdrill::backend::{BackendResult, QuizService};
use songdrill::protocol::DisplayUpdate;
use songdrill::runner::{MediaPlayer, SessionHandle, SessionRunner, SessionView};
use songdrill::session::QuizSession;
use songdrill::types::{Round, RoundSeq, ScheduleStats, SongDetails, SongType};

struct MockService {
    reported: Mutex<Vec<Option<u32>>>,
    fetched_seqs: Mutex<Vec<RoundSeq>>,
}

impl MockService {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            reported: Mutex::new(Vec::new()),
            fetched_seqs: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl QuizService for MockService {
    async fn next_round(&self, seq: RoundSeq) -> BackendResult<Round> {
        self.fetched_seqs.lock().unwrap().push(seq);
        Ok(Round {
            seq,
            accepted_answers: vec!["Attack on Titan".to_string()],
            media_url: "https://media.example/clip.webm".to_string(),
            ann_id: 16498,
            song_id: 101,
            ann_song_id: 202,
        })
    }

    async fn song_details(&self, _song_id: i64, _ann_song_id: i64) -> BackendResult<SongDetails> {
        Ok(SongDetails {
            name: "Guren no Yumiya".to_string(),
            performer: "Linked Horizon".to_string(),
            song_type: SongType::Opening,
            number: 1,
        })
    }

    async fn schedule_stats(&self) -> BackendResult<ScheduleStats> {
        Ok(ScheduleStats {
            cards_due: 5,
            new_cards: 2,
            total_cards: 40,
        })
    }

    async fn report_answer(&self, answer_time: Option<u32>) -> BackendResult<()> {
        self.reported.lock().unwrap().push(answer_time);
        Ok(())
    }

    async fn catalog(&self) -> BackendResult<HashMap<String, Vec<String>>> {
        let mut catalog = HashMap::new();
        catalog.insert("16498".to_string(), vec!["Attack on Titan".to_string()]);
        Ok(catalog)
    }
}

/// Reports a fixed clip duration on load and immediate playback on seek,
/// like the console shell does.
struct ScriptedPlayer {
    handle: SessionHandle,
}

impl MediaPlayer for ScriptedPlayer {
    fn load(&mut self, _url: &str) {
        self.handle.media_loaded(90.0);
    }

    fn seek_and_play(&mut self, _position_secs: f64) {
        self.handle.media_started();
    }
}

#[derive(Clone, Default)]
struct RecordingView {
    updates: Arc<Mutex<Vec<DisplayUpdate>>>,
}

impl SessionView for RecordingView {
    fn apply(&mut self, update: &DisplayUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
}

impl RecordingView {
    fn snapshot(&self) -> Vec<DisplayUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

fn spawn_session(service: Arc<MockService>) -> (SessionHandle, RecordingView) {
    let mut catalog = HashMap::new();
    catalog.insert("16498".to_string(), vec!["Attack on Titan".to_string()]);
    let session = QuizSession::new(AutocompleteIndex::build(catalog), 20);

    let (handle, events_rx) = SessionHandle::channel();
    let view = RecordingView::default();
    let runner = SessionRunner::new(
        session,
        service,
        ScriptedPlayer {
            handle: handle.clone(),
        },
        view.clone(),
        handle.clone(),
        events_rx,
        Duration::from_secs(3600),
    );
    tokio::spawn(runner.run());
    (handle, view)
}

/// Yield until the recorded updates satisfy the predicate. Yielding keeps the
/// paused clock still, so round timers never fire while waiting.
async fn wait_for(view: &RecordingView, what: &str, pred: impl Fn(&[DisplayUpdate]) -> bool) {
    for _ in 0..10_000 {
        if pred(&view.snapshot()) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("timed out waiting for {what}: {:?}", view.snapshot());
}

#[tokio::test(start_paused = true)]
async fn full_round_cycle_with_correct_guess() {
    let service = MockService::new();
    let (handle, view) = spawn_session(service.clone());

    // Unpausing starts the first round; the scripted player drives it
    // straight through to Playing.
    handle.toggle_pause();
    wait_for(&view, "guess input to enable", |updates| {
        updates.contains(&DisplayUpdate::GuessEnabled(true))
    })
    .await;

    handle.input("attack on titan");
    wait_for(&view, "suggestions", |updates| {
        updates
            .iter()
            .any(|u| matches!(u, DisplayUpdate::Suggestions(titles) if !titles.is_empty()))
    })
    .await;

    handle.confirm();
    wait_for(&view, "guess evaluation", |updates| {
        updates.contains(&DisplayUpdate::MarkGuess { correct: true })
    })
    .await;

    // Metadata enrichment replaces the bare canonical title.
    wait_for(&view, "full reveal line", |updates| {
        updates.contains(&DisplayUpdate::Reveal(
            "Attack on Titan | Linked Horizon - Guren no Yumiya | OP1".to_string(),
        ))
    })
    .await;

    // No time passed on the paused clock, so a correct answer reports zero.
    assert_eq!(*service.reported.lock().unwrap(), vec![Some(0)]);

    // The schedule refresh that follows a reported answer reaches the view.
    wait_for(&view, "schedule update", |updates| {
        updates
            .iter()
            .any(|u| matches!(u, DisplayUpdate::Schedule(stats) if stats.cards_due == 5))
    })
    .await;

    // Manual advance fetches the next round.
    handle.advance();
    wait_for(&view, "second round", |_| {
        service.fetched_seqs.lock().unwrap().as_slice() == [1, 2]
    })
    .await;

    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn timer_expiry_reports_unanswered() {
    let service = MockService::new();
    let (handle, view) = spawn_session(service.clone());

    handle.toggle_pause();
    wait_for(&view, "guess input to enable", |updates| {
        updates.contains(&DisplayUpdate::GuessEnabled(true))
    })
    .await;

    // Let the paused clock run the 20s round timer out.
    loop {
        if view
            .snapshot()
            .contains(&DisplayUpdate::MarkGuess { correct: false })
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    assert_eq!(service.reported.lock().unwrap()[0], None);
    let updates = view.snapshot();
    assert!(updates.contains(&DisplayUpdate::Reveal("Attack on Titan".to_string())));
    assert!(updates.contains(&DisplayUpdate::CoverVisible(false)));

    handle.shutdown();
}
