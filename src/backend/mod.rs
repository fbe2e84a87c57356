//! Client side of the external quiz service.

mod http;

pub use http::HttpService;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::{Round, RoundSeq, ScheduleStats, SongDetails};

pub type BackendResult<T> = Result<T, BackendError>;

/// Failures talking to the quiz service. There is no retry logic anywhere;
/// callers surface these to the user and malformed responses fail fast.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The external quiz service contract. Implemented over HTTP in production
/// and mocked in tests.
#[async_trait]
pub trait QuizService: Send + Sync {
    /// Fetch the next round; `seq` is stamped onto the result so the session
    /// can discard stale completions.
    async fn next_round(&self, seq: RoundSeq) -> BackendResult<Round>;

    /// Resolve extended per-song metadata for the reveal line.
    async fn song_details(&self, song_id: i64, ann_song_id: i64) -> BackendResult<SongDetails>;

    async fn schedule_stats(&self) -> BackendResult<ScheduleStats>;

    /// `Some(elapsed)` for a correct guess, `None` for incorrect/unanswered.
    async fn report_answer(&self, answer_time: Option<u32>) -> BackendResult<()>;

    /// Group key -> title strings; the autocomplete universe.
    async fn catalog(&self) -> BackendResult<HashMap<String, Vec<String>>>;
}
