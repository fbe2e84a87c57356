use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{BackendError, BackendResult, QuizService};
use crate::config::Config;
use crate::types::{Round, RoundSeq, ScheduleStats, SongDetails, SongType};

/// JSON-over-HTTP implementation of [`QuizService`].
pub struct HttpService {
    client: reqwest::Client,
    base_url: String,
    media_base_url: String,
}

impl HttpService {
    pub fn new(config: &Config) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let mut media_base_url = config.media_base_url.clone();
        if !media_base_url.ends_with('/') {
            media_base_url.push('/');
        }
        Ok(Self {
            client,
            base_url: config.service_base_url.trim_end_matches('/').to_string(),
            media_base_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct NextRoundResponse {
    song: WireSong,
    answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSong {
    file_name: Option<String>,
    file_name_map: Option<HashMap<String, String>>,
    ann_id: i64,
    song_id: i64,
    ann_song_id: i64,
}

#[derive(Debug, Deserialize)]
struct WireSongInfo {
    name: String,
    artist: Option<WireNamed>,
    group: Option<WireNamed>,
}

#[derive(Debug, Deserialize)]
struct WireNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireAnnSongInfo {
    #[serde(rename = "type")]
    song_type: usize,
    number: u32,
}

#[derive(Debug, Serialize)]
struct AnswerReport {
    answer_time: Option<u32>,
}

/// Prefer the "720" rendition, then "480", then the unqualified file name.
fn media_file(song: &WireSong) -> BackendResult<&str> {
    if let Some(map) = &song.file_name_map {
        if let Some(name) = map.get("720") {
            return Ok(name);
        }
        if let Some(name) = map.get("480") {
            return Ok(name);
        }
    }
    song.file_name
        .as_deref()
        .ok_or_else(|| BackendError::Malformed("song carries no media file name".to_string()))
}

fn details_from_wire(info: WireSongInfo, ann: WireAnnSongInfo) -> BackendResult<SongDetails> {
    // Artist and group are mutually exclusive; artist wins if both appear.
    let performer = info
        .artist
        .or(info.group)
        .map(|named| named.name)
        .ok_or_else(|| {
            BackendError::Malformed("song info names neither artist nor group".to_string())
        })?;
    let song_type = SongType::from_index(ann.song_type).ok_or_else(|| {
        BackendError::Malformed(format!("unknown song type index {}", ann.song_type))
    })?;
    Ok(SongDetails {
        name: info.name,
        performer,
        song_type,
        number: ann.number,
    })
}

#[async_trait]
impl QuizService for HttpService {
    async fn next_round(&self, seq: RoundSeq) -> BackendResult<Round> {
        let response: NextRoundResponse = self.get_json("next-round").await?;
        let file = media_file(&response.song)?;
        Ok(Round {
            seq,
            media_url: format!("{}{}", self.media_base_url, file),
            accepted_answers: response.answers,
            ann_id: response.song.ann_id,
            song_id: response.song.song_id,
            ann_song_id: response.song.ann_song_id,
        })
    }

    async fn song_details(&self, song_id: i64, ann_song_id: i64) -> BackendResult<SongDetails> {
        let (info, ann) = futures::future::try_join(
            self.get_json::<WireSongInfo>(&format!("song-info/{song_id}")),
            self.get_json::<WireAnnSongInfo>(&format!("ann-song-info/{ann_song_id}")),
        )
        .await?;
        details_from_wire(info, ann)
    }

    async fn schedule_stats(&self) -> BackendResult<ScheduleStats> {
        self.get_json("schedule-info").await
    }

    async fn report_answer(&self, answer_time: Option<u32>) -> BackendResult<()> {
        let url = format!("{}/answer", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AnswerReport { answer_time })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }
        Ok(())
    }

    async fn catalog(&self) -> BackendResult<HashMap<String, Vec<String>>> {
        self.get_json("catalog").await
    }
}
