use serde::{Deserialize, Serialize};

/// Session-monotonic round counter. Asynchronous completions (round fetches,
/// metadata enrichment) carry the seq they were issued for so stale results
/// can be detected and dropped.
pub type RoundSeq = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Playing,
    Reviewing,
}

/// One quiz question instance: a media clip plus its accepted-answer set.
/// Immutable for the lifetime of the round, replaced on advance.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub seq: RoundSeq,
    /// All equally valid correct answers; the first is canonical for display.
    pub accepted_answers: Vec<String>,
    pub media_url: String,
    pub ann_id: i64,
    pub song_id: i64,
    pub ann_song_id: i64,
}

impl Round {
    pub fn canonical_answer(&self) -> &str {
        self.accepted_answers.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongType {
    Unknown,
    Opening,
    Ending,
    Insert,
}

impl SongType {
    /// Wire encoding is an index into [unknown, OP, ED, INS].
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SongType::Unknown),
            1 => Some(SongType::Opening),
            2 => Some(SongType::Ending),
            3 => Some(SongType::Insert),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SongType::Unknown => "",
            SongType::Opening => "OP",
            SongType::Ending => "ED",
            SongType::Insert => "INS",
        }
    }
}

/// Extended per-song metadata resolved asynchronously during review.
#[derive(Debug, Clone, PartialEq)]
pub struct SongDetails {
    pub name: String,
    pub performer: String,
    pub song_type: SongType,
    /// 0 means the song carries no number suffix.
    pub number: u32,
}

impl SongDetails {
    /// Full reveal line: `"{canonical} | {performer} - {name} | {label}{number}"`,
    /// with the number omitted when it is 0.
    pub fn reveal_line(&self, canonical: &str) -> String {
        let number = if self.number == 0 {
            String::new()
        } else {
            self.number.to_string()
        };
        format!(
            "{} | {} - {} | {}{}",
            canonical,
            self.performer,
            self.name,
            self.song_type.label(),
            number
        )
    }
}

/// Spaced-repetition schedule counters, purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStats {
    pub cards_due: i64,
    pub new_cards: i64,
    pub total_cards: i64,
}

impl ScheduleStats {
    pub fn summary(&self) -> String {
        let undue_cards = self.total_cards - self.new_cards;
        format!(
            "Cards due: {} / {} | New Cards: {} / {}",
            self.cards_due, undue_cards, self.new_cards, self.total_cards
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_line_with_number() {
        let details = SongDetails {
            name: "Guren no Yumiya".to_string(),
            performer: "Linked Horizon".to_string(),
            song_type: SongType::Opening,
            number: 1,
        };
        assert_eq!(
            details.reveal_line("Attack on Titan"),
            "Attack on Titan | Linked Horizon - Guren no Yumiya | OP1"
        );
    }

    #[test]
    fn reveal_line_omits_zero_number() {
        let details = SongDetails {
            name: "Theme".to_string(),
            performer: "Band".to_string(),
            song_type: SongType::Insert,
            number: 0,
        };
        assert_eq!(details.reveal_line("Show"), "Show | Band - Theme | INS");
    }

    #[test]
    fn song_type_index_round_trip() {
        assert_eq!(SongType::from_index(1), Some(SongType::Opening));
        assert_eq!(SongType::from_index(3), Some(SongType::Insert));
        assert_eq!(SongType::from_index(4), None);
    }

    #[test]
    fn schedule_summary_format() {
        let stats = ScheduleStats {
            cards_due: 12,
            new_cards: 30,
            total_cards: 100,
        };
        assert_eq!(stats.summary(), "Cards due: 12 / 70 | New Cards: 30 / 100");
    }
}
