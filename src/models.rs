use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use uuid::Uuid;

/// Where a tournament is in its lifecycle.
///
/// Computed from the dates once, when the tournament is created. The store never recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[strum(to_string = "Ожидается")]
    Upcoming,
    #[strum(to_string = "В процессе")]
    InProgress,
    #[strum(to_string = "Завершен")]
    Finished,
}

impl TournamentStatus {
    /// Derives the status for a tournament running from `start` to `end` as seen on `today`.
    ///
    /// Both dates stand for midnight UTC, so a tournament counts as finished from the start of its
    /// end day. A one-day tournament is already finished on that day.
    pub fn from_dates(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        if today < start {
            TournamentStatus::Upcoming
        } else if today >= end {
            TournamentStatus::Finished
        } else {
            TournamentStatus::InProgress
        }
    }
}

/// A tournament as stored in the tournaments document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TournamentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl Tournament {
    /// The winner, but only once the tournament is over.
    pub fn displayed_winner(&self) -> Option<&str> {
        match self.status {
            TournamentStatus::Finished => self.winner.as_deref(),
            _ => None,
        }
    }
}

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates an id of the form `<unix millis>-<9 random base-36 digits>`.
pub fn generate_id() -> String {
    // The low bits of a v4 uuid are all random.
    let mut random = Uuid::new_v4().as_u128();
    let suffix: String = (0..9)
        .map(|_| {
            let digit = ID_ALPHABET[(random % 36) as usize] as char;
            random /= 36;
            digit
        })
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Why a draft could not be turned into a tournament.
#[derive(Debug, PartialEq, Eq)]
pub enum DraftError {
    MissingName,
    MissingStartDate,
}

impl std::fmt::Display for DraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftError::MissingName => write!(f, "A tournament needs a name."),
            DraftError::MissingStartDate => write!(f, "A tournament needs a start date."),
        }
    }
}

impl std::error::Error for DraftError {}

/// What an admin fills in when adding a tournament.
#[derive(Debug, Clone, Default)]
pub struct TournamentDraft {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TournamentDraft {
    /// Validates the draft and builds a new tournament with a fresh id.
    ///
    /// The end date falls back to the start date, and the status is derived relative to `today`.
    pub fn into_tournament(self, today: NaiveDate) -> Result<Tournament, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::MissingName);
        }
        let start_date = self.start_date.ok_or(DraftError::MissingStartDate)?;
        let end_date = self.end_date.unwrap_or(start_date);

        Ok(Tournament {
            id: generate_id(),
            name: name.to_string(),
            start_date,
            end_date,
            status: TournamentStatus::from_dates(start_date, end_date, today),
            description: None,
            participants: None,
            winner: None,
        })
    }
}
