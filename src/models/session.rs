use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Recommendation;
use crate::error::{AppError, AppResult};

/// Highest satisfaction score the survey accepts
pub const MAX_SATISFACTION: u8 = 10;

/// Where a user is in the select → recommend → survey flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Selecting,
    Validating,
    Recommending,
    AwaitingFeedback,
    Submitted,
}

/// One pass through the recommendation form, kept in memory only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub state: SessionState,
    pub selected: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub satisfaction: Option<u8>,
    pub created_at: DateTime<Local>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session waiting for a selection
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Selecting,
            selected: Vec::new(),
            recommendations: Vec::new(),
            satisfaction: None,
            created_at: Local::now(),
        }
    }

    fn expect_state(&self, expected: SessionState, action: &str) -> AppResult<()> {
        if self.state != expected {
            return Err(AppError::InvalidTransition(format!(
                "cannot {} while {:?}",
                action, self.state
            )));
        }
        Ok(())
    }

    /// Selecting → Validating
    pub fn submit_selection(&mut self, favorites: Vec<String>) -> AppResult<()> {
        self.expect_state(SessionState::Selecting, "submit a selection")?;
        self.selected = favorites;
        self.recommendations.clear();
        self.state = SessionState::Validating;
        Ok(())
    }

    /// Validating → Recommending
    pub fn start_recommending(&mut self) -> AppResult<()> {
        self.expect_state(SessionState::Validating, "start recommending")?;
        self.state = SessionState::Recommending;
        Ok(())
    }

    /// Validating or Recommending → Selecting, so the user can pick again
    pub fn reject_selection(&mut self) -> AppResult<()> {
        match self.state {
            SessionState::Validating | SessionState::Recommending => {
                self.selected.clear();
                self.state = SessionState::Selecting;
                Ok(())
            }
            other => Err(AppError::InvalidTransition(format!(
                "cannot reject a selection while {:?}",
                other
            ))),
        }
    }

    /// Recommending → AwaitingFeedback
    pub fn show_recommendations(&mut self, recommendations: Vec<Recommendation>) -> AppResult<()> {
        self.expect_state(SessionState::Recommending, "show recommendations")?;
        self.recommendations = recommendations;
        self.state = SessionState::AwaitingFeedback;
        Ok(())
    }

    /// AwaitingFeedback → Submitted
    pub fn submit_feedback(&mut self, satisfaction: u8) -> AppResult<()> {
        self.expect_state(SessionState::AwaitingFeedback, "submit feedback")?;
        if satisfaction > MAX_SATISFACTION {
            return Err(AppError::InvalidInput(format!(
                "satisfaction must be between 0 and {}, got {}",
                MAX_SATISFACTION, satisfaction
            )));
        }
        self.satisfaction = Some(satisfaction);
        self.state = SessionState::Submitted;
        Ok(())
    }

    /// Submitted → AwaitingFeedback, when the answer could not be recorded
    pub fn reopen_feedback(&mut self) -> AppResult<()> {
        self.expect_state(SessionState::Submitted, "reopen feedback")?;
        self.satisfaction = None;
        self.state = SessionState::AwaitingFeedback;
        Ok(())
    }

    /// Whether the session was opened more than `ttl` before `now`
    pub fn is_expired(&self, now: DateTime<Local>, ttl: chrono::Duration) -> bool {
        now - self.created_at > ttl
    }

    pub fn recommended_names(&self) -> Vec<String> {
        self.recommendations.iter().map(|r| r.name.clone()).collect()
    }
}
