use serde::{Deserialize, Serialize};

pub mod session;

pub use session::{Session, SessionState};

/// A recommended restaurant with the rating the model expects the user to give it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub name: String,
    pub predicted_rating: f64,
}

/// Request body for a recommendation run
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    /// Names of 3 to 5 favorite restaurants
    pub favorites: Vec<String>,
    /// Number of recommendations wanted; server default when absent
    #[serde(default)]
    pub k: Option<usize>,
}

/// Ranked recommendations, best first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub favorites: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

/// Survey answer submitted after recommendations were shown
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    /// Satisfaction on a 0 to 10 scale
    pub satisfaction: u8,
}

/// One row of the feedback log
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEntry {
    pub submitted_at: chrono::DateTime<chrono::Local>,
    pub selected: Vec<String>,
    pub recommended: Vec<String>,
    pub satisfaction: u8,
}

/// The restaurant catalog offered to the selection form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub restaurants: Vec<String>,
}
