pub mod feedback;
pub mod recommendations;

pub use feedback::{CsvFeedbackLog, FeedbackSink};
pub use recommendations::RecommendationService;
