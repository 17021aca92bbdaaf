pub mod loader;

pub use loader::{load_ratings, read_ratings, LoadedRatings};
