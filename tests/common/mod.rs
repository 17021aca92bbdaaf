#![allow(dead_code)]

use resto_rec::data::{read_ratings, LoadedRatings};
use resto_rec::recommender::{FitParams, RatingScale, RecommenderContext};

pub const RESTAURANTS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

/// Twenty users who all love D, shrug at E and dislike F
pub fn ratings_csv() -> String {
    let mut csv = String::from("User ID,Restaurant Name,User Rating\n");
    for user in 1..=20u32 {
        let rows = [
            ("A", 4 + user % 2),
            ("B", 3 + u32::from(user % 3 == 0)),
            ("C", 4),
            ("D", 5),
            ("E", 3 - user % 2),
            ("F", 1),
        ];
        for (name, rating) in rows {
            csv.push_str(&format!("{},{},{}.0\n", user, name, rating));
        }
    }
    csv
}

pub fn loaded() -> LoadedRatings {
    read_ratings(ratings_csv().as_bytes()).expect("fixture ratings parse")
}

pub fn params(seed: Option<u64>) -> FitParams {
    FitParams {
        n_factors: 10,
        n_epochs: 20,
        random_seed: seed,
        ..FitParams::default()
    }
}

pub fn context(seed: Option<u64>) -> RecommenderContext {
    let loaded = loaded();
    RecommenderContext::with_svdpp(
        loaded.dataset,
        loaded.encoder,
        RatingScale::default(),
        params(seed),
    )
    .expect("fixture context builds")
}
