use serde::Deserialize;

use crate::recommender::{FitParams, RatingScale};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// CSV file with `User ID`, `Restaurant Name` and `User Rating` columns
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Append-only CSV file receiving one row per submitted survey
    #[serde(default = "default_feedback_log_path")]
    pub feedback_log_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Latent factors of the SVD++ model
    #[serde(default = "default_n_factors")]
    pub n_factors: usize,

    /// SGD passes over the augmented dataset
    #[serde(default = "default_n_epochs")]
    pub n_epochs: usize,

    #[serde(default = "default_lr_all")]
    pub lr_all: f64,

    #[serde(default = "default_reg_all")]
    pub reg_all: f64,

    #[serde(default = "default_init_std_dev")]
    pub init_std_dev: f64,

    #[serde(default = "default_rating_min")]
    pub rating_min: f64,

    #[serde(default = "default_rating_max")]
    pub rating_max: f64,

    /// Pins model initialisation and update order; leave unset in production
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Number of recommendations returned when the caller does not ask for a count
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Upper bound on a single recommendation request, fit included
    #[serde(default = "default_fit_timeout_secs")]
    pub fit_timeout_secs: u64,

    /// Sessions older than this are dropped, answered or not
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_ratings_path() -> String {
    "data/final_processed_data.csv".to_string()
}

fn default_feedback_log_path() -> String {
    "data/feedback_log.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_n_factors() -> usize {
    200
}

fn default_n_epochs() -> usize {
    20
}

fn default_lr_all() -> f64 {
    0.007
}

fn default_reg_all() -> f64 {
    0.02
}

fn default_init_std_dev() -> f64 {
    0.1
}

fn default_rating_min() -> f64 {
    1.0
}

fn default_rating_max() -> f64 {
    5.0
}

fn default_k() -> usize {
    10
}

fn default_fit_timeout_secs() -> u64 {
    60
}

fn default_session_ttl_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Rating scale declared for the trainset
    pub fn rating_scale(&self) -> RatingScale {
        RatingScale::new(self.rating_min, self.rating_max)
    }

    /// Hyperparameters for every per-request fit
    pub fn fit_params(&self) -> FitParams {
        FitParams {
            n_factors: self.n_factors,
            n_epochs: self.n_epochs,
            lr_all: self.lr_all,
            reg_all: self.reg_all,
            init_mean: 0.0,
            init_std_dev: self.init_std_dev,
            random_seed: self.random_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_environment() {
        let vars: Vec<(String, String)> = vec![];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.n_factors, 200);
        assert_eq!(config.n_epochs, 20);
        assert_eq!(config.default_k, 10);
        assert_eq!(config.random_seed, None);
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.rating_scale(), RatingScale::new(1.0, 5.0));
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("N_FACTORS".to_string(), "8".to_string()),
            ("RANDOM_SEED".to_string(), "42".to_string()),
            ("FEEDBACK_LOG_PATH".to_string(), "/tmp/log.csv".to_string()),
            ("SESSION_TTL_SECS".to_string(), "120".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        let params = config.fit_params();
        assert_eq!(params.n_factors, 8);
        assert_eq!(params.random_seed, Some(42));
        assert_eq!(config.feedback_log_path, "/tmp/log.csv");
        assert_eq!(config.session_ttl_secs, 120);
    }
}
