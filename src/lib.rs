//! Cold-start restaurant recommendations.
//!
//! A user names a few favorite restaurants; the [`recommender`] core turns them
//! into a pseudo-user, refits an SVD++ model over the historical ratings and
//! ranks the restaurants that user has not picked. The [`api`] module exposes
//! the core over HTTP together with the selection and survey flow.

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod middleware;
pub mod models;
pub mod recommender;
pub mod services;
