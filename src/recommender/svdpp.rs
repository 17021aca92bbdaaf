//! SVD++ latent-factor model trained with stochastic gradient descent.
//!
//! The estimate for user `u` and item `i` is
//!
//! ```text
//! r̂ = μ + b_u + b_i + q_iᵀ (p_u + |N(u)|^-½ Σ_{j ∈ N(u)} y_j)
//! ```
//!
//! where `N(u)` is the set of items `u` rated. The `y_j` vectors carry the
//! implicit signal of *which* items a user rated, independent of the value.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::dataset::UserId;
use super::encoder::RestaurantId;
use super::model::{ModelFitter, RatingPredictor};
use super::trainset::{RatingScale, Trainset};
use crate::error::{AppError, AppResult};

/// Hyperparameters of a single SVD++ fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    pub n_factors: usize,
    pub n_epochs: usize,
    /// Learning rate shared by biases, factors and implicit vectors
    pub lr_all: f64,
    /// Regularization shared by biases, factors and implicit vectors
    pub reg_all: f64,
    pub init_mean: f64,
    pub init_std_dev: f64,
    /// `None` draws a fresh seed from the OS on every fit
    pub random_seed: Option<u64>,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            n_factors: 200,
            n_epochs: 20,
            lr_all: 0.007,
            reg_all: 0.02,
            init_mean: 0.0,
            init_std_dev: 0.1,
            random_seed: None,
        }
    }
}

impl FitParams {
    fn validate(&self) -> AppResult<()> {
        if self.n_factors == 0 {
            return Err(AppError::FitFailure("n_factors must be positive".to_string()));
        }
        let finite = [self.lr_all, self.reg_all, self.init_mean, self.init_std_dev]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.lr_all <= 0.0 || self.reg_all < 0.0 || self.init_std_dev < 0.0 {
            return Err(AppError::FitFailure(format!(
                "invalid hyperparameters: {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// Fitted SVD++ parameters
#[derive(Debug, Clone)]
pub struct SvdPlusPlus {
    n_factors: usize,
    scale: RatingScale,
    global_mean: f64,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<RestaurantId, usize>,
    bu: Vec<f64>,
    bi: Vec<f64>,
    pu: Vec<f64>,
    qi: Vec<f64>,
    /// Per user `|N(u)|^-½ Σ y_j`, cached after training
    implicit: Vec<f64>,
}

impl SvdPlusPlus {
    /// Trains from scratch; `cancel` is checked before every epoch
    pub fn fit(trainset: &Trainset, params: &FitParams, cancel: &AtomicBool) -> AppResult<Self> {
        params.validate()?;

        let f = params.n_factors;
        let n_users = trainset.n_users();
        let n_items = trainset.n_items();

        let mut rng = match params.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut bu = vec![0.0; n_users];
        let mut bi = vec![0.0; n_items];
        let mut pu = normal(n_users * f, params.init_mean, params.init_std_dev, &mut rng);
        let mut qi = normal(n_items * f, params.init_mean, params.init_std_dev, &mut rng);
        let mut yj = normal(n_items * f, params.init_mean, params.init_std_dev, &mut rng);

        let rated: Vec<Vec<usize>> = (0..n_users)
            .map(|u| trainset.user_ratings(u).iter().map(|&(i, _)| i).collect())
            .collect();

        let mu = trainset.global_mean();
        let lr = params.lr_all;
        let reg = params.reg_all;
        let all_ratings = trainset.all_ratings();
        let mut order: Vec<usize> = (0..all_ratings.len()).collect();
        let mut u_impl = vec![0.0; f];

        for epoch in 0..params.n_epochs {
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!(epoch, "SVD++ fit cancelled");
                return Err(AppError::FitFailure(format!(
                    "fit cancelled before epoch {}",
                    epoch
                )));
            }
            order.shuffle(&mut rng);
            let mut sq_err = 0.0;

            for &idx in &order {
                let (u, i, r) = all_ratings[idx];
                let items = &rated[u];
                let sqrt_n = (items.len() as f64).sqrt();

                implicit_sum(&yj, items, f, &mut u_impl);

                let p = u * f;
                let q = i * f;
                let dot: f64 = (0..f).map(|k| qi[q + k] * (pu[p + k] + u_impl[k])).sum();
                let err = r - (mu + bu[u] + bi[i] + dot);
                sq_err += err * err;

                let (bu_u, bi_i) = (bu[u], bi[i]);
                bu[u] = bu_u + lr * (err - reg * bu_u);
                bi[i] = bi_i + lr * (err - reg * bi_i);

                for k in 0..f {
                    let puf = pu[p + k];
                    let qif = qi[q + k];
                    pu[p + k] += lr * (err * qif - reg * puf);
                    qi[q + k] += lr * (err * (puf + u_impl[k]) - reg * qif);
                    for &j in items {
                        let y = &mut yj[j * f + k];
                        *y += lr * (err * qif / sqrt_n - reg * *y);
                    }
                }
            }

            tracing::trace!(
                epoch,
                rmse = (sq_err / all_ratings.len().max(1) as f64).sqrt(),
                "SVD++ epoch finished"
            );
        }

        let mut implicit = vec![0.0; n_users * f];
        for (u, items) in rated.iter().enumerate() {
            implicit_sum(&yj, items, f, &mut implicit[u * f..(u + 1) * f]);
        }

        let diverged = bu
            .iter()
            .chain(&bi)
            .chain(&pu)
            .chain(&qi)
            .chain(&implicit)
            .any(|v| !v.is_finite());
        if diverged {
            return Err(AppError::FitFailure(
                "training diverged to non-finite parameters".to_string(),
            ));
        }

        Ok(Self {
            n_factors: f,
            scale: trainset.scale(),
            global_mean: mu,
            user_index: trainset.user_index().clone(),
            item_index: trainset.item_index().clone(),
            bu,
            bi,
            pu,
            qi,
            implicit,
        })
    }

    /// Estimate before clipping; unknown users or items fall back to the biases
    /// that are known.
    pub fn raw_estimate(&self, user_id: UserId, restaurant_id: RestaurantId) -> f64 {
        let user = self.user_index.get(&user_id).copied();
        let item = self.item_index.get(&restaurant_id).copied();
        let f = self.n_factors;

        let mut est = self.global_mean;
        if let Some(u) = user {
            est += self.bu[u];
        }
        if let Some(i) = item {
            est += self.bi[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            est += (0..f)
                .map(|k| self.qi[i * f + k] * (self.pu[u * f + k] + self.implicit[u * f + k]))
                .sum::<f64>();
        }
        est
    }
}

impl RatingPredictor for SvdPlusPlus {
    fn predict(&self, user_id: UserId, restaurant_id: RestaurantId) -> f64 {
        self.scale.clip(self.raw_estimate(user_id, restaurant_id))
    }
}

/// Fitter handing out a new [`SvdPlusPlus`] for every trainset
#[derive(Debug, Clone, Default)]
pub struct SvdPlusPlusFitter {
    params: FitParams,
}

impl SvdPlusPlusFitter {
    pub fn new(params: FitParams) -> Self {
        Self { params }
    }
}

impl ModelFitter for SvdPlusPlusFitter {
    fn fit(
        &self,
        trainset: &Trainset,
        cancel: &AtomicBool,
    ) -> AppResult<Box<dyn RatingPredictor>> {
        Ok(Box::new(SvdPlusPlus::fit(trainset, &self.params, cancel)?))
    }

    fn name(&self) -> &'static str {
        "svdpp"
    }
}

/// `|N(u)|^-½ Σ y_j` written into `out`
fn implicit_sum(yj: &[f64], items: &[usize], f: usize, out: &mut [f64]) {
    out.iter_mut().for_each(|v| *v = 0.0);
    if items.is_empty() {
        return;
    }
    for &j in items {
        for (acc, y) in out.iter_mut().zip(&yj[j * f..(j + 1) * f]) {
            *acc += y;
        }
    }
    let norm = (items.len() as f64).sqrt();
    out.iter_mut().for_each(|v| *v /= norm);
}

/// Samples `n` values from N(mean, std) via Box-Muller
fn normal(n: usize, mean: f64, std: f64, rng: &mut StdRng) -> Vec<f64> {
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mean + std * z
        })
        .collect()
}
