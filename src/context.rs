// SPDX-License-Identifier: GPL-3.0-or-later

//! Evaluation session state.
//!
//! An [`EvalContext`] bundles everything the evaluation needs beyond the
//! position itself: the loaded network, the opened tablebases, the
//! user-visible options and the random number generator backing the
//! randomized evaluation. The search owns one context per thread.

use std::cmp::{max, min};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use thiserror::Error;

use evaluate;
use nnue;
use position::Position;
use tb;
use types::*;

/// Default network file name. The version embedded in the name is checked
/// against the file hash when the network is loaded.
pub const DEFAULT_EVAL_FILE: &str = "nn-62ef826d1a6d.nnue";

/// Options controlling the evaluation, mirroring the engine's UCI options.
#[derive(Clone, Debug)]
pub struct EvalOptions {
    /// Blend in the network evaluation when a network is loaded.
    pub use_nnue: bool,
    /// Name of the network file to load, searched for in the working
    /// directory and next to the binary.
    pub eval_file: String,
    /// Percentage of gaussian noise mixed into the evaluation, from 0
    /// (deterministic) to 100 (pure noise). Used to weaken the engine.
    pub random_eval_perturb: i32,
    /// Fixed seed for the noise generator. When `None` the generator is
    /// seeded from the system entropy source.
    pub random_eval_seed: Option<u64>,
    /// Artificial delay per evaluation in milliseconds. Another weakening
    /// device, limiting the effective search speed.
    pub waitms: u64,
    /// Positions will be set up with Chess960 castling rules.
    pub chess960: bool,
}

impl Default for EvalOptions {
    fn default() -> EvalOptions {
        EvalOptions {
            use_nnue: true,
            eval_file: String::from(DEFAULT_EVAL_FILE),
            random_eval_perturb: 10,
            random_eval_seed: None,
            waitms: 10,
            chess960: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RandomEvalPerturb must be between 0 and 100, got {0}")]
    PerturbOutOfRange(i32),
    #[error("invalid noise distribution: {0}")]
    Noise(#[from] rand_distr::NormalError),
}

/// Shared state of the evaluation functions.
pub struct EvalContext {
    options: EvalOptions,
    network: Option<nnue::Network>,
    tb: tb::Tablebases,
    rng: Option<StdRng>,
    noise: Normal<f64>,
}

impl EvalContext {
    /// Validates the options and loads the network. A missing or corrupt
    /// network file is not an error; the context falls back to the
    /// classical evaluation and logs the reason.
    pub fn new(options: EvalOptions) -> Result<EvalContext, ConfigError> {
        if options.random_eval_perturb < 0 || options.random_eval_perturb > 100
        {
            return Err(
                ConfigError::PerturbOutOfRange(options.random_eval_perturb));
        }

        let noise = Normal::new(0.0, f64::from(PawnValueEg.0))?;

        let network = if options.use_nnue {
            match nnue::load(&options.eval_file) {
                Ok(network) => {
                    info!("NNUE evaluation using {} enabled",
                        options.eval_file);
                    Some(network)
                }
                Err(e) => {
                    warn!("network file {} could not be loaded: {}",
                        options.eval_file, e);
                    warn!("falling back to the classical evaluation");
                    None
                }
            }
        } else {
            None
        };

        Ok(EvalContext {
            options: options,
            network: network,
            tb: tb::Tablebases::new(),
            rng: None,
            noise: noise,
        })
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn network(&self) -> Option<&nnue::Network> {
        self.network.as_ref()
    }

    pub fn tablebases(&self) -> &tb::Tablebases {
        &self.tb
    }

    pub fn tablebases_mut(&mut self) -> &mut tb::Tablebases {
        &mut self.tb
    }

    /// Returns a gaussian noise value with a standard deviation of one
    /// pawn, clamped to the range of non-tablebase scores. The generator
    /// is seeded on first use.
    pub fn random_bias(&mut self) -> Value {
        let seed = self.options.random_eval_seed;
        let rng = self.rng.get_or_insert_with(|| match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        });

        let bias = Value(rng.sample(self.noise) as i32);

        max(Value::TB_LOSS_IN_MAX_PLY + 1,
            min(Value::TB_WIN_IN_MAX_PLY - 1, bias))
    }

    /// Aborts the process when the network was requested but is absent.
    /// The driver calls this once before starting the search.
    pub fn verify(&self) {
        if self.options.use_nnue {
            nnue::verify(&self.options.eval_file, self.network.is_some());
        }
    }

    /// Evaluates the position with the settings of this context.
    pub fn evaluate(&mut self, pos: &mut Position) -> Value {
        evaluate::evaluate(pos, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perturb_must_be_a_percentage() {
        let mut options = EvalOptions::default();
        options.use_nnue = false;

        options.random_eval_perturb = 101;
        assert!(EvalContext::new(options.clone()).is_err());

        options.random_eval_perturb = -1;
        assert!(EvalContext::new(options.clone()).is_err());

        options.random_eval_perturb = 0;
        assert!(EvalContext::new(options).is_ok());
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let mut options = EvalOptions::default();
        options.use_nnue = false;
        options.random_eval_seed = Some(42);

        let mut a = EvalContext::new(options.clone()).unwrap();
        let mut b = EvalContext::new(options).unwrap();

        for _ in 0..16 {
            assert_eq!(a.random_bias(), b.random_bias());
        }
    }

    #[test]
    fn noise_stays_out_of_the_tablebase_range() {
        let mut options = EvalOptions::default();
        options.use_nnue = false;
        let mut ctx = EvalContext::new(options).unwrap();

        for _ in 0..256 {
            let v = ctx.random_bias();
            assert!(v > Value::TB_LOSS_IN_MAX_PLY);
            assert!(v < Value::TB_WIN_IN_MAX_PLY);
        }
    }
}
