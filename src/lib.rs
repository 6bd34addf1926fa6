// SPDX-License-Identifier: GPL-3.0-or-later

//! Evaluation core of the Rustfish chess engine.
//!
//! This crate bundles the three position assessment components of the
//! engine: the classical hand-crafted evaluation, the NNUE evaluation
//! with its incrementally updated accumulator, and the Syzygy tablebase
//! prober. The search and the UCI front end live elsewhere; they drive
//! this crate through [`EvalContext`] and [`Position`].
//!
//! Call [`init`] once before creating any [`Position`].

extern crate memmap;
#[macro_use]
extern crate log;
extern crate rand;
extern crate rand_distr;
extern crate thiserror;

pub mod bitbases;
pub mod bitboard;
pub mod context;
pub mod endgame;
pub mod evaluate;
pub mod material;
pub mod misc;
pub mod movegen;
pub mod nnue;
pub mod pawns;
pub mod position;
pub mod psqt;
pub mod tb;
pub mod types;

pub use context::{ConfigError, EvalContext, EvalOptions};
pub use position::Position;

use std::sync::Once;

static INIT: Once = Once::new();

// init() computes the various global lookup tables. It has to run before
// the first Position is set up and is idempotent afterwards.
pub fn init() {
    INIT.call_once(|| {
        psqt::init();
        bitboard::init();
        position::zobrist::init();
        bitbases::init();
        endgame::init();
    });
}

#[cfg(test)]
fn init_for_tests() {
    init();
}
