//! Enhancer - expected cost of enhancing items.
//!
//! Models enhancement as an absorbing Markov chain over levels +0..+20,
//! solves it for expected attempts and protection uses, and prices the
//! result in time and coins. The `enhance` binary drives it from a JSON
//! scenario snapshot.

pub mod advisor;
pub mod config;
pub mod constants;
pub mod enhancement;
pub mod pricing;
pub mod report;
pub mod scenario;
