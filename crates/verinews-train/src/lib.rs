//! Verinews Train
//!
//! Command line front end for the training pipeline: train a model from two
//! labeled CSV files, inspect a saved artifact, or run a local prediction.

pub mod cli;
pub mod commands;
