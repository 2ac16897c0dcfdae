//! `iterion` - command-line front end for `iterion-lib`
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Layered YAML configuration
//! - [`format`] - Output formatting (text, JSON)
//! - [`logging`] - tracing subscriber setup
//!
//! Everything domain-related (store, metrics, discovery, assistant) lives
//! in `iterion-lib` and is re-exported as [`core`].

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod format;
pub mod logging;

pub use iterion_lib as core;
pub use iterion_lib::{IterionError, Result};
