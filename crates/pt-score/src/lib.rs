//! Score bytecode for the playtune interpreter.
//!
//! Defines the command set, its byte encoding, and tools for checking and
//! building scores. The interpreter in `pt-engine` consumes scores; format
//! loaders produce them.
//!
//! Designed to be `no_std` compatible; the builder needs the `alloc` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod analysis;
#[cfg(feature = "alloc")]
mod builder;
mod command;
mod error;
mod score;

pub use analysis::{analyze, ScoreSummary};
#[cfg(feature = "alloc")]
pub use builder::ScoreBuilder;
pub use command::{decode, opcodes, Command, MAX_CHANNEL, MAX_NOTE, MAX_WAIT_MS};
pub use error::{DecodeError, ScoreError};
pub use score::{Commands, Score};
