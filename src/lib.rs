pub mod cli;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod flags;
pub mod logging;
pub mod network;
pub mod output;
pub mod rpc;
pub mod signer;
pub mod submit;
pub mod tx_builder;
pub mod units;

pub use error::{Error, Result};
