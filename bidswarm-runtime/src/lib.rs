pub mod runtime;

pub use crate::runtime::{BidswarmCli, BidswarmRuntime};
