mod bid;
mod config;
mod constants;
mod identity;
mod stats;

pub use bid::*;
pub use config::*;
pub use constants::*;
pub use identity::*;
pub use stats::*;
