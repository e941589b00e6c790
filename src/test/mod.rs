mod config;
pub mod utils;

pub use utils::*;
