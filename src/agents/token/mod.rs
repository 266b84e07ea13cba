//! Token estimation

mod counter;

pub use counter::TokenCounter;
