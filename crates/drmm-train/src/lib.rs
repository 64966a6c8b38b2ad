//! Command-line trainer for the Deep Relevance Matching Model.

pub mod config;
pub mod pipeline;
