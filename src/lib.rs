// src/lib.rs

//! trendwatch: trending-topic crawler with a bounded snapshot history.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
