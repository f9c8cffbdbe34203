// src/services/mod.rs

//! Extraction rules and the crawler service built on them.

pub mod extract;
pub mod normalize;
pub mod patterns;
pub mod topics;

pub use extract::{
    RowSkip, TopListOutcome, TopListRow, TopicDetail, extract_detail, extract_top_list,
};
pub use topics::{DetailOutcome, TopicCrawler};
