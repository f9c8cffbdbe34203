// src/services/extract.rs

//! Two-stage extraction: ranking rows, then a topic's detail page.
//!
//! Both stages take normalized markup. A row or post that does not fit the
//! expected shape is skipped on its own; it never discards its neighbors.

use regex::Captures;
use thiserror::Error;

use crate::models::{Post, SourceConfig, TopicEntry, upsert};

use super::normalize::{clean_text, extract_images, extract_source_time, extract_videos};
use super::patterns::{DETAIL_TOTAL, FEED_POST, LABEL_ICON, TOP_ROW, TOPIC_QUERY};

/// Why a ranking row was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowSkip {
    #[error("unparseable rank {raw:?}")]
    Rank { raw: String },

    #[error("rank {rank}: no topic query in link {raw:?}")]
    MissingName { rank: u32, raw: String },

    #[error("rank {rank}: topic query {raw:?} decodes to an empty name")]
    EmptyName { rank: u32, raw: String },

    #[error("rank {rank} ({name}): unparseable engagement number {raw:?}")]
    Number { rank: u32, name: String, raw: String },
}

/// A ranking row ready for its detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopListRow {
    /// Entry without detail content
    pub entry: TopicEntry,
    /// Topic name as it appears in URLs
    pub encoded_name: String,
}

/// Result of the ranking stage.
#[derive(Debug, Default)]
pub struct TopListOutcome {
    /// Rows within the topic limit, in page order
    pub rows: Vec<TopListRow>,
    /// Rows dropped because they did not parse
    pub skipped: Vec<RowSkip>,
    /// Rows dropped because their rank exceeds the topic limit
    pub beyond_limit: usize,
}

/// Extract ranking rows, keeping those ranked within `source.topic_limit`.
pub fn extract_top_list(markup: &str, source: &SourceConfig) -> TopListOutcome {
    let mut outcome = TopListOutcome::default();

    for caps in TOP_ROW.captures_iter(markup) {
        match parse_row(&caps, source) {
            Ok(Some(row)) => outcome.rows.push(row),
            Ok(None) => outcome.beyond_limit += 1,
            Err(skip) => {
                log::warn!("Skipping ranking row: {skip} (row: {})", &caps[0]);
                outcome.skipped.push(skip);
            }
        }
    }

    if outcome.rows.is_empty() && outcome.skipped.is_empty() && outcome.beyond_limit == 0 {
        log::warn!("No ranking rows matched; the page layout may have changed");
    }
    outcome
}

/// Parse one row; `Ok(None)` means the row is ranked past the limit.
fn parse_row(caps: &Captures<'_>, source: &SourceConfig) -> Result<Option<TopListRow>, RowSkip> {
    let raw_rank = &caps["rank"];
    let rank = raw_rank
        .parse::<u32>()
        .ok()
        .filter(|rank| *rank > 0)
        .ok_or_else(|| RowSkip::Rank {
            raw: raw_rank.to_string(),
        })?;

    let link = &caps["link"];
    let encoded_name = TOPIC_QUERY
        .captures(link)
        .map(|q| q["query"].to_string())
        .ok_or_else(|| RowSkip::MissingName {
            rank,
            raw: link.to_string(),
        })?;
    // Invalid UTF-8 sequences become U+FFFD; the row is kept.
    let decoded = urlencoding::decode_binary(encoded_name.as_bytes());
    let name = String::from_utf8_lossy(&decoded).into_owned();
    if name.is_empty() {
        return Err(RowSkip::EmptyName {
            rank,
            raw: encoded_name,
        });
    }

    if rank > source.topic_limit {
        return Ok(None);
    }

    let raw_number = &caps["number"];
    let number = raw_number.parse::<u64>().map_err(|_| RowSkip::Number {
        rank,
        name: name.clone(),
        raw: raw_number.to_string(),
    })?;

    let label = LABEL_ICON
        .captures(&caps["label"])
        .map(|l| l["tag"].to_string())
        .unwrap_or_default();

    let url = source.topic_url(&encoded_name);
    Ok(Some(TopListRow {
        entry: TopicEntry::new(rank, name, number, label, url),
        encoded_name,
    }))
}

/// Content of one topic's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicDetail {
    /// Summary line; empty when the page has none
    pub total: String,
    /// Posts keyed by author, last one wins
    pub posts: Vec<Post>,
    /// Posts whose posting time could not be read
    pub missing_source_time: usize,
}

impl TopicDetail {
    /// Move the detail content into `entry`.
    pub fn merge_into(self, entry: &mut TopicEntry) {
        entry.total = self.total;
        for post in self.posts {
            entry.insert_post(post);
        }
    }
}

/// Extract the summary line and posts from a detail page.
pub fn extract_detail(markup: &str) -> TopicDetail {
    let mut detail = TopicDetail {
        total: extract_total(markup),
        ..TopicDetail::default()
    };

    for caps in FEED_POST.captures_iter(markup) {
        let author = caps["author"].to_string();
        let source_time = extract_source_time(&caps["from"]).unwrap_or_else(|| {
            log::warn!("Post by {author}: no posting time in {:?}", &caps["from"]);
            detail.missing_source_time += 1;
            String::new()
        });

        let post = Post {
            text: clean_text(&caps["text"]),
            images: extract_images(&caps["media"]),
            videos: extract_videos(&caps["media"]),
            source_time,
            author,
        };
        upsert(&mut detail.posts, post, |a, b| a.author == b.author);
    }

    detail
}

/// Summary line: both spans joined by a space.
fn extract_total(markup: &str) -> String {
    DETAIL_TOTAL
        .captures(markup)
        .map(|caps| format!("{} {}", &caps["first"], &caps["second"]))
        .unwrap_or_default()
}
