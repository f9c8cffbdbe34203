// src/services/patterns.rs

//! Markup rules for the trending board.
//!
//! Every rule is written against normalized markup (spaces and newlines
//! removed, see [`crate::utils::normalize_markup`]). Each one is a separate
//! static so a change in the page layout touches a single rule.

use std::sync::LazyLock;

use regex::Regex;

fn rule(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markup rule must be a valid regex")
}

// --- Ranking page ---

/// One ranking row: rank, link attributes up to the topic query end, count, label cell.
pub static TOP_ROW: LazyLock<Regex> = LazyLock::new(|| {
    rule(concat!(
        r#"<tdclass="td-01ranktop">(?P<rank>.*?)</td><tdclass="td-02"><a(?P<link>.*?)&Refer=top""#,
        r#"(?:.*?)</a><span>(?P<number>.*?)</span></td><tdclass="td-03">(?P<label>.*?)</td>"#,
    ))
});

/// Encoded topic name inside a row's link attributes.
pub static TOPIC_QUERY: LazyLock<Regex> =
    LazyLock::new(|| rule(r#"="/weibo\?q=(?P<query>[^"&]+)"#));

/// Category icon inside the label cell.
pub static LABEL_ICON: LazyLock<Regex> =
    LazyLock::new(|| rule(r#"<iclass="icon-txticon-txt-(?P<tag>.*?)">"#));

// --- Detail page ---

/// Two-span summary line at the top of a detail page.
pub static DETAIL_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    rule(r#"<divclass="total"><span>(?P<first>.*?)</span><span>(?P<second>.*?)</span></div>"#)
});

/// One post: author, body, media block, trailing "from" line.
pub static FEED_POST: LazyLock<Regex> = LazyLock::new(|| {
    rule(concat!(
        r#"<pclass="txt"node-type="feed_list_content"nick-name="(?P<author>.*?)">(?P<text>.*?)</p>"#,
        r#"(?P<media>.*?)<pclass="from">(?P<from>.*?)</p>"#,
    ))
});

// --- Post fragments ---

/// Marker present only in image preview blocks.
pub const MEDIA_PREVIEW_MARKER: &str = "feed_list_media_prev";

/// Marker present only in video blocks.
pub const VIDEO_MARKER: &str = "media-video-a";

pub static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| rule(r"<li>(?P<item>.*?)</li>"));

pub static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| rule(r#"<imgsrc="(?P<src>.*?)""#));

pub static VIDEO_BLOCK: LazyLock<Regex> = LazyLock::new(|| rule(r"<video(?P<body>.*?)</video>"));

pub static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| rule(r#"src="(?P<src>.*?)""#));

/// First link of the "from" line; its text is the posting time.
pub static SOURCE_LINK: LazyLock<Regex> = LazyLock::new(|| rule(r"<a(?:.*?)>(?P<text>.*?)</a>"));

// --- Text cleanup, applied in this order ---

pub static EM_OPEN: LazyLock<Regex> = LazyLock::new(|| rule(r"<em(?:.*?)>"));
pub static EM_CLOSE: LazyLock<Regex> = LazyLock::new(|| rule(r"</em>"));
pub static LINK_OPEN: LazyLock<Regex> = LazyLock::new(|| rule(r"<a(?:.*?)>"));
pub static LINK_CLOSE: LazyLock<Regex> = LazyLock::new(|| rule(r"</a>"));
/// Emoticon image up to its title value; the title text is kept.
pub static IMG_OPEN: LazyLock<Regex> = LazyLock::new(|| rule(r#"<img(?:.*?)title=""#));
pub static IMG_TAIL: LazyLock<Regex> = LazyLock::new(|| rule(r#""alt=(?:.*?)>"#));
/// Italic blocks are icons; the whole block goes.
pub static ITALIC_BLOCK: LazyLock<Regex> = LazyLock::new(|| rule(r"<i(?:.*?)</i>"));
pub static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| rule(r"<br/>"));
