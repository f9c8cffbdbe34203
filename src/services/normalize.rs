// src/services/normalize.rs

//! Post fragment cleanup: body text, media URLs, and posting time.

use super::patterns::{
    EM_CLOSE, EM_OPEN, IMG_OPEN, IMG_SRC, IMG_TAIL, ITALIC_BLOCK, LINE_BREAK, LINK_CLOSE,
    LINK_OPEN, LIST_ITEM, MEDIA_PREVIEW_MARKER, SOURCE_LINK, SRC_ATTR, VIDEO_BLOCK, VIDEO_MARKER,
};

const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// Strip decoration from a post body, keeping its readable text.
///
/// Emphasis and link tags are unwrapped, emoticon images collapse to their
/// title text, italic icon blocks are dropped with their content, and line
/// breaks are removed.
pub fn clean_text(raw: &str) -> String {
    let text = raw.replace(ZERO_WIDTH_SPACE, "");
    let text = EM_OPEN.replace_all(&text, "");
    let text = EM_CLOSE.replace_all(&text, "");
    let text = LINK_OPEN.replace_all(&text, "");
    let text = LINK_CLOSE.replace_all(&text, "");
    let text = IMG_OPEN.replace_all(&text, "");
    let text = IMG_TAIL.replace_all(&text, "");
    let text = ITALIC_BLOCK.replace_all(&text, "");
    LINE_BREAK.replace_all(&text, "").into_owned()
}

/// Image URLs of a media block, one per list item, in document order.
///
/// Blocks without the preview marker carry no images.
pub fn extract_images(media: &str) -> Vec<String> {
    if !media.contains(MEDIA_PREVIEW_MARKER) {
        return Vec::new();
    }
    LIST_ITEM
        .captures_iter(media)
        .filter_map(|item| IMG_SRC.captures(&item["item"]).map(|c| c["src"].to_string()))
        .collect()
}

/// Video URLs of a media block, one per `<video>` element, in document order.
///
/// Blocks without the video marker carry no videos.
pub fn extract_videos(media: &str) -> Vec<String> {
    if !media.contains(VIDEO_MARKER) {
        return Vec::new();
    }
    VIDEO_BLOCK
        .captures_iter(media)
        .filter_map(|block| SRC_ATTR.captures(&block["body"]).map(|c| c["src"].to_string()))
        .collect()
}

/// Posting time from the "from" line: the text of its first link.
pub fn extract_source_time(from: &str) -> Option<String> {
    SOURCE_LINK
        .captures(from)
        .map(|caps| caps["text"].to_string())
}
