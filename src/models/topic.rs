//! Trending topic and post structures.

use serde::{Serialize, Serializer};

use super::upsert;

/// Display glyphs for the category tags the board attaches to rows.
const LABEL_GLYPHS: &[(&str, &str)] = &[
    ("new", "新"),
    ("boil", "沸"),
    ("recommend", "荐"),
    ("hot", "热"),
];

/// One trending topic with its detail-page content.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopicEntry {
    /// 1-based position in the ranking
    pub rank: u32,

    /// Decoded topic name
    pub name: String,

    /// Engagement count shown next to the topic
    pub number: u64,

    /// Category tag such as `hot` or `new`; empty when the row has none
    pub label: String,

    /// Public link to the topic
    pub url: String,

    /// Summary line of the detail page; empty when it could not be read
    pub total: String,

    /// Posts keyed by author in first-seen order
    #[serde(serialize_with = "posts_by_author")]
    pub posts: Vec<Post>,
}

impl TopicEntry {
    /// Create an entry from ranking data, without detail content yet.
    pub fn new(
        rank: u32,
        name: impl Into<String>,
        number: u64,
        label: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            rank,
            name: name.into(),
            number,
            label: label.into(),
            url: url.into(),
            total: String::new(),
            posts: Vec::new(),
        }
    }

    /// Insert a post; an author seen before keeps its position and takes the new post.
    pub fn insert_post(&mut self, post: Post) {
        upsert(&mut self.posts, post, |a, b| a.author == b.author);
    }

    /// Look up a post by author.
    pub fn post(&self, author: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.author == author)
    }

    /// Display glyph for the label, if the tag is a known one.
    pub fn label_glyph(&self) -> Option<&'static str> {
        LABEL_GLYPHS
            .iter()
            .find(|(tag, _)| *tag == self.label)
            .map(|(_, glyph)| *glyph)
    }
}

/// One post under a topic's detail page.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Post {
    pub author: String,
    pub text: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    /// Posting time and client, e.g. `10月1日 12:00`
    pub source_time: String,
}

fn posts_by_author<S: Serializer>(posts: &[Post], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(posts.iter().map(|post| (&post.author, post)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: &str, text: &str) -> Post {
        Post {
            author: author.to_string(),
            text: text.to_string(),
            ..Post::default()
        }
    }

    #[test]
    fn test_insert_post_last_write_wins_in_place() {
        let mut entry = TopicEntry::new(1, "topic", 10, "", "https://example.com/t");
        entry.insert_post(post("alice", "first"));
        entry.insert_post(post("bob", "second"));
        entry.insert_post(post("alice", "third"));

        assert_eq!(entry.posts.len(), 2);
        assert_eq!(entry.posts[0].author, "alice");
        assert_eq!(entry.posts[0].text, "third");
        assert_eq!(entry.post("bob").unwrap().text, "second");
    }

    #[test]
    fn test_label_glyph() {
        let mut entry = TopicEntry::new(1, "topic", 10, "boil", "u");
        assert_eq!(entry.label_glyph(), Some("沸"));

        entry.label = String::new();
        assert_eq!(entry.label_glyph(), None);
    }

    #[test]
    fn test_posts_serialize_as_author_map() {
        let mut entry = TopicEntry::new(2, "topic", 5, "hot", "u");
        entry.insert_post(post("zed", "z"));
        entry.insert_post(post("amy", "a"));

        let json = serde_json::to_value(&entry).unwrap();
        let posts = json["posts"].as_object().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts["zed"]["text"], "z");
        assert_eq!(json["rank"], 2);
        assert_eq!(json["label"], "hot");
    }
}
