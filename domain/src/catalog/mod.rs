//! Site catalog: the routes the assistant may link to and the topics it may
//! recommend.
//!
//! The catalog is read-only during a session. Loading it from disk is an
//! infrastructure concern; this module only holds and queries it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A recommendable topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub title: String,
    pub path: String,
    #[serde(default = "default_topic_icon")]
    pub icon: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub duration: String,
}

fn default_topic_icon() -> String {
    "book".to_string()
}

/// Normalize a route for comparison: trim whitespace and drop trailing
/// slashes, except for the root itself.
///
/// ```
/// use tutor_domain::catalog::normalize_route;
///
/// assert_eq!(normalize_route("/lessons/"), "/lessons");
/// assert_eq!(normalize_route("/"), "/");
/// assert_eq!(normalize_route(""), "/");
/// ```
pub fn normalize_route(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    routes: BTreeSet<String>,
    topics: BTreeMap<String, TopicRecord>,
}

impl Catalog {
    /// Build a catalog. Every topic path is also registered as a route.
    pub fn new<R, S>(routes: R, topics: BTreeMap<String, TopicRecord>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: BTreeSet<String> = routes
            .into_iter()
            .map(|route| normalize_route(route.as_ref()))
            .collect();
        normalized.extend(topics.values().map(|topic| normalize_route(&topic.path)));
        Self {
            routes: normalized,
            topics,
        }
    }

    pub fn is_valid_route(&self, path: &str) -> bool {
        self.routes.contains(&normalize_route(path))
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(String::as_str)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn topics(&self) -> impl Iterator<Item = (&str, &TopicRecord)> {
        self.topics.iter().map(|(id, topic)| (id.as_str(), topic))
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Resolve a topic by id, falling back to a case-insensitive scan.
    pub fn resolve_topic(&self, id: &str) -> Option<(&str, &TopicRecord)> {
        let id = id.trim();
        if let Some((key, topic)) = self.topics.get_key_value(id) {
            return Some((key.as_str(), topic));
        }
        self.topics
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .map(|(key, topic)| (key.as_str(), topic))
    }
}
