use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::models::PostWithOwner;
use crate::error::ServiceError;

/// Named retrieval strategy inside a single feed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeedTag {
    #[serde(rename = "random")]
    Random,
    #[serde(rename = "following")]
    Following,
    #[serde(rename = "myPosts")]
    MyPosts,
}

impl FeedTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedTag::Random => "random",
            FeedTag::Following => "following",
            FeedTag::MyPosts => "myPosts",
        }
    }

    /// Whether the tag is computed relative to the acting user
    pub fn needs_actor(&self) -> bool {
        matches!(self, FeedTag::Following | FeedTag::MyPosts)
    }

    /// Parse a comma-separated tag list such as `random,following`
    pub fn parse_list(raw: &str) -> Result<BTreeSet<FeedTag>, ServiceError> {
        let tags = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FeedTag::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;

        if tags.is_empty() {
            return Err(ServiceError::Validation(
                "at least one feed tag is required".to_string(),
            ));
        }
        Ok(tags)
    }
}

impl FromStr for FeedTag {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(FeedTag::Random),
            "following" => Ok(FeedTag::Following),
            "myPosts" => Ok(FeedTag::MyPosts),
            other => Err(ServiceError::Validation(format!(
                "unknown feed tag '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for FeedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub tags: BTreeSet<FeedTag>,
    /// `None` falls back to the configured default
    pub limit: Option<usize>,
    pub actor: Option<Uuid>,
}

impl FeedRequest {
    pub fn new(tags: impl IntoIterator<Item = FeedTag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            limit: None,
            actor: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn actor(mut self, actor: Uuid) -> Self {
        self.actor = Some(actor);
        self
    }
}

/// One independently computed list per requested tag
pub type Feed = BTreeMap<FeedTag, Vec<PostWithOwner>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        let tags = FeedTag::parse_list("random, myPosts").unwrap();
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec![FeedTag::Random, FeedTag::MyPosts]
        );
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert!(matches!(
            FeedTag::parse_list("random,trending"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            FeedTag::parse_list(" , "),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn feed_serializes_tag_names_as_keys() {
        let mut feed = Feed::new();
        feed.insert(FeedTag::MyPosts, vec![]);
        feed.insert(FeedTag::Following, vec![]);

        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json, serde_json::json!({ "following": [], "myPosts": [] }));
    }
}
