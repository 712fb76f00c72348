//! Value types returned by the tag graph

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of relationship between two tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// Symmetric: both tags mean roughly the same thing
    Similar,
    /// Symmetric: the tags are contrasting
    Opposite,
    /// The source tag is a generalisation of the target
    Broader,
    /// The source tag is a specialisation of the target
    Narrower,
    /// Caller-defined, stored symmetrically
    Custom,
}

impl RelationshipType {
    /// Type stored on the other endpoint
    pub fn inverse(self) -> Self {
        match self {
            Self::Broader => Self::Narrower,
            Self::Narrower => Self::Broader,
            other => other,
        }
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Similar => "similar",
            Self::Opposite => "opposite",
            Self::Broader => "broader",
            Self::Narrower => "narrower",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "similar" => Ok(Self::Similar),
            "opposite" => Ok(Self::Opposite),
            "broader" => Ok(Self::Broader),
            "narrower" => Ok(Self::Narrower),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown relationship type: {other}")),
        }
    }
}

/// Relationship record stored on a node, keyed by the related tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship kind as seen from the owning node
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Weight in `[0, 1]`
    pub strength: f64,
}

/// Parent/children view of a tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Parent key, if any
    pub parent: Option<String>,
    /// Child keys, sorted
    pub children: Vec<String>,
}

/// How per-tag document sets are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchOperator {
    /// Documents carrying every tag
    #[default]
    And,
    /// Documents carrying any tag
    Or,
}

/// Options for [`crate::TagGraph::search_by_tags`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Set combination
    pub operator: SearchOperator,
    /// Include documents tagged with any descendant tag
    pub include_children: bool,
    /// Match the document's exact tag spelling
    pub case_sensitive: bool,
}

/// A tag with the number of documents carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    /// Display name
    pub tag: String,
    /// Number of documents
    pub count: usize,
}

/// Tags grouped by how many documents use them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageBands {
    /// Exactly one document
    pub single: Vec<TagCount>,
    /// 2 to 5 documents
    pub low: Vec<TagCount>,
    /// 6 to 20 documents
    pub medium: Vec<TagCount>,
    /// More than 20 documents
    pub high: Vec<TagCount>,
}

impl UsageBands {
    /// Bucket counts; zero-count tags are left out
    pub fn from_counts(counts: impl IntoIterator<Item = TagCount>) -> Self {
        let mut bands = Self::default();
        for entry in counts {
            match entry.count {
                0 => {}
                1 => bands.single.push(entry),
                2..=5 => bands.low.push(entry),
                6..=20 => bands.medium.push(entry),
                _ => bands.high.push(entry),
            }
        }
        bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(RelationshipType::Similar, RelationshipType::Similar)]
    #[test_case(RelationshipType::Opposite, RelationshipType::Opposite)]
    #[test_case(RelationshipType::Broader, RelationshipType::Narrower)]
    #[test_case(RelationshipType::Narrower, RelationshipType::Broader)]
    #[test_case(RelationshipType::Custom, RelationshipType::Custom)]
    fn test_inverse(kind: RelationshipType, expected: RelationshipType) {
        assert_eq!(kind.inverse(), expected);
        assert_eq!(kind.inverse().inverse(), kind);
    }

    #[test]
    fn test_parse_relationship_type() {
        assert_eq!("Broader".parse::<RelationshipType>(), Ok(RelationshipType::Broader));
        assert!("sibling".parse::<RelationshipType>().is_err());
    }

    #[test]
    fn test_operator_serde() {
        let op: SearchOperator = serde_json::from_str("\"OR\"").unwrap();
        assert_eq!(op, SearchOperator::Or);
        assert_eq!(serde_json::to_string(&SearchOperator::And).unwrap(), "\"AND\"");
    }

    #[test]
    fn test_usage_bands() {
        let counts = [0, 1, 2, 5, 6, 20, 21].map(|count| TagCount {
            tag: format!("t{count}"),
            count,
        });
        let bands = UsageBands::from_counts(counts);
        assert_eq!(bands.single.len(), 1);
        assert_eq!(bands.low.len(), 2);
        assert_eq!(bands.medium.len(), 2);
        assert_eq!(bands.high.len(), 1);
        assert_eq!(bands.high[0].tag, "t21");
    }
}
