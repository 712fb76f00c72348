//! Tag arena and its operations
//!
//! Nodes live in a map keyed by the normalized tag string. Parent and child
//! links are stored as keys, so the arena owns every node and there are no
//! back-pointers to keep alive.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::error::{TagError, TagResult};
use crate::types::{
    Hierarchy, Relationship, RelationshipType, SearchOperator, SearchOptions, TagCount,
    UsageBands,
};

/// Normalize a tag into its graph key.
///
/// Case is folded unless `case_sensitive` is set. A leading `#` and
/// surrounding whitespace are always dropped.
pub fn normalize_tag(tag: &str, case_sensitive: bool) -> TagResult<String> {
    let trimmed = tag.trim().trim_start_matches('#').trim();
    if trimmed.is_empty() {
        return Err(TagError::EmptyTag);
    }
    Ok(if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    })
}

/// One tag in the graph
#[derive(Debug, Clone, Default)]
pub struct TagNode {
    display: String,
    parent: Option<String>,
    children: BTreeSet<String>,
    /// path -> spellings used by that document
    documents: BTreeMap<String, BTreeSet<String>>,
    relationships: BTreeMap<String, Relationship>,
}

impl TagNode {
    fn new(display: &str) -> Self {
        Self {
            display: display.trim().trim_start_matches('#').trim().to_string(),
            ..Self::default()
        }
    }

    /// Spelling the tag was first seen with
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Parent key
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Child keys
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str)
    }

    /// Paths of documents carrying this tag
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Number of documents carrying this tag
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

/// In-memory tag relationship graph
#[derive(Debug, Default)]
pub struct TagGraph {
    nodes: BTreeMap<String, TagNode>,
}

impl TagGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tag nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by tag, using the same key rule as the mutations
    pub fn node(&self, tag: &str, case_sensitive: bool) -> Option<&TagNode> {
        self.nodes.get(&normalize_tag(tag, case_sensitive).ok()?)
    }

    fn node_mut(&mut self, key: &str, display: &str) -> &mut TagNode {
        self.nodes
            .entry(key.to_string())
            .or_insert_with(|| TagNode::new(display))
    }

    /// Record that `path` carries `tags`, replacing whatever was indexed for
    /// it before. Nodes are created on first reference.
    pub fn index_document(&mut self, path: &str, tags: &[String]) {
        self.remove_document(path);

        for tag in tags {
            let Ok(key) = normalize_tag(tag, false) else {
                continue;
            };
            let spelling = tag.trim().trim_start_matches('#').trim().to_string();
            self.node_mut(&key, tag)
                .documents
                .entry(path.to_string())
                .or_default()
                .insert(spelling);
        }
    }

    /// Drop `path` from every node's membership. Nodes themselves stay.
    pub fn remove_document(&mut self, path: &str) {
        for node in self.nodes.values_mut() {
            node.documents.remove(path);
        }
    }

    /// Drop every membership entry, keeping nodes, links and relationships
    pub fn clear_memberships(&mut self) {
        for node in self.nodes.values_mut() {
            node.documents.clear();
        }
    }

    /// Store `a -> b` with `kind` and `b -> a` with its inverse.
    ///
    /// Re-adding the same pair overwrites the previous record on both sides.
    pub fn add_relationship(
        &mut self,
        a: &str,
        b: &str,
        kind: RelationshipType,
        strength: Option<f64>,
        case_sensitive: bool,
    ) -> TagResult<()> {
        let strength = strength.unwrap_or(1.0);
        if !(0.0..=1.0).contains(&strength) {
            return Err(TagError::InvalidStrength(strength));
        }

        let key_a = normalize_tag(a, case_sensitive)?;
        let key_b = normalize_tag(b, case_sensitive)?;
        if key_a == key_b {
            return Err(TagError::SelfRelationship(key_a));
        }

        self.node_mut(&key_a, a)
            .relationships
            .insert(key_b.clone(), Relationship { kind, strength });
        self.node_mut(&key_b, b).relationships.insert(
            key_a.clone(),
            Relationship {
                kind: kind.inverse(),
                strength,
            },
        );

        debug!("Tag relationship {} -[{}]-> {}", key_a, kind, key_b);
        Ok(())
    }

    /// Set `tag`'s parent (when given) and adopt `children`.
    ///
    /// Every candidate edge is checked before anything changes; an edge that
    /// would close a loop fails with [`TagError::HierarchyCycle`].
    pub fn set_hierarchy(
        &mut self,
        tag: &str,
        parent: Option<&str>,
        children: &[String],
        case_sensitive: bool,
    ) -> TagResult<()> {
        let key = normalize_tag(tag, case_sensitive)?;

        // child key -> (display, proposed parent key)
        let mut proposed: BTreeMap<String, (String, String)> = BTreeMap::new();
        let mut parent_entry = None;
        if let Some(parent) = parent {
            let parent_key = normalize_tag(parent, case_sensitive)?;
            proposed.insert(key.clone(), (tag.to_string(), parent_key.clone()));
            parent_entry = Some((parent_key, parent.to_string()));
        }
        for child in children {
            let child_key = normalize_tag(child, case_sensitive)?;
            proposed.insert(child_key, (child.clone(), key.clone()));
        }

        self.check_acyclic(&proposed)?;

        self.node_mut(&key, tag);
        if let Some((parent_key, display)) = &parent_entry {
            self.node_mut(parent_key, display);
        }

        for (child_key, (display, parent_key)) in proposed {
            self.node_mut(&child_key, &display);
            self.link(&child_key, &parent_key);
        }

        Ok(())
    }

    /// Point `child` at `parent`, unlinking it from any previous parent
    fn link(&mut self, child: &str, parent: &str) {
        let previous = self
            .nodes
            .get_mut(child)
            .and_then(|node| node.parent.replace(parent.to_string()));

        if let Some(previous) = previous.filter(|p| p != parent) {
            if let Some(old) = self.nodes.get_mut(&previous) {
                old.children.remove(child);
            }
        }

        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.insert(child.to_string());
        }
    }

    fn check_acyclic(&self, proposed: &BTreeMap<String, (String, String)>) -> TagResult<()> {
        let parent_of = |key: &str| -> Option<String> {
            match proposed.get(key) {
                Some((_, parent)) => Some(parent.clone()),
                None => self.nodes.get(key).and_then(|n| n.parent.clone()),
            }
        };

        // A chain can't be longer than every node plus every new one
        let bound = self.nodes.len() + proposed.len() + 1;

        for (child, (_, parent)) in proposed {
            let mut current = Some(parent.clone());
            let mut steps = 0;
            while let Some(key) = current {
                if &key == child || steps > bound {
                    return Err(TagError::HierarchyCycle {
                        tag: child.clone(),
                        parent: parent.clone(),
                    });
                }
                current = parent_of(&key);
                steps += 1;
            }
        }

        Ok(())
    }

    /// Relationships of `tag`, empty when unknown
    pub fn relationships(&self, tag: &str, case_sensitive: bool) -> BTreeMap<String, Relationship> {
        self.node(tag, case_sensitive)
            .map(|node| node.relationships.clone())
            .unwrap_or_default()
    }

    /// Parent and children of `tag`, empty when unknown
    pub fn hierarchy(&self, tag: &str, case_sensitive: bool) -> Hierarchy {
        self.node(tag, case_sensitive)
            .map(|node| Hierarchy {
                parent: node.parent.clone(),
                children: node.children.iter().cloned().collect(),
            })
            .unwrap_or_default()
    }

    /// Every transitive descendant key of `key`
    fn descendants(&self, key: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([key.to_string()]);

        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.get(&current) {
                for child in &node.children {
                    if seen.insert(child.clone()) {
                        queue.push_back(child.clone());
                    }
                }
            }
        }

        seen.remove(key);
        seen
    }

    /// Documents tagged `key`.
    ///
    /// Memberships live on the case-folded node; a case-sensitive key keeps
    /// only documents that used exactly that spelling.
    fn documents_of(&self, key: &str, case_sensitive: bool) -> BTreeSet<String> {
        let Some(node) = self.nodes.get(&key.to_lowercase()) else {
            return BTreeSet::new();
        };
        node.documents
            .iter()
            .filter(|(_, spellings)| !case_sensitive || spellings.contains(key))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Documents carrying one tag, optionally widened by its descendants
    fn members(&self, tag: &str, options: &SearchOptions) -> BTreeSet<String> {
        let Ok(key) = normalize_tag(tag, options.case_sensitive) else {
            return BTreeSet::new();
        };

        let mut paths = self.documents_of(&key, options.case_sensitive);
        if options.include_children {
            for child in self.descendants(&key) {
                paths.extend(self.documents_of(&child, options.case_sensitive));
            }
        }

        paths
    }

    /// Paths of documents matching `tags`, sorted and deduplicated
    pub fn search_by_tags(&self, tags: &[String], options: SearchOptions) -> Vec<String> {
        let mut sets = tags.iter().map(|tag| self.members(tag, &options));

        let Some(first) = sets.next() else {
            return Vec::new();
        };

        let combined = sets.fold(first, |acc, set| match options.operator {
            SearchOperator::And => acc.intersection(&set).cloned().collect(),
            SearchOperator::Or => acc.union(&set).cloned().collect(),
        });

        combined.into_iter().collect()
    }

    /// Every tag with its document count, most used first (ties by name)
    pub fn all_tags(&self) -> Vec<TagCount> {
        let mut counts: Vec<TagCount> = self
            .nodes
            .values()
            .map(|node| TagCount {
                tag: node.display.clone(),
                count: node.document_count(),
            })
            .collect();

        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        counts
    }

    /// [`Self::all_tags`] bucketed by usage
    pub fn usage_bands(&self) -> UsageBands {
        UsageBands::from_counts(self.all_tags())
    }
}
