//! The `vault` bundle: document CRUD, queries and the tag graph

use anyhow::{bail, Context};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use nexus_config::OutputFormat;
use nexus_core::{Document, Metadata};
use nexus_plugins::{Bundle, Operation, ResourceInfo, ToolOutput};
use nexus_tags::{RelationshipType, SearchOperator, SearchOptions};

use crate::utils::{status, vault_operation};
use crate::vault::Vault;

const TAGS_URI: &str = "nexus://tags";
const DOCUMENTS_URI: &str = "nexus://documents";

const QUERY_USAGE: &str = "Query syntax: FROM \"folder\" WHERE field = value [AND|OR ...] \
SORT field [ASC|DESC] LIMIT n TABLE field [as \"Alias\"], ...\n\
Conditions: =, !=, >, <, >=, <=, contains(field, \"value\"). \
Bare #tags expand to contains(tags, ...) conditions.";

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateDocumentParams {
    /// Root-relative path; `.md` is appended when missing
    path: String,
    /// Header metadata
    #[serde(default)]
    metadata: Metadata,
    /// Body text
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PathParams {
    /// Root-relative document path
    path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdateDocumentParams {
    /// Root-relative document path
    path: String,
    /// Keys to merge into the header; `null` removes a key
    metadata: Option<Metadata>,
    /// Replacement body
    body: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListDocumentsParams {
    /// Folder to list recursively; the whole vault when omitted
    #[serde(default)]
    folder: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct QueryDocumentsParams {
    /// Query text
    query: String,
    /// Overrides the query's output format
    format: Option<OutputFormat>,
    /// Overrides the query's projected fields
    fields: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchByTagsParams {
    /// Tags to look up
    tags: Vec<String>,
    /// How per-tag results are combined
    #[serde(default)]
    operator: SearchOperator,
    /// Also match documents tagged with descendant tags
    #[serde(default)]
    include_children: bool,
    /// Match the exact tag spelling
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddRelationshipParams {
    /// Source tag
    source: String,
    /// Target tag
    target: String,
    /// Relationship kind, seen from the source tag
    relationship: RelationshipType,
    /// Weight between 0 and 1, defaults to 1
    strength: Option<f64>,
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SetHierarchyParams {
    /// Tag being placed in the hierarchy
    tag: String,
    /// New parent tag
    parent: Option<String>,
    /// Tags to adopt as children
    #[serde(default)]
    children: Vec<String>,
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TagParams {
    /// Tag name
    tag: String,
    /// Look up the tag exactly as spelled
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NoParams {}

/// Document and tag operations over the vault
#[derive(Debug, Clone)]
pub struct VaultBundle {
    vault: Vault,
}

impl VaultBundle {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }
}

#[async_trait]
impl Bundle for VaultBundle {
    fn operations(&self) -> Vec<Operation> {
        let v = &self.vault;
        vec![
            vault_operation(
                v,
                "create_document",
                "Create a new document; fails if the path already exists",
                |vault, p: CreateDocumentParams| async move {
                    let document = Document::new(p.path, p.metadata, p.body);
                    let path = vault.create(&document).await?;
                    status(&path, "created")
                },
            ),
            vault_operation(
                v,
                "read_document",
                "Read a document's metadata and body",
                |vault, p: PathParams| async move {
                    let document = vault.read(&p.path).await?;
                    ToolOutput::json(&document)
                },
            ),
            vault_operation(
                v,
                "update_document",
                "Merge metadata into a document and/or replace its body",
                |vault, p: UpdateDocumentParams| async move {
                    if p.metadata.is_none() && p.body.is_none() {
                        bail!("Either 'metadata' or 'body' must be provided");
                    }
                    let document = vault.update(&p.path, p.metadata, p.body).await?;
                    status(&document.path, "updated")
                },
            ),
            vault_operation(
                v,
                "delete_document",
                "Delete a document",
                |vault, p: PathParams| async move {
                    let path = vault.delete(&p.path).await?;
                    status(&path, "deleted")
                },
            ),
            vault_operation(
                v,
                "list_documents",
                "List document paths under a folder",
                |vault, p: ListDocumentsParams| async move {
                    let paths = vault.list(&p.folder).await?;
                    ToolOutput::json(&json!({ "folder": p.folder, "count": paths.len(), "documents": paths }))
                },
            ),
            vault_operation(
                v,
                "query_documents",
                "Run a metadata query and render the matches as a table or list",
                |vault, p: QueryDocumentsParams| async move {
                    let rendered = vault.query(&p.query, p.format, p.fields).await?;
                    Ok(ToolOutput::text(rendered))
                },
            ),
            vault_operation(
                v,
                "search_by_tags",
                "Find documents carrying the given tags",
                |vault, p: SearchByTagsParams| async move {
                    let options = SearchOptions {
                        operator: p.operator,
                        include_children: p.include_children,
                        case_sensitive: p.case_sensitive,
                    };
                    let paths = vault.tags().read().search_by_tags(&p.tags, options);
                    ToolOutput::json(&json!({ "count": paths.len(), "documents": paths }))
                },
            ),
            vault_operation(
                v,
                "add_tag_relationship",
                "Relate two tags; the inverse is stored on the target",
                |vault, p: AddRelationshipParams| async move {
                    vault.tags().write().add_relationship(
                        &p.source,
                        &p.target,
                        p.relationship,
                        p.strength,
                        p.case_sensitive,
                    )?;
                    ToolOutput::json(&json!({
                        "source": p.source,
                        "target": p.target,
                        "relationship": p.relationship,
                        "inverse": p.relationship.inverse(),
                    }))
                },
            ),
            vault_operation(
                v,
                "set_tag_hierarchy",
                "Set a tag's parent and/or adopt child tags",
                |vault, p: SetHierarchyParams| async move {
                    let hierarchy = {
                        let mut graph = vault.tags().write();
                        graph.set_hierarchy(&p.tag, p.parent.as_deref(), &p.children, p.case_sensitive)?;
                        graph.hierarchy(&p.tag, p.case_sensitive)
                    };
                    ToolOutput::json(&json!({ "tag": p.tag, "hierarchy": hierarchy }))
                },
            ),
            vault_operation(
                v,
                "get_tag_relationships",
                "Relationships recorded for a tag",
                |vault, p: TagParams| async move {
                    let relationships = vault.tags().read().relationships(&p.tag, p.case_sensitive);
                    ToolOutput::json(&json!({ "tag": p.tag, "relationships": relationships }))
                },
            ),
            vault_operation(
                v,
                "get_tag_hierarchy",
                "Parent and children of a tag",
                |vault, p: TagParams| async move {
                    let hierarchy = vault.tags().read().hierarchy(&p.tag, p.case_sensitive);
                    ToolOutput::json(&json!({ "tag": p.tag, "hierarchy": hierarchy }))
                },
            ),
            vault_operation(
                v,
                "tag_statistics",
                "Tag usage counts grouped into bands",
                |vault, _: NoParams| async move {
                    let (total, bands) = {
                        let graph = vault.tags().read();
                        (graph.len(), graph.usage_bands())
                    };
                    ToolOutput::json(&json!({ "total_tags": total, "usage": bands }))
                },
            ),
            vault_operation(
                v,
                "rescan_tags",
                "Rebuild tag memberships from a full scan of the vault",
                |vault, _: NoParams| async move {
                    let count = vault
                        .tags()
                        .refresh(vault.store())
                        .await
                        .context("Tag rescan failed")?;
                    ToolOutput::json(&json!({ "documents": count, "status": "rescanned" }))
                },
            ),
        ]
    }

    fn resources(&self) -> Vec<ResourceInfo> {
        vec![
            ResourceInfo::new(TAGS_URI, "Tag counts", "application/json"),
            ResourceInfo::new(DOCUMENTS_URI, "Document paths", "application/json"),
        ]
    }

    async fn read_resource(&self, uri: &str) -> anyhow::Result<Option<String>> {
        match uri {
            TAGS_URI => {
                let counts = self.vault.tags().read().all_tags();
                Ok(Some(serde_json::to_string_pretty(&counts)?))
            }
            DOCUMENTS_URI => {
                let paths = self.vault.list("").await?;
                Ok(Some(serde_json::to_string_pretty(&paths)?))
            }
            _ => Ok(None),
        }
    }

    fn usage_hint(&self, operation: &str) -> Option<String> {
        (operation == "query_documents").then(|| QUERY_USAGE.to_string())
    }

    async fn on_load(&self) -> anyhow::Result<()> {
        self.vault
            .initialize_tags()
            .await
            .context("Failed to build the tag index")?;
        info!("Vault bundle ready at {}", self.vault.store().root().display());
        Ok(())
    }
}
