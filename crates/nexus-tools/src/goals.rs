//! The `goals` bundle

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nexus_config::OutputFormat;
use nexus_core::{Document, Metadata};
use nexus_plugins::{Bundle, Operation, ToolOutput};

use crate::utils::{slugify, status, string_list, vault_operation};
use crate::vault::Vault;

const GOALS_FOLDER: &str = "goals";
const LIST_FIELDS: &[&str] = &["title", "status", "priority", "due"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
enum GoalStatus {
    Open,
    InProgress,
    Done,
    Dropped,
}

impl GoalStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Dropped => "dropped",
        }
    }
}

impl Priority {
    fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateGoalParams {
    title: String,
    description: Option<String>,
    #[serde(default)]
    priority: Priority,
    /// Due date, `YYYY-MM-DD`
    due: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdateGoalStatusParams {
    /// Goal path; a bare name is looked up under `goals/`
    path: String,
    status: GoalStatus,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListGoalsParams {
    status: Option<GoalStatus>,
    priority: Option<Priority>,
}

fn goal_document(p: &CreateGoalParams, created: &str) -> anyhow::Result<Document> {
    let mut metadata = Metadata::new();
    metadata.insert("type".to_string(), Value::from("goal"));
    metadata.insert("title".to_string(), Value::from(p.title.as_str()));
    metadata.insert("status".to_string(), Value::from(GoalStatus::Open.as_str()));
    metadata.insert("priority".to_string(), Value::from(p.priority.as_str()));
    metadata.insert("created".to_string(), Value::from(created));
    if let Some(due) = &p.due {
        let due = NaiveDate::parse_from_str(due.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid due date '{due}': expected YYYY-MM-DD"))?;
        metadata.insert("due".to_string(), Value::from(due.to_string()));
    }
    metadata.insert("tags".to_string(), string_list(&p.tags));

    let description = p
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("_No description._");
    let body = format!("# {}\n\n{}\n\n## Progress\n\n", p.title, description);

    Ok(Document::new(
        format!("{GOALS_FOLDER}/{}.md", slugify(&p.title)),
        metadata,
        body,
    ))
}

fn goal_path(path: &str) -> String {
    if path.contains('/') {
        path.to_string()
    } else {
        format!("{GOALS_FOLDER}/{path}")
    }
}

/// Query text listing goals, filtered by status and priority
fn list_query(status: Option<GoalStatus>, priority: Option<Priority>) -> String {
    let mut conditions = Vec::new();
    if let Some(status) = status {
        conditions.push(format!("status = \"{}\"", status.as_str()));
    }
    if let Some(priority) = priority {
        conditions.push(format!("priority = \"{}\"", priority.as_str()));
    }

    let mut query = format!("FROM \"{GOALS_FOLDER}\"");
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    query.push_str(" SORT due ASC TABLE ");
    query.push_str(&LIST_FIELDS.join(", "));
    query
}

/// Goal tracking on top of the vault
#[derive(Debug, Clone)]
pub struct GoalsBundle {
    vault: Vault,
}

impl GoalsBundle {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }
}

#[async_trait]
impl Bundle for GoalsBundle {
    fn operations(&self) -> Vec<Operation> {
        let v = &self.vault;
        vec![
            vault_operation(
                v,
                "create_goal",
                "Create an open goal under goals/",
                |vault, p: CreateGoalParams| async move {
                    let created = Local::now().date_naive().to_string();
                    let document = goal_document(&p, &created)?;
                    let path = vault
                        .create(&document)
                        .await
                        .with_context(|| format!("Could not create goal '{}'", p.title))?;
                    status(&path, "created")
                },
            ),
            vault_operation(
                v,
                "update_goal_status",
                "Move a goal to open, in-progress, done or dropped",
                |vault, p: UpdateGoalStatusParams| async move {
                    let path = goal_path(&p.path);
                    let goal = vault.read(&path).await?;
                    if goal.field("type").and_then(Value::as_str) != Some("goal") {
                        bail!("{} is not a goal", goal.path);
                    }

                    let mut changes = Metadata::new();
                    changes.insert("status".to_string(), Value::from(p.status.as_str()));
                    let completed = if p.status == GoalStatus::Done {
                        Value::from(Local::now().date_naive().to_string())
                    } else {
                        Value::Null
                    };
                    changes.insert("completed".to_string(), completed);

                    let updated = vault.update(&path, Some(changes), None).await?;
                    status(&updated.path, p.status.as_str())
                },
            ),
            vault_operation(
                v,
                "list_goals",
                "Table of goals, optionally filtered by status and priority",
                |vault, p: ListGoalsParams| async move {
                    let query = list_query(p.status, p.priority);
                    let rendered = vault.query(&query, Some(OutputFormat::Table), None).await?;
                    Ok(ToolOutput::text(rendered))
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_query() {
        assert_eq!(
            list_query(None, None),
            "FROM \"goals\" SORT due ASC TABLE title, status, priority, due"
        );
        assert_eq!(
            list_query(Some(GoalStatus::InProgress), Some(Priority::High)),
            "FROM \"goals\" WHERE status = \"in-progress\" AND priority = \"high\" \
SORT due ASC TABLE title, status, priority, due"
        );
        assert!(nexus_query::parse(&list_query(Some(GoalStatus::Done), None)).is_ok());
    }

    #[test]
    fn test_goal_document_defaults() {
        let p: CreateGoalParams = serde_json::from_value(json!({ "title": "Learn Rust" })).unwrap();
        let document = goal_document(&p, "2024-06-01").unwrap();

        assert_eq!(document.path, "goals/learn-rust.md");
        assert_eq!(document.metadata.get("status"), Some(&json!("open")));
        assert_eq!(document.metadata.get("priority"), Some(&json!("medium")));
        assert!(document.metadata.get("due").is_none());
        assert!(document.body.contains("_No description._"));
    }

    #[test]
    fn test_goal_document_rejects_bad_due() {
        let p: CreateGoalParams =
            serde_json::from_value(json!({ "title": "x", "due": "next week" })).unwrap();
        assert!(goal_document(&p, "2024-06-01").is_err());
    }

    #[test]
    fn test_goal_path() {
        assert_eq!(goal_path("learn-rust.md"), "goals/learn-rust.md");
        assert_eq!(goal_path("archive/old.md"), "archive/old.md");
    }
}
