//! The `journal` bundle: insights, reflections and daily logs
//!
//! Each entry is a templated document written through the [`Vault`] so its
//! tags are indexed immediately.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nexus_core::{Document, Metadata};
use nexus_plugins::{Bundle, Operation};

use crate::utils::{bullets, links, slugify, status, string_list, vault_operation};
use crate::vault::Vault;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateInsightParams {
    title: String,
    description: String,
    /// Notes this insight is about
    #[serde(default, alias = "relatedTo")]
    related_to: Vec<String>,
    /// Why the insight matters
    #[serde(default)]
    impact: String,
    #[serde(default, alias = "actionItems")]
    action_items: Vec<String>,
    /// Other insights this one builds on
    #[serde(default, alias = "relatedInsights")]
    related_insights: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    /// `YYYY-MM-DD`, today when omitted
    date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateReflectionParams {
    title: String,
    period: Period,
    #[serde(default, alias = "focusAreas")]
    focus_areas: Vec<String>,
    #[serde(default)]
    observations: Vec<String>,
    #[serde(default, alias = "relatedNotes")]
    related_notes: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    /// `YYYY-MM-DD`, today when omitted
    date: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateDailyLogParams {
    /// `YYYY-MM-DD`, today when omitted
    date: Option<String>,
    /// One bullet per entry
    entries: Vec<String>,
    mood: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Resolve an optional `YYYY-MM-DD` string, defaulting to today
fn entry_date(date: Option<&str>) -> anyhow::Result<String> {
    match date {
        Some(raw) => {
            let parsed = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map_err(|e| anyhow!("Invalid date '{}': expected YYYY-MM-DD ({})", raw, e))?;
            Ok(parsed.format(DATE_FORMAT).to_string())
        }
        None => Ok(Local::now().date_naive().format(DATE_FORMAT).to_string()),
    }
}

/// Base metadata shared by every journal entry
fn entry_metadata(kind: &str, title: &str, date: &str, tags: &[String]) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("type".to_string(), Value::from(kind));
    metadata.insert("title".to_string(), Value::from(title));
    metadata.insert("date".to_string(), Value::from(date));
    metadata.insert("tags".to_string(), string_list(tags));
    metadata
}

fn insight_document(p: &CreateInsightParams, date: &str) -> Document {
    let mut metadata = entry_metadata("insight", &p.title, date, &p.tags);
    metadata.insert("related_to".to_string(), string_list(&p.related_to));

    let impact = if p.impact.trim().is_empty() {
        "_Not assessed yet._"
    } else {
        p.impact.trim()
    };

    let body = format!(
        "# {title}\n\n## Description\n\n{description}\n\n## Impact\n\n{impact}\n\n\
## Action Items\n\n{actions}\n\n## Related Notes\n\n{related}\n\n## Related Insights\n\n{insights}\n",
        title = p.title,
        description = p.description.trim(),
        impact = impact,
        actions = bullets(&p.action_items, "_None._"),
        related = links(&p.related_to, "_None._"),
        insights = links(&p.related_insights, "_None._"),
    );

    Document::new(format!("insights/{}.md", slugify(&p.title)), metadata, body)
}

fn reflection_document(p: &CreateReflectionParams, date: &str) -> Document {
    let mut metadata = entry_metadata("reflection", &p.title, date, &p.tags);
    metadata.insert("period".to_string(), Value::from(p.period.as_str()));
    metadata.insert("focus_areas".to_string(), string_list(&p.focus_areas));

    let body = format!(
        "# {title}\n\n_{period} reflection, {date}_\n\n## Focus Areas\n\n{focus}\n\n\
## Observations\n\n{observations}\n\n## Related Notes\n\n{related}\n",
        title = p.title,
        period = capitalize(p.period.as_str()),
        date = date,
        focus = bullets(&p.focus_areas, "_None._"),
        observations = bullets(&p.observations, "_None._"),
        related = links(&p.related_notes, "_None._"),
    );

    Document::new(format!("reflections/{}.md", slugify(&p.title)), metadata, body)
}

fn daily_log_document(p: &CreateDailyLogParams, date: &str) -> Document {
    let title = format!("Daily Log {date}");
    let mut metadata = entry_metadata("daily_log", &title, date, &p.tags);
    if let Some(mood) = p.mood.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        metadata.insert("mood".to_string(), Value::from(mood));
    }

    let mut body = format!("# {title}\n\n## Entries\n\n{}\n", bullets(&p.entries, "_Nothing logged._"));
    if let Some(mood) = metadata.get("mood").and_then(Value::as_str) {
        body.push_str(&format!("\n## Mood\n\n{mood}\n"));
    }

    Document::new(format!("daily_logs/{date}.md"), metadata, body)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Structured journal entries on top of the vault
#[derive(Debug, Clone)]
pub struct JournalBundle {
    vault: Vault,
}

impl JournalBundle {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }
}

#[async_trait]
impl Bundle for JournalBundle {
    fn operations(&self) -> Vec<Operation> {
        let v = &self.vault;
        vec![
            vault_operation(
                v,
                "create_insight",
                "Record an insight under insights/",
                |vault, p: CreateInsightParams| async move {
                    let date = entry_date(p.date.as_deref())?;
                    let document = insight_document(&p, &date);
                    let path = vault
                        .create(&document)
                        .await
                        .with_context(|| format!("Could not create insight '{}'", p.title))?;
                    status(&path, "created")
                },
            ),
            vault_operation(
                v,
                "create_reflection",
                "Record a daily, weekly or monthly reflection under reflections/",
                |vault, p: CreateReflectionParams| async move {
                    let date = entry_date(p.date.as_deref())?;
                    let document = reflection_document(&p, &date);
                    let path = vault
                        .create(&document)
                        .await
                        .with_context(|| format!("Could not create reflection '{}'", p.title))?;
                    status(&path, "created")
                },
            ),
            vault_operation(
                v,
                "create_daily_log",
                "Write the log for a day under daily_logs/, replacing an existing one",
                |vault, p: CreateDailyLogParams| async move {
                    let date = entry_date(p.date.as_deref())?;
                    let document = daily_log_document(&p, &date);
                    let path = vault.write(&document).await?;
                    status(&path, "written")
                },
            ),
        ]
    }
}
