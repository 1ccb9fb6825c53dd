//! Read-only schema inspection.
//!
//! [`discover_supporting_collections`] is the reference-discovery step shared
//! by the inspector and the rollup migrator: it reads the Daily Routine
//! schema and returns every relation field with its target collection.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{parse, Database};
use crate::schema::DAILY_ROUTINE;
use crate::transport::{NotionApi, NotionClient};

/// Fetch and decode a collection schema.
pub async fn fetch_database(api: &dyn NotionApi, collection_id: &str) -> Result<Database, ApiError> {
    let resp = api.get(&format!("/databases/{}", collection_id)).await?;
    parse(resp, "collection schema")
}

/// Relation field name → referenced collection id, from the Daily Routine schema.
///
/// Non-relation fields (Name, Date, Mood, Notes, Expense) are ignored.
pub async fn discover_supporting_collections(
    api: &dyn NotionApi,
    daily_db_id: &str,
) -> Result<BTreeMap<String, String>, ApiError> {
    let daily = fetch_database(api, daily_db_id).await?;
    let found = daily.relations();
    tracing::info!(count = found.len(), "discovered supporting collections");
    Ok(found)
}

/// Field name → field type tag (`"checkbox"`, `"relation"`, ...).
pub async fn list_field_types(
    api: &dyn NotionApi,
    collection_id: &str,
) -> Result<BTreeMap<String, String>, ApiError> {
    Ok(fetch_database(api, collection_id).await?.field_types())
}

/// One inspected collection, as printed by `routine inspect --json`.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub name: String,
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

/// Inspect the Daily Routine collection and every collection it references.
///
/// A collection whose schema cannot be read is logged and left out.
pub async fn inspect_workspace(
    api: &dyn NotionApi,
    daily_db_id: &str,
) -> Result<Vec<CollectionReport>, ApiError> {
    let daily = fetch_database(api, daily_db_id).await?;
    let mut reports = vec![CollectionReport {
        name: DAILY_ROUTINE.to_string(),
        id: daily.id.clone(),
        fields: daily.field_types(),
    }];

    for (name, id) in daily.relations() {
        match list_field_types(api, &id).await {
            Ok(fields) => reports.push(CollectionReport { name, id, fields }),
            Err(e) => tracing::warn!(collection = %name, error = %e, "skipping collection"),
        }
    }

    Ok(reports)
}

/// `routine inspect`
pub async fn run_inspect(config: &Config, json: bool) -> Result<()> {
    let daily_db_id = config.require_daily_routine_db_id()?;
    let client = NotionClient::from_config(config)?;

    let reports = inspect_workspace(&client, daily_db_id)
        .await
        .context("failed to read the Daily Routine collection")?;

    let output = if json {
        render_json_lines(&reports)?
    } else {
        render_text(&reports)
    };
    print!("{}", output);
    Ok(())
}

/// One compact JSON object per collection, newline-terminated.
pub fn render_json_lines(reports: &[CollectionReport]) -> serde_json::Result<String> {
    let mut out = String::new();
    for report in reports {
        out.push_str(&serde_json::to_string(report)?);
        out.push('\n');
    }
    Ok(out)
}

/// Collection heading followed by `  - field: type` lines; blank line between collections.
pub fn render_text(reports: &[CollectionReport]) -> String {
    let mut out = String::new();
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{} ({})\n", report.name, report.id));
        for (field, kind) in &report.fields {
            out.push_str(&format!("  - {}: {}\n", field, kind));
        }
    }
    out
}
