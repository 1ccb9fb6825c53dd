//! The "Monthly Summary" collection.
//!
//! Holds Name, Month, Category and a one-directional relation to each
//! supporting collection (named after it). Rollup fields are added later
//! by [`crate::rollup`].

use anyhow::{bail, Result};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::ApiError;
use crate::inspect::discover_supporting_collections;
use crate::models::{CreateDatabaseRequest, PropertySchema, RelationKind};
use crate::schema::create_collection;
use crate::transport::{NotionApi, NotionClient};

pub const MONTHLY_SUMMARY: &str = "Monthly Summary";

pub fn monthly_summary_request(
    parent_page_id: &str,
    supporting: &BTreeMap<String, String>,
) -> CreateDatabaseRequest {
    let base = CreateDatabaseRequest::new(parent_page_id, MONTHLY_SUMMARY)
        .property("Month", PropertySchema::date())
        .property("Category", PropertySchema::select(&[]));

    supporting.iter().fold(base, |req, (name, id)| {
        req.property(name, PropertySchema::relation(id, RelationKind::Single))
    })
}

/// Create the Monthly Summary collection referencing `supporting`.
pub async fn create_monthly_summary_collection(
    api: &dyn NotionApi,
    parent_page_id: &str,
    supporting: &BTreeMap<String, String>,
) -> Result<String, ApiError> {
    let request = monthly_summary_request(parent_page_id, supporting);
    let id = create_collection(api, &request).await?;
    tracing::info!(collection = MONTHLY_SUMMARY, id = %id, "created collection");
    Ok(id)
}

/// `routine summary create`
///
/// Supporting ids come from `--collection NAME=ID` pairs when given,
/// otherwise they are discovered from the Daily Routine collection.
pub async fn run_create_summary(config: &Config, explicit: Vec<(String, String)>) -> Result<()> {
    let parent_page_id = config.require_parent_page_id()?;
    let daily_db_id = if explicit.is_empty() {
        Some(config.require_daily_routine_db_id()?)
    } else {
        None
    };
    let client = NotionClient::from_config(config)?;

    let supporting: BTreeMap<String, String> = match daily_db_id {
        Some(id) => discover_supporting_collections(&client, id).await?,
        None => explicit.into_iter().collect(),
    };
    if supporting.is_empty() {
        bail!("no supporting collections to reference");
    }

    let id = create_monthly_summary_collection(&client, parent_page_id, &supporting).await?;
    println!("{:<16} {}", MONTHLY_SUMMARY, id);
    println!("Set MONTHLY_SUMMARY_DB_ID={} and run `routine summary rollups`.", id);
    Ok(())
}
