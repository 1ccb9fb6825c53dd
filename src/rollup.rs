//! Incremental rollup migration for the Monthly Summary collection.
//!
//! Each [`RollupRule`] binds a fixed, emoji-prefixed label to a source
//! field on a supporting collection. A rule is staged only when its source
//! field exists and its label is not yet on the summary; all staged
//! fields go out in one PATCH. Once every label exists a run issues no
//! mutation at all.
//!
//! Labels are the only duplicate guard: the service itself accepts a
//! second field with the same rollup definition under another name.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::error::ApiError;
use crate::inspect::{discover_supporting_collections, fetch_database};
use crate::models::{PropertySchema, RollupFunction, UpdateDatabaseRequest};
use crate::schema::SupportingCollection;
use crate::transport::{NotionApi, NotionClient};

/// One rollup field on the Monthly Summary collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupRule {
    /// Supporting collection; also the name of the summary's relation field.
    pub collection: SupportingCollection,
    /// Always the collection's [`SupportingCollection::progress_field`].
    pub source_field: &'static str,
    pub label: &'static str,
    pub function: RollupFunction,
}

impl RollupRule {
    pub fn schema(&self) -> PropertySchema {
        PropertySchema::rollup(self.collection.name(), self.source_field, self.function)
    }
}

pub const RULES: [RollupRule; 7] = [
    RollupRule {
        collection: SupportingCollection::Books,
        source_field: SupportingCollection::Books.progress_field(),
        label: "📚 Books Completed %",
        function: RollupFunction::PercentChecked,
    },
    RollupRule {
        collection: SupportingCollection::Books,
        source_field: SupportingCollection::Books.progress_field(),
        label: "📚 Books In Progress %",
        function: RollupFunction::PercentUnchecked,
    },
    RollupRule {
        collection: SupportingCollection::Podcasts,
        source_field: SupportingCollection::Podcasts.progress_field(),
        label: "🎧 Podcasts Completed %",
        function: RollupFunction::PercentChecked,
    },
    RollupRule {
        collection: SupportingCollection::Podcasts,
        source_field: SupportingCollection::Podcasts.progress_field(),
        label: "🎧 Podcasts In Progress %",
        function: RollupFunction::PercentUnchecked,
    },
    RollupRule {
        collection: SupportingCollection::Recipes,
        source_field: SupportingCollection::Recipes.progress_field(),
        label: "🍳 Recipes Tried %",
        function: RollupFunction::PercentChecked,
    },
    RollupRule {
        collection: SupportingCollection::Exercise,
        source_field: SupportingCollection::Exercise.progress_field(),
        label: "🏋️ Exercise Calories",
        function: RollupFunction::Sum,
    },
    RollupRule {
        collection: SupportingCollection::MonthlyBudget,
        source_field: SupportingCollection::MonthlyBudget.progress_field(),
        label: "💰 Budget Spent",
        function: RollupFunction::Sum,
    },
];

/// Result of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollupOutcome {
    /// Nothing staged; no request was sent.
    UpToDate,
    /// Labels added by the single PATCH.
    Added(Vec<String>),
}

/// Stage the rollup fields that are missing from the summary.
///
/// `supporting_fields` maps a supporting collection name to the field names
/// its schema currently has; collections absent from the map contribute
/// nothing.
pub fn plan_rollups(
    existing_labels: &BTreeSet<String>,
    supporting_fields: &BTreeMap<String, BTreeSet<String>>,
) -> UpdateDatabaseRequest {
    let mut update = UpdateDatabaseRequest::default();

    for rule in RULES.iter() {
        let Some(fields) = supporting_fields.get(rule.collection.name()) else {
            continue;
        };
        if !fields.contains(rule.source_field) || existing_labels.contains(rule.label) {
            continue;
        }
        update
            .properties
            .insert(rule.label.to_string(), rule.schema());
    }

    update
}

/// Add every missing rollup field to the Monthly Summary collection.
///
/// Reads the summary schema, then each referenced supporting collection's
/// schema once. A supporting collection whose schema cannot be read is
/// skipped; a summary that cannot be read aborts the run without changes.
pub async fn add_missing_rollups(
    api: &dyn NotionApi,
    summary_db_id: &str,
    supporting: &BTreeMap<String, String>,
) -> Result<RollupOutcome, ApiError> {
    let summary = fetch_database(api, summary_db_id).await?;
    let existing: BTreeSet<String> = summary.properties.keys().cloned().collect();

    let mut supporting_fields = BTreeMap::new();
    for collection in SupportingCollection::ALL {
        let Some(id) = supporting.get(collection.name()) else {
            continue;
        };
        match fetch_database(api, id).await {
            Ok(db) => {
                supporting_fields.insert(
                    collection.name().to_string(),
                    db.properties.keys().cloned().collect::<BTreeSet<_>>(),
                );
            }
            Err(e) => {
                tracing::warn!(collection = collection.name(), error = %e, "skipping rollups for collection");
            }
        }
    }

    let update = plan_rollups(&existing, &supporting_fields);
    if update.is_empty() {
        tracing::info!("no new rollups to add");
        return Ok(RollupOutcome::UpToDate);
    }

    let labels: Vec<String> = update.properties.keys().cloned().collect();
    api.patch(&format!("/databases/{}", summary_db_id), update.to_body()?)
        .await?;
    tracing::info!(count = labels.len(), "added rollups to Monthly Summary");
    Ok(RollupOutcome::Added(labels))
}

/// `routine summary rollups`
pub async fn run_rollups(config: &Config) -> Result<()> {
    let daily_db_id = config.require_daily_routine_db_id()?;
    let summary_db_id = config.require_monthly_summary_db_id()?;
    let client = NotionClient::from_config(config)?;

    let supporting = discover_supporting_collections(&client, daily_db_id)
        .await
        .context("failed to discover supporting collections")?;

    match add_missing_rollups(&client, summary_db_id, &supporting).await? {
        RollupOutcome::UpToDate => println!("Monthly Summary is up to date."),
        RollupOutcome::Added(labels) => {
            for label in &labels {
                println!("added  {}", label);
            }
            println!("Added {} rollup(s) to Monthly Summary.", labels.len());
        }
    }
    Ok(())
}
