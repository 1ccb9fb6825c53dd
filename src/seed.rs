//! Seeding of the current period's budget record and today's routine record.
//!
//! The budget record is keyed by its title (e.g. `"September 2025"`) and is
//! only created when a title query finds nothing. The routine record is
//! created on every call: running setup twice on the same day yields two
//! "Daily Routine - <date>" records.
//!
//! Both checks are read-then-write against the remote service. Two runs
//! racing each other can both miss the budget record and both create one.

use anyhow::Context;
use chrono::{Local, NaiveDate};

use crate::config::Config;
use crate::error::ApiError;
use crate::inspect::discover_supporting_collections;
use crate::models::{
    parse, CreatePageRequest, Page, PropertyValue, QueryDatabaseRequest, QueryResponse,
};
use crate::schema::{SupportingCollection, SupportingIds};
use crate::transport::{NotionApi, NotionClient};

/// Title of a budget record: full month name and four-digit year.
pub fn period_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Title of a daily routine record: `Daily Routine - YYYY-MM-DD`.
pub fn daily_title(date: NaiveDate) -> String {
    format!("Daily Routine - {}", date.format("%Y-%m-%d"))
}

async fn create_page(api: &dyn NotionApi, request: &CreatePageRequest) -> Result<String, ApiError> {
    let body = request.to_body()?;
    let resp = api.post("/pages", body).await?;
    let page: Page = parse(resp, "created page")?;
    Ok(page.id)
}

/// Return the id of the budget record titled `label`, creating it if absent.
///
/// A new record starts with `Budget = 0` and `Spent = 0`.
pub async fn ensure_monthly_budget_record(
    api: &dyn NotionApi,
    budget_db_id: &str,
    label: &str,
) -> Result<String, ApiError> {
    let query = QueryDatabaseRequest::title_equals(label).to_body()?;
    let resp = api
        .post(&format!("/databases/{}/query", budget_db_id), query)
        .await?;
    let found: QueryResponse = parse(resp, "budget query")?;

    if let Some(existing) = found.results.into_iter().next() {
        tracing::debug!(period = label, id = %existing.id, "budget record already exists");
        return Ok(existing.id);
    }

    let request = CreatePageRequest::new(budget_db_id, label)
        .property("Budget", PropertyValue::Number(0.0))
        .property("Spent", PropertyValue::Number(0.0));
    let id = create_page(api, &request).await?;
    tracing::info!(period = label, id = %id, "created budget record");
    Ok(id)
}

/// Create today's Daily Routine record.
///
/// Not idempotent: no lookup precedes the create.
pub async fn ensure_daily_routine_record(
    api: &dyn NotionApi,
    daily_db_id: &str,
    date: NaiveDate,
    budget_record_id: Option<&str>,
) -> Result<String, ApiError> {
    let mut request = CreatePageRequest::new(daily_db_id, &daily_title(date))
        .property("Date", PropertyValue::date(date))
        .property("Mood", PropertyValue::select("Neutral"))
        .property("Notes", PropertyValue::rich_text(""))
        .property("Expense", PropertyValue::Number(0.0));

    if let Some(budget_id) = budget_record_id {
        request = request.property(
            SupportingCollection::MonthlyBudget.name(),
            PropertyValue::relation(&[budget_id]),
        );
    }

    let id = create_page(api, &request).await?;
    tracing::info!(id = %id, date = %date, "created daily routine record");
    Ok(id)
}

/// Ids produced by [`seed_entries`]; `None` where a step was skipped or failed.
#[derive(Debug, Clone, Default)]
pub struct SeededEntries {
    pub budget_record_id: Option<String>,
    pub daily_record_id: Option<String>,
}

/// Ensure the budget record for `date`'s month, then create the day's record.
///
/// The budget step is skipped when the Monthly Budget collection was not
/// created; if it fails, the daily record is still created without the
/// budget relation.
pub async fn seed_entries(
    api: &dyn NotionApi,
    daily_db_id: &str,
    supporting: &SupportingIds,
    date: NaiveDate,
) -> SeededEntries {
    let budget_db_id = supporting
        .get(SupportingCollection::MonthlyBudget.name())
        .and_then(|id| id.as_deref());

    let budget_record_id = match budget_db_id {
        Some(db_id) => match ensure_monthly_budget_record(api, db_id, &period_label(date)).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "budget record unavailable; daily record will not link it");
                None
            }
        },
        None => None,
    };

    let daily_record_id =
        match ensure_daily_routine_record(api, daily_db_id, date, budget_record_id.as_deref())
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %e, "daily routine record was not created");
                None
            }
        };

    SeededEntries {
        budget_record_id,
        daily_record_id,
    }
}

/// `routine seed`: find the budget collection through the Daily Routine
/// relations, then seed today's entries.
pub async fn run_seed(config: &Config) -> anyhow::Result<()> {
    let daily_db_id = config.require_daily_routine_db_id()?;
    let client = NotionClient::from_config(config)?;

    let supporting: SupportingIds = discover_supporting_collections(&client, daily_db_id)
        .await
        .context("failed to discover supporting collections")?
        .into_iter()
        .map(|(name, id)| (name, Some(id)))
        .collect();

    let seeded = seed_entries(&client, daily_db_id, &supporting, Local::now().date_naive()).await;
    if let Some(id) = seeded.budget_record_id {
        println!("budget record:   {}", id);
    }
    match seeded.daily_record_id {
        Some(id) => println!("daily record:    {}", id),
        None => anyhow::bail!("daily routine record was not created"),
    }
    Ok(())
}
