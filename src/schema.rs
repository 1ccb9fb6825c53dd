//! Schema provisioning: the five supporting collections and the
//! "Daily Routine" collection that references each of them.
//!
//! # Collections
//!
//! | Collection | Fields (besides `Name`) | Progress field |
//! |-----------|-------------------------|----------------|
//! | Books | Author (text), Completed (checkbox) | Completed |
//! | Podcasts | Host (text), Listened (checkbox) | Listened |
//! | Recipes | Ingredients (text), Tried (checkbox) | Tried |
//! | Exercise | Duration (min) (number), Calories Burned (number) | Calories Burned |
//! | Monthly Budget | Budget (number), Spent (number) | Spent |
//!
//! Daily Routine carries Date, Mood (Happy/Neutral/Sad), Notes, Expense
//! and one bidirectional relation per supporting collection, named after
//! the collection.

use anyhow::Result;
use chrono::Local;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::{ApiError, ProvisionError};
use crate::models::{parse, CreateDatabaseRequest, Page, PropertySchema, RelationKind};
use crate::seed;
use crate::transport::{NotionApi, NotionClient};

/// Title of the primary collection.
pub const DAILY_ROUTINE: &str = "Daily Routine";

/// Supporting collection name → created id, `None` where creation failed.
pub type SupportingIds = BTreeMap<String, Option<String>>;

/// One of the five collections the Daily Routine references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportingCollection {
    Books,
    Podcasts,
    Recipes,
    Exercise,
    MonthlyBudget,
}

impl SupportingCollection {
    pub const ALL: [SupportingCollection; 5] = [
        Self::Books,
        Self::Podcasts,
        Self::Recipes,
        Self::Exercise,
        Self::MonthlyBudget,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Books => "Books",
            Self::Podcasts => "Podcasts",
            Self::Recipes => "Recipes",
            Self::Exercise => "Exercise",
            Self::MonthlyBudget => "Monthly Budget",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// The checkbox or number field later used as a rollup source.
    pub const fn progress_field(&self) -> &'static str {
        match self {
            Self::Books => "Completed",
            Self::Podcasts => "Listened",
            Self::Recipes => "Tried",
            Self::Exercise => "Calories Burned",
            Self::MonthlyBudget => "Spent",
        }
    }

    /// Fields added alongside the `Name` title.
    pub fn fields(&self) -> Vec<(&'static str, PropertySchema)> {
        match self {
            Self::Books => vec![
                ("Author", PropertySchema::rich_text()),
                ("Completed", PropertySchema::checkbox()),
            ],
            Self::Podcasts => vec![
                ("Host", PropertySchema::rich_text()),
                ("Listened", PropertySchema::checkbox()),
            ],
            Self::Recipes => vec![
                ("Ingredients", PropertySchema::rich_text()),
                ("Tried", PropertySchema::checkbox()),
            ],
            Self::Exercise => vec![
                ("Duration (min)", PropertySchema::number()),
                ("Calories Burned", PropertySchema::number()),
            ],
            Self::MonthlyBudget => vec![
                ("Budget", PropertySchema::number()),
                ("Spent", PropertySchema::number()),
            ],
        }
    }

    pub fn create_request(&self, parent_page_id: &str) -> CreateDatabaseRequest {
        self.fields()
            .into_iter()
            .fold(CreateDatabaseRequest::new(parent_page_id, self.name()), |req, (name, schema)| {
                req.property(name, schema)
            })
    }
}

/// Send a collection create request and return the new collection id.
pub async fn create_collection(
    api: &dyn NotionApi,
    request: &CreateDatabaseRequest,
) -> Result<String, ApiError> {
    let body: Value = request.to_body()?;
    let resp = api.post("/databases", body).await?;
    let created: Page = parse(resp, "created collection")?;
    Ok(created.id)
}

/// Create the five supporting collections under `parent_page_id`.
///
/// Issues exactly one create call per collection. A failed create is
/// logged and recorded as `None`; the remaining collections are still
/// attempted.
pub async fn create_supporting_collections(
    api: &dyn NotionApi,
    parent_page_id: &str,
) -> SupportingIds {
    let mut ids = SupportingIds::new();

    for collection in SupportingCollection::ALL {
        let request = collection.create_request(parent_page_id);
        let id = match create_collection(api, &request).await {
            Ok(id) => {
                tracing::info!(collection = collection.name(), id = %id, "created collection");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(collection = collection.name(), error = %e, "failed to create collection");
                None
            }
        };
        ids.insert(collection.name().to_string(), id);
    }

    ids
}

/// Build the Daily Routine collection definition.
///
/// # Errors
///
/// [`ProvisionError::MissingCollection`] if any supporting collection has
/// no id; a relation to a collection that does not exist is never sent.
pub fn daily_routine_request(
    parent_page_id: &str,
    supporting: &SupportingIds,
) -> Result<CreateDatabaseRequest, ProvisionError> {
    let mut request = CreateDatabaseRequest::new(parent_page_id, DAILY_ROUTINE)
        .property("Date", PropertySchema::date())
        .property(
            "Mood",
            PropertySchema::select(&[("Happy", "green"), ("Neutral", "blue"), ("Sad", "red")]),
        )
        .property("Notes", PropertySchema::rich_text())
        .property("Expense", PropertySchema::number());

    for collection in SupportingCollection::ALL {
        let id = supporting
            .get(collection.name())
            .and_then(|id| id.as_deref())
            .ok_or_else(|| ProvisionError::MissingCollection(collection.name().to_string()))?;
        request = request.property(
            collection.name(),
            PropertySchema::relation(id, RelationKind::Dual),
        );
    }

    Ok(request)
}

/// Create the Daily Routine collection wired to every supporting collection.
pub async fn create_daily_routine_collection(
    api: &dyn NotionApi,
    parent_page_id: &str,
    supporting: &SupportingIds,
) -> Result<String, ProvisionError> {
    let request = daily_routine_request(parent_page_id, supporting)?;
    let id = create_collection(api, &request).await?;
    tracing::info!(collection = DAILY_ROUTINE, id = %id, "created collection");
    Ok(id)
}

/// `routine setup`: create all collections, then seed today's entries.
pub async fn run_setup(config: &Config) -> Result<()> {
    let parent_page_id = config.require_parent_page_id()?;
    let client = NotionClient::from_config(config)?;

    tracing::info!(parent = parent_page_id, "starting daily routine setup");

    let supporting = create_supporting_collections(&client, parent_page_id).await;
    for (name, id) in &supporting {
        match id {
            Some(id) => println!("{:<16} {}", name, id),
            None => println!("{:<16} FAILED", name),
        }
    }

    let daily_id = match create_daily_routine_collection(&client, parent_page_id, &supporting).await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Daily Routine collection was not created");
            println!("{:<16} FAILED", DAILY_ROUTINE);
            anyhow::bail!("setup incomplete: {}", e);
        }
    };
    println!("{:<16} {}", DAILY_ROUTINE, daily_id);

    let today = Local::now().date_naive();
    let seeded = seed::seed_entries(&client, &daily_id, &supporting, today).await;
    if let Some(ref id) = seeded.budget_record_id {
        println!("budget record:   {}", id);
    }
    match seeded.daily_record_id {
        Some(id) => println!("daily record:    {}", id),
        None => println!("daily record:    FAILED"),
    }

    println!("Setup complete. Set DAILY_ROUTINE_DB_ID={} for later commands.", daily_id);
    Ok(())
}
