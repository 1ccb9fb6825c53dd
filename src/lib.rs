//! # Notion Routine
//!
//! Provisions and maintains a daily-routine productivity workspace in Notion.
//!
//! The workspace consists of five supporting collections (Books, Podcasts,
//! Recipes, Exercise, Monthly Budget), a "Daily Routine" collection that
//! references each of them, and a "Monthly Summary" collection carrying
//! rollups over the supporting collections. Every step is safe to repeat
//! where it checks first: budget records are looked up by title and rollup
//! fields are added only when their label is absent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌─────────┐
//! │  schema  │──▶│   seed   │   │ inspect │
//! └────┬─────┘   └────┬─────┘   └────┬────┘
//!      │              │              │ discover
//!      │   ┌──────────┼──────────────┤
//!      │   ▼          │              ▼
//!      │ ┌─────────┐  │        ┌──────────┐
//!      │ │ summary │  │        │  rollup  │
//!      │ └────┬────┘  │        └────┬─────┘
//!      ▼      ▼       ▼             ▼
//! ┌──────────────────────────────────────┐
//! │  transport (NotionApi / reqwest)     │
//! └──────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export NOTION_API_KEY=secret_...
//! export NOTION_PAGE_ID=...
//! routine setup                 # collections + today's entries
//! routine summary create        # Monthly Summary collection
//! routine summary rollups       # add missing rollup fields
//! routine inspect               # print every schema
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`error`] | Typed request and provisioning errors |
//! | [`models`] | Typed request/response models |
//! | [`transport`] | The `NotionApi` seam and its HTTP client |
//! | [`schema`] | Supporting and Daily Routine collections |
//! | [`seed`] | Budget and daily records |
//! | [`summary`] | Monthly Summary collection |
//! | [`rollup`] | Incremental rollup migration |
//! | [`inspect`] | Reference discovery and schema dump |

pub mod config;
pub mod error;
pub mod inspect;
pub mod models;
pub mod rollup;
pub mod schema;
pub mod seed;
pub mod summary;
pub mod transport;
