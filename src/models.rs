//! Typed request and response models for the Notion API.
//!
//! Request models are validated before they are serialized, so a
//! malformed property name or an empty relation target is rejected
//! locally instead of reaching the network.
//!
//! Schema definitions ([`PropertySchema`]) and record values
//! ([`PropertyValue`]) both serialize to the service's single-key shape:
//!
//! ```text
//! { "Completed": { "checkbox": {} } }                          // schema
//! { "Name": { "title": [ { "text": { "content": "..." } } ] } } // value
//! ```

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ApiError;

/// Every collection's title field carries this name.
pub const TITLE_FIELD: &str = "Name";

// ═══════════════════════════════════════════════════════════════════════
// Schema definitions
// ═══════════════════════════════════════════════════════════════════════

/// Serializes as `{}`; used for field types that take no options.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Empty {}

/// Field definition used when creating or patching a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySchema {
    Title(Empty),
    RichText(Empty),
    Checkbox(Empty),
    Number(NumberConfig),
    Date(Empty),
    Select(SelectConfig),
    Relation(RelationConfig),
    Rollup(RollupConfig),
}

impl PropertySchema {
    pub fn title() -> Self {
        Self::Title(Empty {})
    }

    pub fn rich_text() -> Self {
        Self::RichText(Empty {})
    }

    pub fn checkbox() -> Self {
        Self::Checkbox(Empty {})
    }

    pub fn number() -> Self {
        Self::Number(NumberConfig {
            format: "number".to_string(),
        })
    }

    pub fn date() -> Self {
        Self::Date(Empty {})
    }

    pub fn select(options: &[(&str, &str)]) -> Self {
        Self::Select(SelectConfig {
            options: options
                .iter()
                .map(|(name, color)| SelectOption {
                    name: name.to_string(),
                    color: color.to_string(),
                })
                .collect(),
        })
    }

    pub fn relation(database_id: &str, kind: RelationKind) -> Self {
        Self::Relation(RelationConfig {
            database_id: database_id.to_string(),
            kind,
        })
    }

    pub fn rollup(relation: &str, source: &str, function: RollupFunction) -> Self {
        Self::Rollup(RollupConfig {
            relation_property_name: relation.to_string(),
            rollup_property_name: source.to_string(),
            function,
        })
    }

    fn validate(&self, name: &str) -> Result<(), ApiError> {
        match self {
            Self::Relation(rel) if rel.database_id.trim().is_empty() => Err(
                ApiError::InvalidRequest(format!("relation '{}' has an empty database id", name)),
            ),
            Self::Rollup(r)
                if r.relation_property_name.trim().is_empty()
                    || r.rollup_property_name.trim().is_empty() =>
            {
                Err(ApiError::InvalidRequest(format!(
                    "rollup '{}' must name both a relation and a source field",
                    name
                )))
            }
            Self::Select(sel) if sel.options.iter().any(|o| o.name.trim().is_empty()) => Err(
                ApiError::InvalidRequest(format!("select '{}' has an unnamed option", name)),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberConfig {
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub name: String,
    pub color: String,
}

/// Whether a relation also appears on the referenced collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Visible from both sides (`dual_property`).
    Dual,
    /// Visible only on the collection that declares it (`single_property`).
    Single,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dual => "dual_property",
            Self::Single => "single_property",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationConfig {
    pub database_id: String,
    pub kind: RelationKind,
}

impl Serialize for RelationConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("database_id", &self.database_id)?;
        map.serialize_entry("type", self.kind.as_str())?;
        map.serialize_entry(self.kind.as_str(), &Empty {})?;
        map.end()
    }
}

/// Aggregate applied over the records reached through a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupFunction {
    PercentChecked,
    PercentUnchecked,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupConfig {
    pub relation_property_name: String,
    pub rollup_property_name: String,
    pub function: RollupFunction,
}

// ═══════════════════════════════════════════════════════════════════════
// Record values
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichTextItem {
    pub text: TextContent,
}

impl RichTextItem {
    fn plain(content: &str) -> Self {
        Self {
            text: TextContent {
                content: content.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateValue {
    pub start: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectValue {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRef {
    pub id: String,
}

/// Value of one field on a record being created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichTextItem>),
    RichText(Vec<RichTextItem>),
    Number(f64),
    Date(DateValue),
    Select(SelectValue),
    Relation(Vec<PageRef>),
}

impl PropertyValue {
    pub fn title(text: &str) -> Self {
        Self::Title(vec![RichTextItem::plain(text)])
    }

    pub fn rich_text(text: &str) -> Self {
        Self::RichText(vec![RichTextItem::plain(text)])
    }

    pub fn date(date: NaiveDate) -> Self {
        Self::Date(DateValue {
            start: date.format("%Y-%m-%d").to_string(),
        })
    }

    pub fn select(name: &str) -> Self {
        Self::Select(SelectValue {
            name: name.to_string(),
        })
    }

    pub fn relation(ids: &[&str]) -> Self {
        Self::Relation(
            ids.iter()
                .map(|id| PageRef { id: id.to_string() })
                .collect(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageParent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub page_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleText {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextContent,
}

/// `POST /databases`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDatabaseRequest {
    pub parent: PageParent,
    pub title: Vec<TitleText>,
    pub properties: BTreeMap<String, PropertySchema>,
}

impl CreateDatabaseRequest {
    /// Start a collection definition with the required `Name` title field.
    pub fn new(parent_page_id: &str, title: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(TITLE_FIELD.to_string(), PropertySchema::title());
        Self {
            parent: PageParent {
                kind: "page_id",
                page_id: parent_page_id.to_string(),
            },
            title: vec![TitleText {
                kind: "text",
                text: TextContent {
                    content: title.to_string(),
                },
            }],
            properties,
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn name(&self) -> &str {
        self.title
            .first()
            .map(|t| t.text.content.as_str())
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.parent.page_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("parent page id is empty".into()));
        }
        if self.name().trim().is_empty() {
            return Err(ApiError::InvalidRequest("collection title is empty".into()));
        }
        validate_names(self.properties.keys())?;

        for (name, schema) in &self.properties {
            if matches!(schema, PropertySchema::Title(_)) && name != TITLE_FIELD {
                return Err(ApiError::InvalidRequest(format!(
                    "title field must be named '{}', got '{}'",
                    TITLE_FIELD, name
                )));
            }
            schema.validate(name)?;
        }
        if !matches!(self.properties.get(TITLE_FIELD), Some(PropertySchema::Title(_))) {
            return Err(ApiError::InvalidRequest(format!(
                "collection '{}' has no '{}' title field",
                self.name(),
                TITLE_FIELD
            )));
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, ApiError> {
        self.validate()?;
        to_value(self)
    }
}

/// `PATCH /databases/{id}`; adds or replaces the listed fields only.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UpdateDatabaseRequest {
    pub properties: BTreeMap<String, PropertySchema>,
}

impl UpdateDatabaseRequest {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.properties.is_empty() {
            return Err(ApiError::InvalidRequest("update has no properties".into()));
        }
        validate_names(self.properties.keys())?;
        for (name, schema) in &self.properties {
            if matches!(schema, PropertySchema::Title(_)) {
                return Err(ApiError::InvalidRequest(format!(
                    "update must not redefine the title field ('{}')",
                    name
                )));
            }
            schema.validate(name)?;
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, ApiError> {
        self.validate()?;
        to_value(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseParent {
    pub database_id: String,
}

/// `POST /pages` with a collection parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePageRequest {
    pub parent: DatabaseParent,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl CreatePageRequest {
    pub fn new(database_id: &str, title: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(TITLE_FIELD.to_string(), PropertyValue::title(title));
        Self {
            parent: DatabaseParent {
                database_id: database_id.to_string(),
            },
            properties,
        }
    }

    pub fn property(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.parent.database_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("parent database id is empty".into()));
        }
        validate_names(self.properties.keys())?;
        for (name, value) in &self.properties {
            if let PropertyValue::Relation(refs) = value {
                if refs.iter().any(|r| r.id.trim().is_empty()) {
                    return Err(ApiError::InvalidRequest(format!(
                        "relation '{}' references an empty page id",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, ApiError> {
        self.validate()?;
        to_value(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleEquals {
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleFilter {
    pub property: String,
    pub title: TitleEquals,
}

/// `POST /databases/{id}/query` filtered on the title field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDatabaseRequest {
    pub filter: TitleFilter,
}

impl QueryDatabaseRequest {
    pub fn title_equals(value: &str) -> Self {
        Self {
            filter: TitleFilter {
                property: TITLE_FIELD.to_string(),
                title: TitleEquals {
                    equals: value.to_string(),
                },
            },
        }
    }

    pub fn to_body(&self) -> Result<Value, ApiError> {
        if self.filter.title.equals.trim().is_empty() {
            return Err(ApiError::InvalidRequest("title filter value is empty".into()));
        }
        to_value(self)
    }
}

fn validate_names<'a>(names: impl Iterator<Item = &'a String>) -> Result<(), ApiError> {
    for name in names {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("property name is empty".into()));
        }
        if name.trim() != name {
            return Err(ApiError::InvalidRequest(format!(
                "property name '{}' has surrounding whitespace",
                name
            )));
        }
    }
    Ok(())
}

fn to_value<T: Serialize>(model: &T) -> Result<Value, ApiError> {
    serde_json::to_value(model).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════
// Responses
// ═══════════════════════════════════════════════════════════════════════

/// Collection schema as returned by `GET /databases/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyInfo>,
}

impl Database {
    /// Relation fields keyed by field name, valued by target collection id.
    pub fn relations(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .filter(|(_, info)| info.kind == "relation")
            .filter_map(|(name, info)| {
                info.relation
                    .as_ref()
                    .map(|rel| (name.clone(), rel.database_id.clone()))
            })
            .collect()
    }

    pub fn field_types(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .map(|(name, info)| (name.clone(), info.kind.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyInfo {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub relation: Option<RelationInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationInfo {
    pub database_id: String,
}

/// A created or queried record (or a created collection); only the id is used.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
}

/// Decode a response body into a model, naming `what` in the error.
pub fn parse<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::UnexpectedResponse(format!("{}: {}", what, e)))
}
