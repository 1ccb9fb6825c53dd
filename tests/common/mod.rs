//! In-memory stand-in for the Notion API.
//!
//! Stores collections and records, answers the five routes the crate uses,
//! and records every call so tests can count creates and patches.

#![allow(dead_code)]

use async_trait::async_trait;
use notion_routine::error::ApiError;
use notion_routine::transport::NotionApi;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    next_id: usize,
    databases: BTreeMap<String, Value>,
    /// (collection id, record id, properties)
    pages: Vec<(String, String, Value)>,
    calls: Vec<Call>,
    fail_create_titles: HashSet<String>,
    fail_get_ids: HashSet<String>,
}

#[derive(Default)]
pub struct FakeNotion {
    state: Mutex<State>,
}

impl FakeNotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `POST /databases` fail for collections with this title.
    pub fn fail_create(&self, title: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_create_titles
            .insert(title.to_string());
    }

    /// Make `GET /databases/{id}` fail for this id.
    pub fn fail_get(&self, id: &str) {
        self.state.lock().unwrap().fail_get_ids.insert(id.to_string());
    }

    /// Insert a collection directly, bypassing the call log.
    ///
    /// `properties` uses the create shape: `{ "Done": { "checkbox": {} } }`.
    pub fn add_database(&self, title: &str, properties: Value) -> String {
        let mut state = self.state.lock().unwrap();
        let id = next_id(&mut state, "db");
        let db = json!({
            "object": "database",
            "id": id,
            "title": [ { "type": "text", "text": { "content": title } } ],
            "properties": to_schema(&properties),
        });
        state.databases.insert(id.clone(), db);
        id
    }

    /// Insert a record directly, bypassing the call log.
    pub fn add_page(&self, database_id: &str, title: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = next_id(&mut state, "page");
        let props = json!({ "Name": { "title": [ { "text": { "content": title } } ] } });
        state.pages.push((database_id.to_string(), id.clone(), props));
        id
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn last_call(&self, method: &str, path: &str) -> Option<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .last()
    }

    pub fn database(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().databases.get(id).cloned()
    }

    /// Records stored in a collection, as (id, properties).
    pub fn pages_in(&self, database_id: &str) -> Vec<(String, Value)> {
        self.state
            .lock()
            .unwrap()
            .pages
            .iter()
            .filter(|(db, _, _)| db == database_id)
            .map(|(_, id, props)| (id.clone(), props.clone()))
            .collect()
    }
}

fn next_id(state: &mut State, prefix: &str) -> String {
    state.next_id += 1;
    format!("{}-{}", prefix, state.next_id)
}

/// `{ "X": { "checkbox": {} } }` → `{ "X": { "id": .., "name": "X", "type": "checkbox", "checkbox": {} } }`
fn to_schema(properties: &Value) -> Value {
    let mut out = Map::new();
    if let Some(obj) = properties.as_object() {
        for (name, def) in obj {
            let (kind, config) = def
                .as_object()
                .and_then(|d| d.iter().next())
                .map(|(k, v)| (k.clone(), v.clone()))
                .unwrap_or_else(|| ("unknown".to_string(), json!({})));
            let mut entry = Map::new();
            entry.insert("id".into(), json!(format!("prop-{}", name.len())));
            entry.insert("name".into(), json!(name));
            entry.insert("type".into(), json!(kind));
            entry.insert(kind, config);
            out.insert(name.clone(), Value::Object(entry));
        }
    }
    Value::Object(out)
}

fn title_of(props: &Value) -> Option<&str> {
    props["Name"]["title"][0]["text"]["content"].as_str()
}

fn failed(method: &'static str, path: &str, status: u16, message: &str) -> ApiError {
    ApiError::RequestFailed {
        method,
        url: path.to_string(),
        status: Some(status),
        message: message.to_string(),
    }
}

#[async_trait]
impl NotionApi for FakeNotion {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method: "GET",
            path: path.to_string(),
            body: None,
        });

        let id = path
            .strip_prefix("/databases/")
            .ok_or_else(|| failed("GET", path, 404, "unknown route"))?;
        if state.fail_get_ids.contains(id) {
            return Err(failed("GET", path, 500, "injected failure"));
        }
        state
            .databases
            .get(id)
            .cloned()
            .ok_or_else(|| failed("GET", path, 404, "object_not_found"))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method: "POST",
            path: path.to_string(),
            body: Some(body.clone()),
        });

        if path == "/databases" {
            let title = body["title"][0]["text"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            if state.fail_create_titles.contains(&title) {
                return Err(failed("POST", path, 400, "validation_error"));
            }
            let id = next_id(&mut state, "db");
            let db = json!({
                "object": "database",
                "id": id,
                "title": body["title"].clone(),
                "properties": to_schema(&body["properties"]),
            });
            state.databases.insert(id.clone(), db.clone());
            return Ok(db);
        }

        if path == "/pages" {
            let db_id = body["parent"]["database_id"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            if !state.databases.contains_key(&db_id) {
                return Err(failed("POST", path, 404, "object_not_found"));
            }
            let id = next_id(&mut state, "page");
            state
                .pages
                .push((db_id, id.clone(), body["properties"].clone()));
            return Ok(json!({ "object": "page", "id": id }));
        }

        if let Some(db_id) = path
            .strip_prefix("/databases/")
            .and_then(|rest| rest.strip_suffix("/query"))
        {
            if !state.databases.contains_key(db_id) {
                return Err(failed("POST", path, 404, "object_not_found"));
            }
            let wanted = body["filter"]["title"]["equals"].as_str();
            let results: Vec<Value> = state
                .pages
                .iter()
                .filter(|(db, _, props)| db == db_id && title_of(props) == wanted)
                .map(|(_, id, _)| json!({ "object": "page", "id": id }))
                .collect();
            return Ok(json!({ "object": "list", "results": results }));
        }

        Err(failed("POST", path, 404, "unknown route"))
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method: "PATCH",
            path: path.to_string(),
            body: Some(body.clone()),
        });

        let id = path
            .strip_prefix("/databases/")
            .ok_or_else(|| failed("PATCH", path, 404, "unknown route"))?
            .to_string();
        let db = state
            .databases
            .get_mut(&id)
            .ok_or_else(|| failed("PATCH", path, 404, "object_not_found"))?;

        let added = to_schema(&body["properties"]);
        if let (Some(existing), Some(added)) =
            (db["properties"].as_object_mut(), added.as_object())
        {
            for (name, def) in added {
                existing.insert(name.clone(), def.clone());
            }
        }
        Ok(db.clone())
    }
}
