//! Weaviate backend over its REST schema API and GraphQL `Get` query.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CollectionSchema, HybridQuery, HybridStore, PropertySchema, SearchObject};
use crate::error::StoreError;

/// Extra keys that are arguments of `Get { Class(...) }` rather than of `hybrid`.
const GET_ARGS: &[&str] = &["offset", "autocut", "where", "after"];

/// Keys set from the retriever configuration.
const RESERVED_ARGS: &[&str] = &["query", "alpha", "vector", "limit"];

const FUSION_TYPES: &[&str] = &["rankedFusion", "relativeScoreFusion"];

const OPERATORS: &[&str] = &[
    "And",
    "Or",
    "Not",
    "Equal",
    "NotEqual",
    "GreaterThan",
    "GreaterThanEqual",
    "LessThan",
    "LessThanEqual",
    "Like",
    "WithinGeoRange",
    "IsNull",
    "ContainsAny",
    "ContainsAll",
];

#[derive(Debug, Clone)]
pub struct WeaviateClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    /// GraphQL selection per class, filled on first search.
    selections: Arc<RwLock<HashMap<String, Arc<Vec<String>>>>>,
}

impl WeaviateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            selections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn fetch_class(&self, name: &str) -> Result<Option<CollectionSchema>, StoreError> {
        let class = class_name(name);
        let resp = self
            .request(Method::GET, &format!("/v1/schema/{}", class))
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let schema = resp
                    .json::<CollectionSchema>()
                    .await
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(Some(schema))
            }
            status => Err(status_error(status, resp).await),
        }
    }

    async fn selection(&self, class: &str) -> Result<Arc<Vec<String>>, StoreError> {
        if let Some(cached) = self.selections.read().await.get(class) {
            return Ok(cached.clone());
        }

        let schema = self
            .fetch_class(class)
            .await?
            .ok_or_else(|| StoreError::Query(format!("class '{}' does not exist", class)))?;
        let fields: Vec<String> = schema.properties.iter().filter_map(property_selection).collect();
        if fields.is_empty() {
            return Err(StoreError::Query(format!(
                "class '{}' has no properties to return",
                class
            )));
        }

        let fields = Arc::new(fields);
        self.selections
            .write()
            .await
            .insert(class.to_string(), fields.clone());
        Ok(fields)
    }
}

#[async_trait]
impl HybridStore for WeaviateClient {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.fetch_class(name).await?.is_some())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), StoreError> {
        let schema = CollectionSchema {
            class: class_name(&schema.class),
            properties: schema.properties.clone(),
        };
        let resp = self
            .request(Method::POST, "/v1/schema")
            .json(&schema)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status, resp).await);
        }
        self.selections.write().await.remove(&schema.class);
        info!(class = %schema.class, "Created Weaviate class");
        Ok(())
    }

    async fn hybrid(&self, query: &HybridQuery) -> Result<Vec<SearchObject>, StoreError> {
        let class = class_name(&query.collection);
        if !is_graphql_name(&class) {
            return Err(StoreError::Query(format!("invalid class name '{}'", class)));
        }
        let fields = self.selection(&class).await?;

        let graphql = build_hybrid_query(&class, &fields, query)?;
        debug!(class = %class, "Sending hybrid GraphQL query");

        let resp = self
            .request(Method::POST, "/v1/graphql")
            .json(&json!({ "query": graphql }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status, resp).await);
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        parse_get_response(&class, body)
    }
}

/// Weaviate stores class names with an upper-case first letter.
fn class_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `[_A-Za-z][_0-9A-Za-z]*`
fn is_graphql_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Selection for one property, or `None` when it is not returned.
///
/// Nested objects and cross-references are skipped.
fn property_selection(property: &PropertySchema) -> Option<String> {
    if !is_graphql_name(&property.name) {
        return None;
    }
    let data_type = property.data_type.first()?;
    match data_type.as_str() {
        "geoCoordinates" => Some(format!("{} {{ latitude longitude }}", property.name)),
        "phoneNumber" => Some(format!("{} {{ input internationalFormatted }}", property.name)),
        "object" | "object[]" => None,
        // cross-references name the target class
        t if t.starts_with(|c: char| c.is_ascii_uppercase()) => None,
        _ => Some(property.name.clone()),
    }
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> StoreError {
    StoreError::Status {
        status: status.as_u16(),
        body: resp.text().await.unwrap_or_default(),
    }
}

fn build_hybrid_query(
    class: &str,
    fields: &[String],
    query: &HybridQuery,
) -> Result<String, StoreError> {
    if !query.alpha.is_finite() || query.vector.iter().any(|v| !v.is_finite()) {
        return Err(StoreError::Query(
            "alpha and vector components must be finite".to_string(),
        ));
    }
    let vector = query
        .vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut hybrid_args = vec![
        format!("query: {}", string_literal(&query.query)),
        format!("alpha: {}", query.alpha),
        format!("vector: [{}]", vector),
    ];
    let mut get_args = Vec::new();

    for (key, value) in &query.extra {
        let key = key.as_str();
        if RESERVED_ARGS.contains(&key) {
            return Err(StoreError::Query(format!(
                "option '{}' is set by the retriever configuration",
                key
            )));
        }
        let arg = format!("{}: {}", checked_name(key)?, render_literal(key, value)?);
        if GET_ARGS.contains(&key) {
            get_args.push(arg);
        } else {
            hybrid_args.push(arg);
        }
    }

    let mut args = vec![
        format!("hybrid: {{{}}}", hybrid_args.join(", ")),
        format!("limit: {}", query.limit),
    ];
    args.extend(get_args);

    Ok(format!(
        "{{ Get {{ {}({}) {{ {} }} }} }}",
        class,
        args.join(", "),
        fields.join(" ")
    ))
}

fn checked_name(key: &str) -> Result<&str, StoreError> {
    if is_graphql_name(key) {
        Ok(key)
    } else {
        Err(StoreError::Query(format!("invalid option name '{}'", key)))
    }
}

fn string_literal(s: &str) -> String {
    // JSON string escapes are valid GraphQL string escapes.
    Value::String(s.to_string()).to_string()
}

fn enum_literal(key: &str, value: &str) -> Result<Option<String>, StoreError> {
    let allowed = match key {
        "fusionType" => FUSION_TYPES,
        "operator" => OPERATORS,
        _ => return Ok(None),
    };
    if allowed.contains(&value) {
        Ok(Some(value.to_string()))
    } else {
        Err(StoreError::Query(format!("invalid {} '{}'", key, value)))
    }
}

/// Renders the JSON value of argument `key` as a GraphQL input literal.
fn render_literal(key: &str, value: &Value) -> Result<String, StoreError> {
    Ok(match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => match enum_literal(key, s)? {
            Some(token) => token,
            None => string_literal(s),
        },
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|v| render_literal(key, v))
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let fields = map
                .iter()
                .map(|(k, v)| Ok(format!("{}: {}", checked_name(k)?, render_literal(k, v)?)))
                .collect::<Result<Vec<_>, StoreError>>()?;
            format!("{{{}}}", fields.join(", "))
        }
    })
}

fn parse_get_response(class: &str, body: Value) -> Result<Vec<SearchObject>, StoreError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect();
            return Err(StoreError::Query(messages.join("; ")));
        }
    }

    let hits = body
        .get("data")
        .and_then(|d| d.get("Get"))
        .and_then(|g| g.get(class))
        .ok_or_else(|| StoreError::Decode(format!("missing data.Get.{} in response", class)))?;

    match hits {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(props) => Ok(SearchObject::new(props.clone())),
                other => Err(StoreError::Decode(format!(
                    "expected object in results, got {}",
                    other
                ))),
            })
            .collect(),
        other => Err(StoreError::Decode(format!(
            "expected array of results, got {}",
            other
        ))),
    }
}
