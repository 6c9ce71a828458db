// Firebase Firestore REST API client
// Documents are addressed by slash paths relative to the database root,
// e.g. "users/abc" or "users/abc/settings/notifications"

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::auth::{GoogleAuth, ServiceAccount};

const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// A single write in a `documents:commit` batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Delete a document by path (e.g. "users/123/fcmTokens/web")
    Delete { path: String },
    /// Merge specific fields into a document, optionally applying atomic
    /// field transforms in the same write
    Update {
        path: String,
        fields: Value,
        transforms: Vec<FieldTransform>,
    },
    /// Apply server-side field transforms without touching other fields
    Transform {
        path: String,
        transforms: Vec<FieldTransform>,
    },
}

/// Server-side atomic field transforms.
#[derive(Debug, Clone)]
pub enum FieldTransform {
    /// Atomic integer increment
    Increment { field: String, amount: i64 },
    /// Array union: appends only the elements not already present
    AppendMissing { field: String, values: Vec<String> },
}

/// Firestore REST API client
pub struct FirebaseClient {
    client: Client,
    auth: GoogleAuth,
}

impl FirebaseClient {
    pub fn new(client: Client, service_account: ServiceAccount) -> Self {
        let auth = GoogleAuth::new(client.clone(), service_account, FIRESTORE_SCOPE);
        Self { client, auth }
    }

    pub fn project_id(&self) -> &str {
        self.auth.project_id()
    }

    /// Base URL for Firestore REST API
    fn base_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.auth.project_id()
        )
    }

    /// Fully qualified resource name for a document path.
    fn resource_name(&self, path: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{}",
            self.auth.project_id(),
            path
        )
    }

    /// Get a document by path. Returns None when it does not exist.
    pub async fn get_document(&self, path: &str) -> Result<Option<Value>> {
        let token = self.auth.get_access_token().await?;
        let url = format!("{}/{}", self.base_url(), path);

        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        if response.status() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firebase error: {}", body);
            return Err(anyhow!("Firebase error: {}", status));
        }

        let doc: Value = response.json().await?;
        Ok(Some(from_firestore_document(&doc)))
    }

    /// Set/update a document, merging only the given top-level fields.
    pub async fn set_document(&self, path: &str, data: &Value) -> Result<()> {
        let token = self.auth.get_access_token().await?;

        // Build updateMask from top-level field names
        let field_paths: String = data
            .as_object()
            .map(|obj| {
                obj.keys()
                    .map(|k| format!("updateMask.fieldPaths={}", k))
                    .collect::<Vec<_>>()
                    .join("&")
            })
            .unwrap_or_default();

        let url = format!("{}/{}?{}", self.base_url(), path, field_paths);

        let firestore_doc = to_firestore_document(data);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&token)
            .json(&firestore_doc)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firebase error: {}", body);
            return Err(anyhow!("Firebase error: {}", status));
        }

        Ok(())
    }

    /// Delete a document. Missing documents are not an error.
    pub async fn delete_document(&self, path: &str) -> Result<()> {
        let token = self.auth.get_access_token().await?;
        let url = format!("{}/{}", self.base_url(), path);

        let response = self.client.delete(&url).bearer_auth(&token).send().await?;

        if !response.status().is_success() && response.status() != 404 {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firebase delete error: {}", body);
            return Err(anyhow!("Firebase delete error: {}", status));
        }

        Ok(())
    }

    /// List all documents in a collection as (id, data) tuples.
    /// Handles pagination to fetch ALL documents.
    pub async fn list_collection(&self, path: &str) -> Result<Vec<(String, Value)>> {
        let token = self.auth.get_access_token().await?;
        let base_url = format!("{}/{}", self.base_url(), path);

        let mut all_docs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}?pageSize=300", base_url);
            if let Some(ref t) = page_token {
                url.push_str(&format!("&pageToken={}", t));
            }

            let response = self.client.get(&url).bearer_auth(&token).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await?;
                debug!("Firebase error: {}", body);
                return Err(anyhow!("Firebase error: {}", status));
            }

            let result: Value = response.json().await?;

            if let Some(arr) = result["documents"].as_array() {
                for doc in arr {
                    if let Some(id) = doc["name"]
                        .as_str()
                        .and_then(|name| name.split('/').next_back())
                        .map(|s| s.to_string())
                    {
                        let data = from_firestore_document(doc);
                        all_docs.push((id, data));
                    }
                }
            }

            // Check for next page
            match result.get("nextPageToken").and_then(|t| t.as_str()) {
                Some(t) => page_token = Some(t.to_string()),
                None => break,
            }
        }

        Ok(all_docs)
    }

    /// Apply a batch of writes in a single `documents:commit` call.
    /// Transforms (increment, array union) execute atomically server-side.
    pub async fn commit(&self, writes: Vec<WriteOp>) -> Result<()> {
        let token = self.auth.get_access_token().await?;
        let url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents:commit",
            self.auth.project_id()
        );

        let write_objects: Vec<Value> = writes
            .into_iter()
            .map(|w| match w {
                WriteOp::Delete { path } => {
                    json!({ "delete": self.resource_name(&path) })
                }
                WriteOp::Update {
                    path,
                    fields,
                    transforms,
                } => {
                    let field_paths: Vec<String> = fields
                        .as_object()
                        .map(|obj| obj.keys().cloned().collect())
                        .unwrap_or_default();
                    let mut write = json!({
                        "update": {
                            "name": self.resource_name(&path),
                            "fields": to_firestore_fields(&fields)
                        },
                        "updateMask": {
                            "fieldPaths": field_paths
                        }
                    });
                    if !transforms.is_empty() {
                        write["updateTransforms"] = Value::Array(
                            transforms.iter().map(field_transform_json).collect(),
                        );
                    }
                    write
                }
                WriteOp::Transform { path, transforms } => {
                    let field_transforms: Vec<Value> =
                        transforms.iter().map(field_transform_json).collect();
                    json!({
                        "transform": {
                            "document": self.resource_name(&path),
                            "fieldTransforms": field_transforms
                        }
                    })
                }
            })
            .collect();

        let body = json!({ "writes": write_objects });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firebase commit error: {}", body);
            return Err(anyhow!("Firebase commit error: {}", status));
        }

        Ok(())
    }
}

fn field_transform_json(transform: &FieldTransform) -> Value {
    match transform {
        FieldTransform::Increment { field, amount } => json!({
            "fieldPath": field,
            "increment": { "integerValue": amount.to_string() }
        }),
        FieldTransform::AppendMissing { field, values } => {
            let values: Vec<Value> = values.iter().map(|v| json!({ "stringValue": v })).collect();
            json!({
                "fieldPath": field,
                "appendMissingElements": { "values": values }
            })
        }
    }
}

/// Convert Firestore document to regular JSON
fn from_firestore_document(doc: &Value) -> Value {
    if let Some(fields) = doc.get("fields") {
        from_firestore_value(&json!({ "mapValue": { "fields": fields } }))
    } else {
        Value::Null
    }
}

/// Convert Firestore value to regular JSON value
fn from_firestore_value(value: &Value) -> Value {
    if let Some(s) = value.get("stringValue") {
        return s.clone();
    }
    if let Some(n) = value.get("integerValue") {
        if let Some(s) = n.as_str() {
            return Value::Number(s.parse().unwrap_or(0.into()));
        }
        return n.clone();
    }
    if let Some(n) = value.get("doubleValue") {
        return n.clone();
    }
    if let Some(b) = value.get("booleanValue") {
        return b.clone();
    }
    if let Some(ts) = value.get("timestampValue") {
        return ts.clone();
    }
    if value.get("nullValue").is_some() {
        return Value::Null;
    }
    if let Some(arr) = value
        .get("arrayValue")
        .and_then(|a| a.get("values"))
        .and_then(|v| v.as_array())
    {
        return Value::Array(arr.iter().map(from_firestore_value).collect());
    }
    if let Some(obj) = value
        .get("mapValue")
        .and_then(|m| m.get("fields"))
        .and_then(|f| f.as_object())
    {
        let map: serde_json::Map<String, Value> = obj
            .iter()
            .map(|(k, v)| (k.clone(), from_firestore_value(v)))
            .collect();
        return Value::Object(map);
    }
    Value::Null
}

/// Convert regular JSON to Firestore document format
fn to_firestore_document(data: &Value) -> Value {
    json!({
        "fields": to_firestore_fields(data)
    })
}

/// Convert JSON object to Firestore fields
fn to_firestore_fields(data: &Value) -> Value {
    if let Some(obj) = data.as_object() {
        let fields: serde_json::Map<String, Value> = obj
            .iter()
            .map(|(k, v)| (k.clone(), to_firestore_value(v)))
            .collect();
        Value::Object(fields)
    } else {
        json!({})
    }
}

/// Convert JSON value to Firestore value format
fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::String(s) => json!({ "stringValue": s }),
        Value::Number(n) => {
            if n.is_f64() {
                json!({ "doubleValue": n })
            } else {
                json!({ "integerValue": n.to_string() })
            }
        }
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Array(arr) => {
            let values: Vec<Value> = arr.iter().map(to_firestore_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(obj) => {
            let fields: serde_json::Map<String, Value> = obj
                .iter()
                .map(|(k, v)| (k.clone(), to_firestore_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
        Value::Null => json!({ "nullValue": null }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_round_trip() {
        let data = json!({
            "displayName": "Mika",
            "totalXP": 250,
            "enabled": true,
            "unlockedBadges": ["first_entry", "week_streak"],
            "nested": { "reminderTime": "21:00" }
        });
        let wire = to_firestore_document(&data);
        assert_eq!(
            wire["fields"]["totalXP"],
            json!({ "integerValue": "250" })
        );
        assert_eq!(from_firestore_document(&wire), data);
    }

    #[test]
    fn test_integer_strings_parse_back() {
        let wire = json!({
            "fields": { "level": { "integerValue": "3" } }
        });
        assert_eq!(from_firestore_document(&wire), json!({ "level": 3 }));
    }

    #[test]
    fn test_increment_transform_wire_format() {
        let transform = field_transform_json(&FieldTransform::Increment {
            field: "totalXP".to_string(),
            amount: 25,
        });
        assert_eq!(transform["fieldPath"], "totalXP");
        assert_eq!(transform["increment"]["integerValue"], "25");
    }

    #[test]
    fn test_append_missing_transform_wire_format() {
        let transform = field_transform_json(&FieldTransform::AppendMissing {
            field: "unlockedBadges".to_string(),
            values: vec!["first_entry".to_string()],
        });
        assert_eq!(
            transform["appendMissingElements"]["values"][0]["stringValue"],
            "first_entry"
        );
    }
}
