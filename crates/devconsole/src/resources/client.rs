use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

use super::{
    ApiCredential, Page, PageMeta, Resource, ResourceQuery, WebhookEndpoint, WebhookRequestLog,
    WebhookStatus,
};
use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("server responded {status}: {message}")]
    Server { status: u16, message: String },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("record has no id")]
    MissingId,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client of the developers REST backend.
///
/// Responses use the REST adapter envelope: lists under the plural key
/// with an optional `meta`, single records under the singular key.
pub struct ResourceClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl ResourceClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_url.clone(),
            config.token.clone(),
            config.http_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn get_value(&self, path: &str, pairs: &[(String, String)]) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, pairs);
        let mut request = self.authorize(self.agent.get(&url));
        for (key, value) in pairs {
            request = request.query(key, value);
        }
        let response = request.call().map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        read_value(&url, response)
    }

    fn send_value(&self, method: &str, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let result = match method {
            "POST" => self.authorize(self.agent.post(&url)).send_json(body),
            "PUT" => self.authorize(self.agent.put(&url)).send_json(body),
            "PATCH" => self.authorize(self.agent.patch(&url)).send_json(body),
            _ if body.is_null() => self.authorize(self.agent.delete(&url)).call(),
            _ => self
                .authorize(self.agent.delete(&url))
                .force_send_body()
                .send_json(body),
        };
        let response = result.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        read_value(&url, response)
    }

    pub fn list<R: Resource>(&self, query: &ResourceQuery) -> Result<Page<R>, ApiError> {
        let url = self.url(R::PATH);
        let mut body = self.get_value(R::PATH, &query.to_pairs())?;

        let records = match body.get_mut(R::PLURAL_KEY).map(Value::take) {
            Some(records) => records,
            // Some endpoints answer with a bare array.
            None if body.is_array() => body.take(),
            None => {
                return Err(ApiError::Decode {
                    url,
                    reason: format!("missing `{}` key", R::PLURAL_KEY),
                })
            }
        };

        let meta = body
            .get_mut("meta")
            .map(Value::take)
            .and_then(|meta| serde_json::from_value::<PageMeta>(meta).ok());

        Ok(Page {
            records: decode(&url, records)?,
            meta,
        })
    }

    /// Every record matching `query`, ignoring its page and limit.
    pub fn list_all<R: Resource>(&self, query: &ResourceQuery) -> Result<Vec<R>, ApiError> {
        let mut query = query.clone();
        query.page = None;
        query.limit = Some(-1);
        Ok(self.list::<R>(&query)?.records)
    }

    pub fn get<R: Resource>(&self, id: &str) -> Result<R, ApiError> {
        let path = format!("{}/{}", R::PATH, id);
        let body = self.get_value(&path, &[])?;
        unwrap_single::<R>(&self.url(&path), body)
    }

    pub fn create<R: Resource>(&self, record: &R) -> Result<R, ApiError> {
        let body = envelope::<R>(record)?;
        let response = self.send_value("POST", R::PATH, &body)?;
        unwrap_single::<R>(&self.url(R::PATH), response)
    }

    pub fn update<R: Resource>(&self, record: &R) -> Result<R, ApiError> {
        let id = record.id().ok_or(ApiError::MissingId)?;
        let path = format!("{}/{}", R::PATH, id);
        let body = envelope::<R>(record)?;
        let response = self.send_value("PUT", &path, &body)?;
        unwrap_single::<R>(&self.url(&path), response)
    }

    pub fn delete<R: Resource>(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("{}/{}", R::PATH, id);
        self.send_value("DELETE", &path, &Value::Null)?;
        Ok(())
    }

    pub fn bulk_delete<R: Resource>(&self, ids: &[String]) -> Result<(), ApiError> {
        let path = format!("{}/bulk-delete", R::PATH);
        self.send_value("DELETE", &path, &json!({ "ids": ids }))?;
        Ok(())
    }

    /// Issues a new key/secret pair for a credential.
    pub fn roll_api_credential(
        &self,
        id: &str,
        password: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<ApiCredential, ApiError> {
        let path = format!("{}/roll/{}", ApiCredential::PATH, id);
        let body = json!({
            "password": password,
            "expiration": expiration,
        });
        let response = self.send_value("PATCH", &path, &body)?;
        unwrap_single::<ApiCredential>(&self.url(&path), response)
    }

    /// Names of the events a webhook can listen to.
    pub fn webhook_events(&self) -> Result<Vec<String>, ApiError> {
        let path = format!("{}/events", WebhookEndpoint::PATH);
        let body = self.get_value(&path, &[])?;
        decode(&self.url(&path), body)
    }

    pub fn webhook_versions(&self) -> Result<Vec<String>, ApiError> {
        let path = format!("{}/versions", WebhookEndpoint::PATH);
        let body = self.get_value(&path, &[])?;
        decode(&self.url(&path), body)
    }

    pub fn set_webhook_status(
        &self,
        id: &str,
        status: WebhookStatus,
    ) -> Result<WebhookEndpoint, ApiError> {
        let mut webhook = self.get::<WebhookEndpoint>(id)?;
        webhook.status = status.as_str().to_string();
        self.update(&webhook)
    }

    /// Delivery attempts of one webhook, optionally filtered by result status.
    pub fn webhook_attempts(
        &self,
        webhook_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<WebhookRequestLog>, ApiError> {
        let mut query = ResourceQuery::all().filter("webhook_uuid", webhook_id);
        if let Some(status) = status {
            query = query.filter("status", status);
        }
        Ok(self.list::<WebhookRequestLog>(&query)?.records)
    }
}

fn read_value(url: &str, mut response: Response<Body>) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

    if !status.is_success() {
        let message = server_message(&text)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        warn!("{} responded {}: {}", url, status.as_u16(), message);
        return Err(ApiError::Server {
            status: status.as_u16(),
            message,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Error message out of an error body: `errors[0]`, `error` or `message`.
fn server_message(text: &str) -> Option<String> {
    let body: Value = serde_json::from_str(text).ok()?;
    let first = |v: &Value| -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.first().and_then(|i| i.as_str()).map(str::to_string),
            _ => None,
        }
    };
    body.get("errors")
        .and_then(first)
        .or_else(|| body.get("error").and_then(first))
        .or_else(|| body.get("message").and_then(first))
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn unwrap_single<R: Resource>(url: &str, mut body: Value) -> Result<R, ApiError> {
    match body.get_mut(R::SINGULAR_KEY).map(Value::take) {
        Some(record) => decode(url, record),
        None => decode(url, body),
    }
}

fn envelope<R: Resource + Serialize>(record: &R) -> Result<Value, ApiError> {
    let value = serde_json::to_value(record).map_err(|e| ApiError::Decode {
        url: R::PATH.to_string(),
        reason: e.to_string(),
    })?;
    let mut map = Map::new();
    map.insert(R::SINGULAR_KEY.to_string(), value);
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_server_messages() {
        assert_eq!(
            server_message(r#"{"errors":["Invalid password"]}"#).as_deref(),
            Some("Invalid password")
        );
        assert_eq!(
            server_message(r#"{"error":"Unauthenticated"}"#).as_deref(),
            Some("Unauthenticated")
        );
        assert_eq!(
            server_message(r#"{"message":"Not found"}"#).as_deref(),
            Some("Not found")
        );
        assert_eq!(server_message("<html>"), None);
    }

    #[test]
    fn wraps_records_in_singular_key() {
        let record = ApiCredential {
            name: Some("Storefront".to_string()),
            ..Default::default()
        };
        let body = envelope(&record).unwrap();
        assert_eq!(body["api_credential"]["name"], "Storefront");
        assert!(body["api_credential"].get("id").is_none());
    }
}
