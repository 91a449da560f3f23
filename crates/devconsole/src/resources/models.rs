use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Resource;
use crate::format::{distance_in_words, long_date, short_date};

/// Status codes arrive as strings or numbers depending on the backend version.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Durations are decimal seconds, sometimes sent as strings.
fn string_or_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid duration '{}'", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// An explicit `null` decodes like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn mode_or_test<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| "test".to_string()))
}

fn status_or_enabled<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .unwrap_or_else(|| WebhookStatus::Enabled.as_str().to_string()))
}

/// Records carrying creation and update times, with their display forms.
pub trait Dated {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    fn created_long(&self) -> Option<String> {
        self.created_at().map(|t| long_date(&t))
    }

    fn created_short(&self) -> Option<String> {
        self.created_at().map(|t| short_date(&t))
    }

    fn created_ago(&self) -> Option<String> {
        self.created_at()
            .map(|t| distance_in_words(&t, &Utc::now()))
    }

    fn updated_long(&self) -> Option<String> {
        self.updated_at().map(|t| long_date(&t))
    }

    fn updated_short(&self) -> Option<String> {
        self.updated_at().map(|t| short_date(&t))
    }

    fn updated_ago(&self) -> Option<String> {
        self.updated_at()
            .map(|t| distance_in_words(&t, &Utc::now()))
    }
}

macro_rules! impl_dated {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Dated for $ty {
                fn created_at(&self) -> Option<DateTime<Utc>> {
                    self.created_at
                }

                fn updated_at(&self) -> Option<DateTime<Utc>> {
                    self.updated_at
                }
            }
        )*
    };
}

/// An API key pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiCredential {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub user_uuid: Option<String>,
    pub company_uuid: Option<String>,
    pub name: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub test_mode: bool,
    pub api: Option<String>,
    pub browser_origins: Option<Value>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApiCredential {
    /// `name (key)`, or just the key for unnamed credentials.
    pub fn full_name(&self) -> String {
        let key = self.key.as_deref().unwrap_or_default();
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("{} ({})", name, key),
            None => key.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Untitled")
    }

    pub fn is_test_key(&self) -> bool {
        self.test_mode
    }

    pub fn environment(&self) -> &'static str {
        if self.test_mode {
            "Test"
        } else {
            "Live"
        }
    }

    pub fn last_used(&self) -> String {
        self.last_used_at
            .map(|t| long_date(&t))
            .unwrap_or_else(|| "Never used".to_string())
    }

    pub fn expires(&self) -> String {
        self.expires_at
            .map(|t| long_date(&t))
            .unwrap_or_else(|| "Never".to_string())
    }
}

impl Resource for ApiCredential {
    const PATH: &'static str = "api-credentials";
    const SINGULAR_KEY: &'static str = "api_credential";
    const PLURAL_KEY: &'static str = "api_credentials";

    fn id(&self) -> Option<&str> {
        self.id.as_deref().or(self.uuid.as_deref())
    }
}

/// One request made against the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiRequestLog {
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub public_id: Option<String>,
    pub company_uuid: Option<String>,
    pub api_credential_uuid: Option<String>,
    pub api_credential_name: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub full_url: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub status_code: Option<String>,
    pub reason_phrase: Option<String>,
    #[serde(deserialize_with = "string_or_float")]
    pub duration: Option<f64>,
    pub ip_address: Option<String>,
    pub version: Option<String>,
    pub source: Option<String>,
    pub content_type: Option<String>,
    pub related_resources: Option<Value>,
    pub query_params: Option<Value>,
    pub request_headers: Option<Value>,
    pub request_body: Option<Value>,
    pub response_headers: Option<Value>,
    pub response_body: Option<Value>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApiRequestLog {
    /// `200 OK`
    pub fn status(&self) -> String {
        format!(
            "{} {}",
            self.status_code.as_deref().unwrap_or_default(),
            self.reason_phrase.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// `GET /v1/orders`
    pub fn description(&self) -> String {
        format!(
            "{} /{}",
            self.method.as_deref().unwrap_or_default(),
            self.path.as_deref().unwrap_or_default()
        )
    }
}

impl Resource for ApiRequestLog {
    const PATH: &'static str = "api-request-logs";
    const SINGULAR_KEY: &'static str = "api_request_log";
    const PLURAL_KEY: &'static str = "api_request_logs";

    fn id(&self) -> Option<&str> {
        self.public_id
            .as_deref()
            .or(self.id.as_deref())
            .or(self.uuid.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Enabled,
    Disabled,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Enabled => "enabled",
            WebhookStatus::Disabled => "disabled",
        }
    }
}

/// A URL receiving event callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookEndpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub company_uuid: Option<String>,
    pub created_by_uuid: Option<String>,
    pub updated_by_uuid: Option<String>,
    pub api_credential_uuid: Option<String>,
    pub api_credential_name: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "mode_or_test")]
    pub mode: String,
    #[serde(deserialize_with = "null_as_default")]
    pub events: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_listening_on_all_events: bool,
    #[serde(deserialize_with = "status_or_enabled")]
    pub status: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for WebhookEndpoint {
    fn default() -> Self {
        Self {
            id: None,
            uuid: None,
            company_uuid: None,
            created_by_uuid: None,
            updated_by_uuid: None,
            api_credential_uuid: None,
            api_credential_name: None,
            url: None,
            version: None,
            description: None,
            mode: "test".to_string(),
            events: Vec::new(),
            is_listening_on_all_events: false,
            status: WebhookStatus::Enabled.as_str().to_string(),
            deleted_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl WebhookEndpoint {
    pub fn receiving_from_all_api_credentials(&self) -> bool {
        self.api_credential_uuid
            .as_deref()
            .map_or(true, |uuid| uuid.is_empty())
    }

    pub fn is_enabled(&self) -> bool {
        self.status == WebhookStatus::Enabled.as_str()
    }

    pub fn is_test_mode(&self) -> bool {
        self.mode == "test"
    }

    pub fn event_types(&self) -> String {
        self.events.join(", ")
    }
}

impl Resource for WebhookEndpoint {
    const PATH: &'static str = "webhook-endpoints";
    const SINGULAR_KEY: &'static str = "webhook_endpoint";
    const PLURAL_KEY: &'static str = "webhook_endpoints";

    fn id(&self) -> Option<&str> {
        self.id.as_deref().or(self.uuid.as_deref())
    }
}

/// An event raised by the API and fanned out to webhooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEvent {
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub public_id: Option<String>,
    pub company_uuid: Option<String>,
    pub api_credential_uuid: Option<String>,
    pub event: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub method: Option<String>,
    pub data: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource for ApiEvent {
    const PATH: &'static str = "api-events";
    const SINGULAR_KEY: &'static str = "api_event";
    const PLURAL_KEY: &'static str = "api_events";

    fn id(&self) -> Option<&str> {
        self.public_id
            .as_deref()
            .or(self.id.as_deref())
            .or(self.uuid.as_deref())
    }
}

/// One delivery attempt of a webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookRequestLog {
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub public_id: Option<String>,
    pub company_uuid: Option<String>,
    pub webhook_uuid: Option<String>,
    pub api_credential_uuid: Option<String>,
    pub api_event_uuid: Option<String>,
    /// Embedded in responses rather than side-loaded.
    pub api_event: Option<ApiEvent>,
    pub method: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub status_code: Option<String>,
    pub reason_phrase: Option<String>,
    pub url: Option<String>,
    pub attempt: Option<u32>,
    #[serde(deserialize_with = "string_or_float")]
    pub duration: Option<f64>,
    pub response: Option<Value>,
    pub headers: Option<Value>,
    pub meta: Option<Value>,
    pub sent_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WebhookRequestLog {
    pub fn result(&self) -> &'static str {
        if self
            .status_code
            .as_deref()
            .is_some_and(|code| code.starts_with('2'))
        {
            "succeeded"
        } else {
            "failed"
        }
    }

    pub fn status(&self) -> String {
        format!(
            "{} {}",
            self.status_code.as_deref().unwrap_or_default(),
            self.reason_phrase.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    pub fn sent_long(&self) -> Option<String> {
        self.sent_at.map(|t| long_date(&t))
    }

    pub fn sent_ago(&self) -> Option<String> {
        self.sent_at.map(|t| distance_in_words(&t, &Utc::now()))
    }

    pub fn event_name(&self) -> Option<&str> {
        self.api_event.as_ref().and_then(|e| e.event.as_deref())
    }

    pub fn event_public_id(&self) -> Option<&str> {
        self.api_event.as_ref().and_then(|e| e.public_id.as_deref())
    }
}

impl Resource for WebhookRequestLog {
    const PATH: &'static str = "webhook-request-logs";
    const SINGULAR_KEY: &'static str = "webhook_request_log";
    const PLURAL_KEY: &'static str = "webhook_request_logs";

    fn id(&self) -> Option<&str> {
        self.public_id
            .as_deref()
            .or(self.id.as_deref())
            .or(self.uuid.as_deref())
    }
}

impl_dated!(
    ApiCredential,
    ApiRequestLog,
    WebhookEndpoint,
    ApiEvent,
    WebhookRequestLog,
);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn credential_display_getters() {
        let mut key = ApiCredential {
            key: Some("flb_live_abc".to_string()),
            ..Default::default()
        };
        assert_eq!(key.full_name(), "flb_live_abc");
        assert_eq!(key.display_name(), "Untitled");
        assert_eq!(key.environment(), "Live");
        assert_eq!(key.last_used(), "Never used");
        assert_eq!(key.expires(), "Never");

        key.name = Some("Storefront".to_string());
        key.test_mode = true;
        key.expires_at = Some(Utc.with_ymd_and_hms(2027, 1, 2, 15, 30, 0).unwrap());
        assert_eq!(key.full_name(), "Storefront (flb_live_abc)");
        assert_eq!(key.environment(), "Test");
        assert_eq!(key.expires(), "January 2nd, 2027 3:30 PM");
    }

    #[test]
    fn request_log_accepts_numeric_status() {
        let log: ApiRequestLog = serde_json::from_value(json!({
            "public_id": "req_1",
            "method": "POST",
            "path": "v1/orders",
            "status_code": 201,
            "reason_phrase": "Created",
            "created_at": "2026-10-19T09:00:00.000000Z"
        }))
        .unwrap();

        assert_eq!(log.status(), "201 Created");
        assert_eq!(log.description(), "POST /v1/orders");
        assert_eq!(log.id(), Some("req_1"));
        assert_eq!(log.created_short().as_deref(), Some("Oct 19, 2026"));
    }

    #[test]
    fn webhook_defaults_and_getters() {
        let webhook: WebhookEndpoint = serde_json::from_value(json!({
            "id": "wh_1",
            "url": "https://example.com/hook",
            "events": ["order.created", "order.dispatched"]
        }))
        .unwrap();

        assert!(webhook.is_enabled());
        assert!(webhook.is_test_mode());
        assert!(webhook.receiving_from_all_api_credentials());
        assert_eq!(webhook.event_types(), "order.created, order.dispatched");
    }

    #[test]
    fn webhook_nulls_decode_as_defaults() {
        let webhook: WebhookEndpoint = serde_json::from_value(json!({
            "id": "wh_1",
            "events": null,
            "mode": null,
            "status": null,
            "is_listening_on_all_events": null
        }))
        .unwrap();

        assert_eq!(webhook.mode, "test");
        assert_eq!(webhook.status, "enabled");
        assert!(webhook.events.is_empty());
        assert!(!webhook.is_listening_on_all_events);

        let key: ApiCredential =
            serde_json::from_value(json!({ "key": "flb_test_abc", "test_mode": null })).unwrap();
        assert!(!key.is_test_key());
    }

    #[test]
    fn durations_accept_strings() {
        let attempt: WebhookRequestLog =
            serde_json::from_value(json!({ "duration": "0.25" })).unwrap();
        assert_eq!(attempt.duration, Some(0.25));

        let log: ApiRequestLog = serde_json::from_value(json!({ "duration": " 1.5 " })).unwrap();
        assert_eq!(log.duration, Some(1.5));

        let log: ApiRequestLog = serde_json::from_value(json!({ "duration": 3 })).unwrap();
        assert_eq!(log.duration, Some(3.0));

        let log: ApiRequestLog = serde_json::from_value(json!({ "duration": "" })).unwrap();
        assert_eq!(log.duration, None);

        assert!(serde_json::from_value::<ApiRequestLog>(json!({ "duration": "fast" })).is_err());
    }

    #[test]
    fn webhook_attempt_result() {
        let mut attempt = WebhookRequestLog {
            status_code: Some("204".to_string()),
            ..Default::default()
        };
        assert_eq!(attempt.result(), "succeeded");
        attempt.status_code = Some("500".to_string());
        assert_eq!(attempt.result(), "failed");
        attempt.status_code = None;
        assert_eq!(attempt.result(), "failed");
    }

    #[test]
    fn embedded_event_is_decoded() {
        let attempt: WebhookRequestLog = serde_json::from_value(json!({
            "status_code": "200",
            "attempt": 2,
            "api_event": { "public_id": "event_1", "event": "order.created" }
        }))
        .unwrap();

        assert_eq!(attempt.event_name(), Some("order.created"));
        assert_eq!(attempt.event_public_id(), Some("event_1"));
    }
}
