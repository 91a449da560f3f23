use std::sync::LazyLock;

use eyre::Result;
use regex::Regex;
use serde::Serialize;

use crate::resources::{ApiCredential, Resource};

static RE_API_CHANNEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^api\.(.+)$").unwrap());
static RE_COMPANY_CHANNEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^company\.(.+)$").unwrap());

/// What a channel name refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ChannelKind {
    /// Events of one API credential.
    Api(String),
    /// Events of the whole company.
    Company(String),
    Custom,
}

impl ChannelKind {
    pub fn of(name: &str) -> Self {
        if let Some(caps) = RE_API_CHANNEL.captures(name) {
            return ChannelKind::Api(caps[1].to_string());
        }
        if let Some(caps) = RE_COMPANY_CHANNEL.captures(name) {
            return ChannelKind::Company(caps[1].to_string());
        }
        ChannelKind::Custom
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Api(_) => "api",
            ChannelKind::Company(_) => "company",
            ChannelKind::Custom => "custom",
        }
    }
}

/// A channel the console offers to listen on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnownChannel {
    pub name: String,
    pub kind: ChannelKind,
    /// Credential the channel belongs to, for `api.*` channels.
    pub source: Option<String>,
}

impl KnownChannel {
    fn new(name: String, source: Option<String>) -> Self {
        let kind = ChannelKind::of(&name);
        Self { name, kind, source }
    }
}

/// One `api.<id>` channel per credential with an id, then `company.<id>`.
pub fn known_channels(credentials: &[ApiCredential], company_id: Option<&str>) -> Vec<KnownChannel> {
    let mut channels: Vec<KnownChannel> = credentials
        .iter()
        .filter_map(|credential| {
            let id = credential.id().filter(|id| !id.is_empty())?;
            Some(KnownChannel::new(
                format!("api.{}", id),
                Some(credential.full_name()),
            ))
        })
        .collect();

    if let Some(company_id) = company_id.filter(|id| !id.is_empty()) {
        channels.push(KnownChannel::new(format!("company.{}", company_id), None));
    }

    channels
}

/// Checks a user-entered channel name and returns it trimmed.
pub fn validate_channel_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        eyre::bail!("channel name is empty");
    }
    if name.chars().any(char::is_whitespace) {
        eyre::bail!("channel name '{}' contains whitespace", name);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(id: Option<&str>, key: &str) -> ApiCredential {
        ApiCredential {
            id: id.map(str::to_string),
            key: Some(key.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn lists_credential_channels_then_company() {
        let credentials = vec![
            credential(Some("a1"), "flb_live_1"),
            credential(None, "flb_live_2"),
            credential(Some("b2"), "flb_test_3"),
        ];

        let names: Vec<String> = known_channels(&credentials, Some("123"))
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["api.a1", "api.b2", "company.123"]);
    }

    #[test]
    fn classifies_names() {
        assert_eq!(ChannelKind::of("api.a1"), ChannelKind::Api("a1".to_string()));
        assert_eq!(
            ChannelKind::of("company.123"),
            ChannelKind::Company("123".to_string())
        );
        assert_eq!(ChannelKind::of("orders"), ChannelKind::Custom);
        assert_eq!(ChannelKind::of("api."), ChannelKind::Custom);
    }

    #[test]
    fn validates_custom_names() {
        assert_eq!(validate_channel_name("  company.1 ").unwrap(), "company.1");
        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name("two words").is_err());
    }
}
