use clap::{Args, Subcommand, ValueEnum};
use devconsole::resources::{Dated, ResourceQuery, WebhookEndpoint, WebhookStatus};
use devconsole::Config;
use eyre::{bail, Result};

use super::{
    client, notify_info, notify_success, or_dash, print_details, print_json, print_records, Format,
};

#[derive(Debug, Subcommand)]
pub enum WebhooksCommand {
    /// List webhook endpoints
    List {
        /// Free-text search
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Add a webhook endpoint
    Create {
        /// URL receiving the event callbacks
        url: String,
        #[command(flatten)]
        form: WebhookFormArgs,
    },
    /// Change the details of a webhook endpoint
    Update {
        id: String,
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        form: WebhookFormArgs,
    },
    /// Show one webhook endpoint
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Start sending events to an endpoint
    Enable { id: String },
    /// Stop sending events to an endpoint
    Disable { id: String },
    /// Delete a webhook endpoint
    Delete { id: String },
    /// Event names a webhook can listen to
    Events,
    /// Available API versions for webhook payloads
    Versions,
    /// Delivery attempts of a webhook
    Attempts {
        id: String,
        /// Only attempts with this result status
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WebhookMode {
    Test,
    Live,
}

impl WebhookMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookMode::Test => "test",
            WebhookMode::Live => "live",
        }
    }
}

/// Endpoint details shared by `create` and `update`. Options left out keep
/// the current value.
#[derive(Debug, Default, Args)]
pub struct WebhookFormArgs {
    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<WebhookMode>,

    /// API version of the payloads, empty for the account default
    #[arg(long = "api-version")]
    pub version: Option<String>,

    /// Event to send, repeatable. Replaces the current events.
    #[arg(long = "event")]
    pub events: Vec<String>,

    /// Send every event
    #[arg(long, conflicts_with = "events")]
    pub all_events: bool,

    /// Only send events caused by this API credential
    #[arg(long)]
    pub api_credential: Option<String>,

    /// Send events caused by any API credential
    #[arg(long, conflicts_with = "api_credential")]
    pub all_credentials: bool,
}

impl WebhookFormArgs {
    fn touches_events(&self) -> bool {
        self.all_events || !self.events.is_empty()
    }

    /// Writes the given options into `webhook`. `known_events` are the event
    /// names the backend accepts.
    pub fn apply(&self, webhook: &mut WebhookEndpoint, known_events: &[String]) -> Result<()> {
        if let Some(description) = &self.description {
            webhook.description = non_empty(description);
        }
        if let Some(mode) = self.mode {
            webhook.mode = mode.as_str().to_string();
        }
        if let Some(version) = &self.version {
            webhook.version = non_empty(version);
        }

        if self.all_events {
            webhook.events = known_events.to_vec();
        } else if !self.events.is_empty() {
            let mut events: Vec<String> = Vec::with_capacity(self.events.len());
            for event in &self.events {
                if !known_events.contains(event) {
                    bail!("Unknown event '{}', see `devconsole webhooks events`", event);
                }
                if !events.contains(event) {
                    events.push(event.clone());
                }
            }
            webhook.events = events;
        }

        if self.all_credentials {
            webhook.api_credential_uuid = None;
        } else if let Some(uuid) = &self.api_credential {
            webhook.api_credential_uuid = non_empty(uuid);
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl WebhooksCommand {
    pub fn run(&self, config: &Config) -> Result<()> {
        let client = client(config);

        match self {
            WebhooksCommand::List { query, format } => {
                let mut search = ResourceQuery::new();
                if let Some(query) = query {
                    search = search.search(query.clone());
                }
                let webhooks = client.list_all::<WebhookEndpoint>(&search)?;
                print_records(&webhooks, *format)
            }
            WebhooksCommand::Create { url, form } => {
                let known_events = if form.touches_events() {
                    client.webhook_events()?
                } else {
                    Vec::new()
                };
                let mut webhook = WebhookEndpoint {
                    url: Some(url.clone()),
                    ..Default::default()
                };
                form.apply(&mut webhook, &known_events)?;
                if webhook.events.is_empty() {
                    bail!("Pick at least one --event, or --all-events");
                }

                let webhook = client.create(&webhook)?;
                notify_success(&format!(
                    "Webhook {} created",
                    webhook.url.as_deref().unwrap_or(url)
                ));
                print_webhook(&webhook);
                Ok(())
            }
            WebhooksCommand::Update { id, url, form } => {
                let known_events = if form.touches_events() {
                    client.webhook_events()?
                } else {
                    Vec::new()
                };
                let mut webhook = client.get::<WebhookEndpoint>(id)?;
                if let Some(url) = url {
                    webhook.url = Some(url.clone());
                }
                form.apply(&mut webhook, &known_events)?;

                let webhook = client.update(&webhook)?;
                notify_success(&format!(
                    "Webhook {} updated",
                    webhook.url.as_deref().unwrap_or(id)
                ));
                print_webhook(&webhook);
                Ok(())
            }
            WebhooksCommand::Show { id, format } => {
                let webhook = client.get::<WebhookEndpoint>(id)?;
                match format {
                    Format::Table => print_webhook(&webhook),
                    Format::Json => print_json(&webhook)?,
                }
                Ok(())
            }
            WebhooksCommand::Enable { id } => {
                let webhook = client.set_webhook_status(id, WebhookStatus::Enabled)?;
                notify_success(&format!(
                    "Webhook {} enabled",
                    webhook.url.as_deref().unwrap_or(id)
                ));
                Ok(())
            }
            WebhooksCommand::Disable { id } => {
                let webhook = client.set_webhook_status(id, WebhookStatus::Disabled)?;
                notify_success(&format!(
                    "Webhook {} disabled",
                    webhook.url.as_deref().unwrap_or(id)
                ));
                Ok(())
            }
            WebhooksCommand::Delete { id } => {
                client.delete::<WebhookEndpoint>(id)?;
                notify_success("Webhook endpoint deleted");
                Ok(())
            }
            WebhooksCommand::Events => {
                for event in client.webhook_events()? {
                    println!("{}", event);
                }
                Ok(())
            }
            WebhooksCommand::Versions => {
                for version in client.webhook_versions()? {
                    println!("{}", version);
                }
                Ok(())
            }
            WebhooksCommand::Attempts { id, status, format } => {
                let attempts = client.webhook_attempts(id, status.as_deref())?;
                if attempts.is_empty() && *format == Format::Table {
                    notify_info("No delivery attempts yet");
                    return Ok(());
                }
                print_records(&attempts, *format)
            }
        }
    }
}

fn print_webhook(webhook: &WebhookEndpoint) {
    let credentials = if webhook.receiving_from_all_api_credentials() {
        "All API credentials".to_string()
    } else {
        or_dash(
            webhook
                .api_credential_name
                .as_deref()
                .or(webhook.api_credential_uuid.as_deref()),
        )
    };
    let events = if webhook.is_listening_on_all_events {
        "All events".to_string()
    } else {
        webhook.event_types()
    };

    print_details(&[
        ("URL", or_dash(webhook.url.as_deref())),
        ("Description", or_dash(webhook.description.as_deref())),
        ("Status", webhook.status.clone()),
        ("Mode", webhook.mode.clone()),
        ("Version", or_dash(webhook.version.as_deref())),
        ("API Credentials", credentials),
        ("Events", events),
        ("Created", webhook.created_long().unwrap_or_default()),
        ("Updated", webhook.updated_ago().map(|ago| format!("{} ago", ago)).unwrap_or_default()),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["order.created".to_string(), "order.dispatched".to_string()]
    }

    #[test]
    fn form_fills_a_new_endpoint() {
        let form = WebhookFormArgs {
            mode: Some(WebhookMode::Live),
            version: Some("2024-03-01".to_string()),
            events: vec![
                "order.created".to_string(),
                "order.created".to_string(),
                "order.dispatched".to_string(),
            ],
            api_credential: Some("cred_1".to_string()),
            ..Default::default()
        };
        let mut webhook = WebhookEndpoint::default();
        form.apply(&mut webhook, &known()).unwrap();

        assert_eq!(webhook.mode, "live");
        assert_eq!(webhook.version.as_deref(), Some("2024-03-01"));
        assert_eq!(webhook.events, known());
        assert!(!webhook.receiving_from_all_api_credentials());
    }

    #[test]
    fn form_keeps_what_it_does_not_name() {
        let mut webhook = WebhookEndpoint {
            url: Some("https://example.com/hook".to_string()),
            version: Some("2024-03-01".to_string()),
            events: vec!["order.created".to_string()],
            api_credential_uuid: Some("cred_1".to_string()),
            ..Default::default()
        };
        let form = WebhookFormArgs {
            version: Some(String::new()),
            all_credentials: true,
            ..Default::default()
        };
        form.apply(&mut webhook, &[]).unwrap();

        assert_eq!(webhook.version, None);
        assert!(webhook.receiving_from_all_api_credentials());
        assert_eq!(webhook.events, vec!["order.created".to_string()]);
        assert_eq!(webhook.mode, "test");
    }

    #[test]
    fn form_selects_all_events_and_rejects_unknown_ones() {
        let mut webhook = WebhookEndpoint::default();
        let form = WebhookFormArgs {
            all_events: true,
            ..Default::default()
        };
        form.apply(&mut webhook, &known()).unwrap();
        assert_eq!(webhook.events, known());

        let form = WebhookFormArgs {
            events: vec!["order.exploded".to_string()],
            ..Default::default()
        };
        assert!(form.apply(&mut webhook, &known()).is_err());
        assert_eq!(webhook.events, known());
    }
}
