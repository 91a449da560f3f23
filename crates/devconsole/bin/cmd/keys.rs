use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use devconsole::resources::{ApiCredential, Dated, ResourceQuery};
use devconsole::Config;
use eyre::Result;

use super::{client, notify_success, or_dash, print_details, print_records, Format};

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
    /// List API keys
    List {
        /// Free-text search
        #[arg(long)]
        query: Option<String>,
        /// Only test mode keys
        #[arg(long, conflicts_with = "live")]
        test: bool,
        /// Only live keys
        #[arg(long)]
        live: bool,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Create an API key
    Create(CreateKeyArgs),
    /// Rename an API key
    Rename {
        id: String,
        name: String,
    },
    /// Delete one or more API keys
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Issue a new key pair, optionally expiring the current one
    Roll(RollKeyArgs),
}

#[derive(Debug, Args)]
pub struct CreateKeyArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Create a test mode key
    #[arg(long)]
    pub test: bool,

    /// Origins allowed to use the key from a browser
    #[arg(long = "origin")]
    pub origins: Vec<String>,

    /// Expiry, RFC 3339
    #[arg(long)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct RollKeyArgs {
    pub id: String,

    /// Password of the current user
    #[arg(long, env = "DEVCONSOLE_PASSWORD")]
    pub password: String,

    /// When the current key stops working, RFC 3339. Immediately when omitted.
    #[arg(long)]
    pub expiration: Option<DateTime<Utc>>,
}

impl KeysCommand {
    pub fn run(&self, config: &Config) -> Result<()> {
        let client = client(config);

        match self {
            KeysCommand::List {
                query,
                test,
                live,
                format,
            } => {
                let mut search = ResourceQuery::new();
                if let Some(query) = query {
                    search = search.search(query.clone());
                }
                let mut keys = client.list_all::<ApiCredential>(&search)?;
                if *test || *live {
                    retain_environment(&mut keys, *test);
                }
                print_records(&keys, *format)
            }
            KeysCommand::Create(args) => {
                let record = ApiCredential {
                    name: args.name.clone(),
                    test_mode: args.test,
                    browser_origins: (!args.origins.is_empty())
                        .then(|| serde_json::json!(args.origins)),
                    expires_at: args.expires_at,
                    ..Default::default()
                };
                let key = client.create(&record)?;
                notify_success(&format!("New API key '{}' created", key.full_name()));
                print_key(&key);
                Ok(())
            }
            KeysCommand::Rename { id, name } => {
                let mut key = client.get::<ApiCredential>(id)?;
                key.name = Some(name.clone());
                let key = client.update(&key)?;
                notify_success(&format!("API key renamed to '{}'", key.display_name()));
                Ok(())
            }
            KeysCommand::Delete { ids } => {
                if let [id] = ids.as_slice() {
                    client.delete::<ApiCredential>(id)?;
                    notify_success("API key deleted");
                } else {
                    client.bulk_delete::<ApiCredential>(ids)?;
                    notify_success(&format!("{} API keys deleted", ids.len()));
                }
                Ok(())
            }
            KeysCommand::Roll(args) => {
                let key = client.roll_api_credential(&args.id, &args.password, args.expiration)?;
                notify_success("API key rolled");
                print_key(&key);
                Ok(())
            }
        }
    }
}

fn retain_environment(keys: &mut Vec<ApiCredential>, test_mode: bool) {
    keys.retain(|key| key.is_test_key() == test_mode);
}

/// Shown right after a key pair is issued, the only time the full secret is printed.
fn print_key(key: &ApiCredential) {
    print_details(&[
        ("Name", key.display_name().to_string()),
        ("Public Key", or_dash(key.key.as_deref())),
        ("Secret Key", or_dash(key.secret.as_deref())),
        ("Environment", key.environment().to_string()),
        ("Expires", key.expires()),
        ("Last Used", key.last_used()),
        ("Created", key.created_long().unwrap_or_default()),
    ]);
}
