use std::fs::File;
use std::path::Path;

use clap::{Args, ValueEnum};
use colored::Colorize;
use devconsole::resources::ResourceClient;
use devconsole::table::{render_table, Tabular};
use devconsole::Config;
use env_logger::{Builder, Env, Target};
use eyre::Result;
use serde::Serialize;

pub(crate) mod channels;
pub(crate) mod events;
pub(crate) mod keys;
pub(crate) mod logs;
pub(crate) mod metrics;
pub(crate) mod watch;
pub(crate) mod webhooks;

/// Connection settings shared by every command. Flags override the
/// `DEVCONSOLE_*` environment.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Base URL of the REST API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Websocket URL of the socket server
    #[arg(long, global = true)]
    pub socket_url: Option<String>,

    /// Bearer token for the API and the socket handshake
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Company id, for the company channel
    #[arg(long, global = true)]
    pub company_id: Option<String>,
}

impl GlobalArgs {
    pub fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(socket_url) = &self.socket_url {
            config.socket_url = socket_url.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(company_id) = &self.company_id {
            config.company_id = Some(company_id.clone());
        }
        config
    }
}

fn env() -> Env<'static> {
    Env::default().default_filter_or("warn")
}

pub(crate) fn init_logger() {
    Builder::from_env(env()).init();
}

/// The watch screen owns the terminal, so it only logs to a file when asked to.
pub(crate) fn init_file_logger(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .map_err(|e| eyre::eyre!("Cannot open log file {}: {}", path.display(), e))?;
    Builder::from_env(env())
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

pub(crate) fn client(config: &Config) -> ResourceClient {
    ResourceClient::from_config(config)
}

pub(crate) fn notify_success(message: &str) {
    println!("{} {}", "✔".green().bold(), message.green());
}

pub(crate) fn notify_error(message: &str) {
    eprintln!("{} {}", "✖".red().bold(), message.red());
}

pub(crate) fn notify_info(message: &str) {
    println!("{}", message.blue());
}

/// Prints a record as a two column `field | value` table.
pub(crate) fn print_details(rows: &[(&str, String)]) {
    let mut table = prettytable::Table::new();
    for (field, value) in rows {
        let value = if value.is_empty() { "-" } else { value.as_str() };
        table.add_row(prettytable::Row::new(vec![
            prettytable::Cell::new(field).style_spec("b"),
            prettytable::Cell::new(value),
        ]));
    }
    table.printstd();
}

pub(crate) fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Table,
    Json,
}

pub(crate) fn print_records<R: Tabular + Serialize>(records: &[R], format: Format) -> Result<()> {
    match format {
        Format::Table => {
            if records.is_empty() {
                notify_info("No records found");
            } else {
                print!("{}", render_table(records));
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(records)?),
    }
    Ok(())
}

pub(crate) fn print_json<T: Serialize>(record: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}
