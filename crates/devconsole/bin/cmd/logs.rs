use clap::{Args, Subcommand};
use devconsole::format::pretty_json;
use devconsole::resources::{ApiRequestLog, Dated, ResourceQuery};
use devconsole::Config;
use eyre::Result;
use serde_json::Value;

use super::{client, notify_info, or_dash, print_details, print_json, print_records, Format};

/// Paging and search options of the log and event listings.
#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 40)]
    pub limit: i64,

    /// Sort field, `-` prefix for descending
    #[arg(long, default_value = "-id")]
    pub sort: String,

    /// Free-text search
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

impl ListArgs {
    pub fn query(&self) -> ResourceQuery {
        let query = ResourceQuery::new()
            .page(self.page)
            .limit(self.limit)
            .sort(self.sort.clone());
        match &self.query {
            Some(search) => query.search(search.clone()),
            None => query,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// List API request logs
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Only requests with this HTTP method
        #[arg(long)]
        method: Option<String>,
        /// Only requests with this status code
        #[arg(long)]
        status: Option<String>,
        /// Only requests made with this API credential
        #[arg(long)]
        key: Option<String>,
        /// Only requests made against this API version
        #[arg(long = "api-version")]
        version: Option<String>,
    },
    /// Show one request log with its headers and bodies
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

impl LogsCommand {
    pub fn run(&self, config: &Config) -> Result<()> {
        let client = client(config);

        match self {
            LogsCommand::List {
                list,
                method,
                status,
                key,
                version,
            } => {
                let mut query = list.query();
                if let Some(method) = method {
                    query = query.filter("method", method.to_uppercase());
                }
                if let Some(status) = status {
                    query = query.filter("status_code", status.clone());
                }
                if let Some(key) = key {
                    query = query.filter("key", key.clone());
                }
                if let Some(version) = version {
                    query = query.filter("version", version.clone());
                }

                let page = client.list::<ApiRequestLog>(&query)?;
                print_records(&page.records, list.format)?;
                if list.format == Format::Table && page.has_next() {
                    notify_info(&format!("More results on page {}", list.page + 1));
                }
                Ok(())
            }
            LogsCommand::Show { id, format } => {
                let log = client.get::<ApiRequestLog>(id)?;
                match format {
                    Format::Table => print_request_log(&log),
                    Format::Json => print_json(&log)?,
                }
                Ok(())
            }
        }
    }
}

pub(crate) fn json_or_dash(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(value) => pretty_json(value),
    }
}

fn print_request_log(log: &ApiRequestLog) {
    print_details(&[
        ("ID", or_dash(log.public_id.as_deref())),
        ("Status", log.status()),
        ("Request", log.description()),
        ("URL", or_dash(log.full_url.as_deref())),
        ("API Credential", or_dash(log.api_credential_name.as_deref())),
        ("Version", or_dash(log.version.as_deref())),
        ("Source", or_dash(log.source.as_deref())),
        ("IP Address", or_dash(log.ip_address.as_deref())),
        (
            "Duration",
            log.duration
                .map(|d| format!("{:.3}s", d))
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Date", log.created_long().unwrap_or_default()),
        ("Query Params", json_or_dash(log.query_params.as_ref())),
        ("Request Headers", json_or_dash(log.request_headers.as_ref())),
        ("Request Body", json_or_dash(log.request_body.as_ref())),
        ("Response Headers", json_or_dash(log.response_headers.as_ref())),
        ("Response Body", json_or_dash(log.response_body.as_ref())),
    ]);
}
