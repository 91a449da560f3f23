use prettytable::{Cell, Row, Table};

use crate::channels::KnownChannel;
use crate::resources::{
    ApiCredential, ApiEvent, ApiRequestLog, Dated, WebhookEndpoint, WebhookRequestLog,
};

/// One column of a listing: header label and how to render a record's cell.
pub struct Column<R> {
    pub label: &'static str,
    pub value: fn(&R) -> String,
}

impl<R> Column<R> {
    pub fn new(label: &'static str, value: fn(&R) -> String) -> Self {
        Self { label, value }
    }
}

/// Records that can be listed as a table.
pub trait Tabular: Sized {
    fn columns() -> Vec<Column<Self>>;
}

fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

/// Hides all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), visible)
}

impl Tabular for ApiCredential {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("Name", |k| k.display_name().to_string()),
            Column::<Self>::new("Public Key", |k| or_dash(k.key.as_deref())),
            Column::<Self>::new("Secret Key", |k| {
                k.secret.as_deref().map(mask_secret).unwrap_or_else(|| "-".to_string())
            }),
            Column::<Self>::new("Environment", |k| k.environment().to_string()),
            Column::<Self>::new("Expiry", |k| k.expires()),
            Column::<Self>::new("Last Used", |k| k.last_used()),
            Column::<Self>::new("Created", |k| k.created_long().unwrap_or_default()),
        ]
    }
}

impl Tabular for WebhookEndpoint {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("URL", |w| or_dash(w.url.as_deref())),
            Column::<Self>::new("Status", |w| w.status.clone()),
            Column::<Self>::new("Mode", |w| w.mode.clone()),
            Column::<Self>::new("Version", |w| or_dash(w.version.as_deref())),
            Column::<Self>::new("Created", |w| w.created_short().unwrap_or_default()),
        ]
    }
}

impl Tabular for ApiRequestLog {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("Status", |l| l.status()),
            Column::<Self>::new("ID", |l| or_dash(l.public_id.as_deref())),
            Column::<Self>::new("Description", |l| l.description()),
            Column::<Self>::new("API Credential", |l| or_dash(l.api_credential_name.as_deref())),
            Column::<Self>::new("HTTP Method", |l| or_dash(l.method.as_deref())),
            Column::<Self>::new("Version", |l| or_dash(l.version.as_deref())),
            Column::<Self>::new("Date", |l| l.created_long().unwrap_or_default()),
        ]
    }
}

impl Tabular for ApiEvent {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("Event", |e| or_dash(e.description.as_deref())),
            Column::<Self>::new("Code", |e| or_dash(e.event.as_deref())),
            Column::<Self>::new("ID", |e| or_dash(e.public_id.as_deref())),
            Column::<Self>::new("Date", |e| e.created_long().unwrap_or_default()),
        ]
    }
}

impl Tabular for WebhookRequestLog {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("Result", |a| a.result().to_uppercase()),
            Column::<Self>::new("Event Type", |a| or_dash(a.event_name())),
            Column::<Self>::new("Event ID", |a| or_dash(a.event_public_id())),
            Column::<Self>::new("Created", |a| a.created_long().unwrap_or_default()),
            Column::<Self>::new("Attempt", |a| {
                a.attempt.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
            }),
        ]
    }
}

impl Tabular for KnownChannel {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("Channel", |c| c.name.clone()),
            Column::<Self>::new("Kind", |c| c.kind.label().to_string()),
            Column::<Self>::new("Source", |c| or_dash(c.source.as_deref())),
        ]
    }
}

/// Builds a table with one header row and one row per record.
pub fn build_table<R: Tabular>(records: &[R]) -> Table {
    let columns = R::columns();
    let mut table = Table::new();

    table.add_row(Row::new(
        columns.iter().map(|c| Cell::new(c.label)).collect(),
    ));

    for record in records {
        table.add_row(Row::new(
            columns
                .iter()
                .map(|c| Cell::new(&(c.value)(record)))
                .collect(),
        ));
    }

    table
}

pub fn render_table<R: Tabular>(records: &[R]) -> String {
    build_table(records).to_string()
}
