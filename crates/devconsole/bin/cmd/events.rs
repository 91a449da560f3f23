use clap::Subcommand;
use devconsole::resources::{ApiEvent, Dated};
use devconsole::Config;
use eyre::Result;

use super::logs::{json_or_dash, ListArgs};
use super::{client, notify_info, or_dash, print_details, print_json, print_records, Format};

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List API events
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Only events of this type, e.g. `order.created`
        #[arg(long)]
        event: Option<String>,
    },
    /// Show one event with its data
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

impl EventsCommand {
    pub fn run(&self, config: &Config) -> Result<()> {
        let client = client(config);

        match self {
            EventsCommand::List { list, event } => {
                let mut query = list.query();
                if let Some(event) = event {
                    query = query.filter("event", event.clone());
                }

                let page = client.list::<ApiEvent>(&query)?;
                print_records(&page.records, list.format)?;
                if list.format == Format::Table && page.has_next() {
                    notify_info(&format!("More results on page {}", list.page + 1));
                }
                Ok(())
            }
            EventsCommand::Show { id, format } => {
                let event = client.get::<ApiEvent>(id)?;
                match format {
                    Format::Table => print_details(&[
                        ("ID", or_dash(event.public_id.as_deref())),
                        ("Event", or_dash(event.event.as_deref())),
                        ("Description", or_dash(event.description.as_deref())),
                        ("Source", or_dash(event.source.as_deref())),
                        ("Method", or_dash(event.method.as_deref())),
                        ("Date", event.created_long().unwrap_or_default()),
                        ("Data", json_or_dash(event.data.as_ref())),
                    ]),
                    Format::Json => print_json(&event)?,
                }
                Ok(())
            }
        }
    }
}
