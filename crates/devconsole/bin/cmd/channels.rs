use clap::Args;
use devconsole::resources::{ApiCredential, ResourceQuery};
use devconsole::{known_channels, Config};
use eyre::Result;

use super::{client, print_records, Format};

#[derive(Debug, Args)]
pub struct ChannelsArgs {
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

impl ChannelsArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let credentials = client(config).list_all::<ApiCredential>(&ResourceQuery::new())?;
        let channels = known_channels(&credentials, config.company_id.as_deref());
        print_records(&channels, self.format)
    }
}
