use clap::{Parser, Subcommand};
use eyre::Result;

mod cmd;

use cmd::channels::ChannelsArgs;
use cmd::events::EventsCommand;
use cmd::keys::KeysCommand;
use cmd::logs::LogsCommand;
use cmd::metrics::MetricsArgs;
use cmd::watch::WatchArgs;
use cmd::webhooks::WebhooksCommand;
use cmd::GlobalArgs;

#[derive(Debug, Parser)]
#[command(name = "devconsole", version, about = "Developer console for the platform API")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch the events published on a socket channel
    Watch(WatchArgs),
    /// List the channels available to watch
    Channels(ChannelsArgs),
    /// Manage API keys
    #[command(subcommand)]
    Keys(KeysCommand),
    /// Manage webhook endpoints
    #[command(subcommand)]
    Webhooks(WebhooksCommand),
    /// Browse API request logs
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Browse API events
    #[command(subcommand)]
    Events(EventsCommand),
    /// Request and webhook statistics of the last week
    Metrics(MetricsArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        cmd::notify_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.global.config();

    match &cli.command {
        Command::Watch(args) => cmd::init_file_logger(args.log_file.as_deref())?,
        _ => cmd::init_logger(),
    }

    match &cli.command {
        Command::Watch(args) => args.run(&config),
        Command::Channels(args) => args.run(&config),
        Command::Keys(command) => command.run(&config),
        Command::Webhooks(command) => command.run(&config),
        Command::Logs(command) => command.run(&config),
        Command::Events(command) => command.run(&config),
        Command::Metrics(args) => args.run(&config),
    }
}
