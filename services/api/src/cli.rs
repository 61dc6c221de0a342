use crate::demo::{run_demo, run_roster, run_slot, DemoArgs, RosterArgs, SlotArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use stay_ops::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Stay Operations Service",
    about = "Run the guest-access and cleaning-operations service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute the cleaning slot for a checkout instant
    Slot(SlotArgs),
    /// Import and print a cleaner roster from a Name,Phone CSV export
    Roster(RosterArgs),
    /// Run an end-to-end console demo covering stays, PINs, and cleaning
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Slot(args) => run_slot(args),
        Command::Roster(args) => run_roster(args),
        Command::Demo(args) => run_demo(args),
    }
}
