use clap::{Args, Parser, Subcommand, ValueEnum};

use reembolso::error::AppError;

use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Reembolso Tracker",
    about = "Run the reimbursement tracker API and its background sweeps",
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
    /// Run one background sweep immediately and print its summary
    Sweep(SweepArgs),
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

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Which sweep to run
    #[arg(value_enum)]
    pub(crate) kind: SweepKind,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub(crate) enum SweepKind {
    Reminders,
    Housekeeping,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Sweep(args) => server::run_sweep_once(args.kind),
    }
}
