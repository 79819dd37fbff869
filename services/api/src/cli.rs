use clap::{Args, Parser, Subcommand};
use hostel_desk::error::AppError;

use crate::demo::{run_demo, run_maintenance_report, MaintenanceReportArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Hostel Maintenance Desk",
    about = "Run and demonstrate the hostel maintenance desk from the command line",
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
    /// Offline tooling over maintenance ticket exports
    Maintenance {
        #[command(subcommand)]
        command: MaintenanceCommand,
    },
    /// Walk a leaking-tap ticket from submission to rating
    Demo,
}

#[derive(Subcommand, Debug)]
enum MaintenanceCommand {
    /// Aggregate a CSV export into a status/category/priority report
    Report(MaintenanceReportArgs),
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
        Command::Maintenance {
            command: MaintenanceCommand::Report(args),
        } => run_maintenance_report(args),
        Command::Demo => run_demo(),
    }
}
