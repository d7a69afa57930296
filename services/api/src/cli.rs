use crate::accounts::{add_attorney, run_seed, AddAttorneyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use prospect_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Prospect Intake",
    about = "Run the prospect intake service and manage attorney accounts",
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
    /// Create the schema and insert the configured seed attorneys
    Seed,
    /// Manage attorney accounts
    Attorney {
        #[command(subcommand)]
        command: AttorneyCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AttorneyCommand {
    /// Register an attorney who can receive prospects and sign in to admin routes
    Add(AddAttorneyArgs),
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
        Command::Seed => run_seed().await,
        Command::Attorney {
            command: AttorneyCommand::Add(args),
        } => add_attorney(args).await,
    }
}
