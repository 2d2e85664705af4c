use crate::commands::{
    run_catalog_check, run_download_url, run_records_export, run_records_list,
    run_records_match, run_register, CatalogCheckArgs, DownloadUrlArgs, ExportArgs, ListArgs,
    MatchArgs, RegisterArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use registro_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Registro Portal",
    about = "Serve and operate the candidate registration portal from the command line",
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
    /// Inspect submitted registration records
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },
    /// Print the forced-download link for a stored attachment URL
    DownloadUrl(DownloadUrlArgs),
    /// Work with the requirements catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Validate a saved form and submit it to the registration API
    Register(RegisterArgs),
}

#[derive(Subcommand, Debug)]
enum RecordsCommand {
    /// Print one filtered page of records
    List(ListArgs),
    /// Write the filtered records to a CSV file
    Export(ExportArgs),
    /// Show requirement coverage for one candidate
    Match(MatchArgs),
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Validate a catalog file and optionally compare it against stored records
    Check(CatalogCheckArgs),
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
        Command::Records {
            command: RecordsCommand::List(args),
        } => run_records_list(args).await,
        Command::Records {
            command: RecordsCommand::Export(args),
        } => run_records_export(args).await,
        Command::Records {
            command: RecordsCommand::Match(args),
        } => run_records_match(args).await,
        Command::DownloadUrl(args) => run_download_url(args),
        Command::Catalog {
            command: CatalogCommand::Check(args),
        } => run_catalog_check(args).await,
        Command::Register(args) => run_register(args).await,
    }
}
