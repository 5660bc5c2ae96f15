use crate::demo::{run_check_url, run_demo, CheckUrlArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mod_ack::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Acknowledgement Activity",
    about = "Serve and demonstrate the acknowledgement course activity",
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
    /// Create, edit and delete one instance of each content type in memory
    Demo(DemoArgs),
    /// Run the settings form URL check against one or more values
    CheckUrl(CheckUrlArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::CheckUrl(args) => run_check_url(args),
    }
}
