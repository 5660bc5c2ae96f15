mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use mod_ack::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
