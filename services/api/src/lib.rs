mod accounts;
mod cli;
mod infra;
mod routes;
mod server;

use prospect_intake::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
