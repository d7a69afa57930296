use crate::infra::open_store;
use clap::Args;
use prospect_intake::config::{AppConfig, SeedAttorney};
use prospect_intake::error::AppError;
use prospect_intake::storage::seed_attorneys;
use prospect_intake::telemetry;

#[derive(Args, Debug)]
pub(crate) struct AddAttorneyArgs {
    /// Display name used in submission emails
    #[arg(long)]
    pub(crate) name: String,
    /// Login and notification address (stored lowercase)
    #[arg(long)]
    pub(crate) email: String,
    /// Plain-text password; only the bcrypt hash is stored
    #[arg(long)]
    pub(crate) password: String,
}

pub(crate) async fn run_seed() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let store = open_store(&config.database).await?;
    let inserted = seed_attorneys(store.as_ref(), &config.seed_attorneys).await?;

    println!(
        "Schema ready at {}. Seeded {} of {} attorney(s).",
        config.database.url,
        inserted,
        config.seed_attorneys.len()
    );
    Ok(())
}

pub(crate) async fn add_attorney(args: AddAttorneyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let store = open_store(&config.database).await?;
    let email = args.email.trim().to_lowercase();
    let seed = SeedAttorney {
        name: args.name,
        email: email.clone(),
        password: args.password,
    };

    if seed_attorneys(store.as_ref(), &[seed]).await? == 0 {
        println!("Attorney {email} is already registered.");
    } else {
        println!("Registered attorney {email}.");
    }
    Ok(())
}
