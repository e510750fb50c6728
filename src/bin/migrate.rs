use clap::Parser;
use retail_orders::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    migration::Migrator,
};
use sea_orm_migration::MigratorTrait;

/// Applies the schema, or rolls every migration back with `--reset`.
#[derive(Debug, Parser)]
#[command(name = "migrate")]
struct Args {
    /// Drop every table before applying the schema again.
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,retail_orders=debug".into()),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    if args.reset {
        Migrator::down(&orm, None).await?;
        tracing::info!("all migrations rolled back");
    }
    run_migrations(&orm).await?;
    println!("Migrations applied");
    Ok(())
}
