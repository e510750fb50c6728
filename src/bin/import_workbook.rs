use std::path::PathBuf;

use clap::Parser;
use retail_orders::{
    assets::PhotoStorage,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    importer::{ImportError, ImportOptions, run_import},
};

/// Replaces all pickup points, users (except superusers), products and orders with the
/// contents of a workbook.
#[derive(Debug, Parser)]
#[command(name = "import-workbook")]
struct Args {
    /// Workbook with the sheets "Pickup point", "User", "Product" and "Order".
    path: PathBuf,

    /// Reject items without a quantity, unknown SKUs and ambiguous client names.
    #[arg(long, env = "IMPORT_STRICT_ITEMS")]
    strict_items: bool,
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
    run_migrations(&orm).await?;
    let photos = PhotoStorage::new(config.media_root.clone());

    let options = ImportOptions {
        strict_items: args.strict_items || config.strict_items,
    };
    match run_import(&orm, &photos, &args.path, options).await {
        Ok(summary) => {
            println!(
                "Data imported successfully: {} pickup points, {} users, {} products, {} orders ({} items)",
                summary.pickup_points,
                summary.users,
                summary.products,
                summary.orders,
                summary.order_items,
            );
            if summary.skipped_items > 0 {
                println!("Skipped {} items with unknown SKUs", summary.skipped_items);
            }
            for name in &summary.ambiguous_clients {
                println!("Ambiguous client name, orders left without client: {name}");
            }
            Ok(())
        }
        Err(err @ ImportError::FileNotFound(_)) => {
            eprintln!("{err}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
