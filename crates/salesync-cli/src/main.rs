use clap::{Parser, Subcommand};
use uuid::Uuid;

use salesync_engine::{Engine, ReconcileOutcome};

#[derive(Debug, Parser)]
#[command(name = "salesync-cli")]
#[command(about = "Campaign price reconciliation command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a reconciliation pass for a shop, optionally scoped to one campaign.
    Reconcile {
        #[arg(long)]
        shop: String,
        #[arg(long)]
        campaign: Option<Uuid>,
    },
    /// List a shop's campaigns.
    Campaigns {
        #[arg(long)]
        shop: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = salesync_core::load_app_config()?;
    let pool_config = salesync_db::PoolConfig::from_app_config(&config);
    let pool = salesync_db::connect_pool(&config.database_url, pool_config).await?;
    salesync_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Reconcile { shop, campaign } => {
            let engine = Engine::from_config(pool, &config)?;
            match engine.reconcile(&shop, campaign).await? {
                ReconcileOutcome::Completed(summary) => {
                    println!(
                        "reconciled {} products: {} variants updated, {} errors",
                        summary.products_considered, summary.updated_variants, summary.errors
                    );
                }
                ReconcileOutcome::CampaignNotFound => {
                    println!("no campaign with that id");
                }
            }
        }
        Commands::Campaigns { shop } => {
            let campaigns = salesync_db::load_campaigns_with_targets(&pool, &shop).await?;
            if campaigns.is_empty() {
                println!("no campaigns for {shop}");
            }
            for campaign in campaigns {
                println!(
                    "{} {} {} {} (active: {}, tracking: {}, products: {}, collections: {})",
                    campaign.id,
                    campaign.name,
                    campaign.discount_type.as_str(),
                    campaign.discount_value,
                    campaign.active,
                    campaign.tracking,
                    campaign.products.len(),
                    campaign.collections.len()
                );
            }
        }
    }

    Ok(())
}
