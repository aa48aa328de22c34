use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use token_factory::commands::{self, DeployArgs};
use token_factory::config;
use token_factory::validation::TokenParams;
use token_factory::wizard;

#[derive(Parser)]
#[command(
    name = "token-factory",
    version,
    about = "Deploy Soroban tokens with logo pinning"
)]
struct Cli {
    /// Stellar network to target (mainnet, testnet, futurenet)
    #[arg(long, global = true)]
    network: Option<String>,

    /// Token factory service URL
    #[arg(long, global = true, env = "TOKEN_FACTORY_URL")]
    factory_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a logo image without uploading it
    ValidateLogo {
        /// Path to the image file
        path: PathBuf,

        /// Print the full validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload a logo to the pinning gateway
    UploadLogo {
        /// Path to the image file
        path: PathBuf,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,
    },

    /// Deploy a token with the given parameters
    Deploy {
        /// Token name (1-32 characters)
        #[arg(long)]
        name: String,

        /// Token symbol (1-12 uppercase letters/digits)
        #[arg(long)]
        symbol: String,

        /// Decimal places (0-18)
        #[arg(long, default_value_t = 7)]
        decimals: u32,

        /// Initial supply (whole number)
        #[arg(long)]
        initial_supply: String,

        /// Admin wallet address (G...)
        #[arg(long)]
        admin_wallet: String,

        /// Token description (max 500 characters)
        #[arg(long)]
        description: Option<String>,

        /// Logo image to pin and attach as metadata
        #[arg(long)]
        logo: Option<PathBuf>,
    },

    /// Interactive deployment wizard
    Wizard {},

    /// Show recent deployments
    History {
        /// Filter records by status, network, name or symbol
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of records to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let network = config::resolve_network(cli.network)?;
    let factory_url = config::resolve_factory_url(cli.factory_url)?;

    match cli.command {
        Commands::ValidateLogo { path, json } => {
            commands::validate_logo(&path, json).await?;
        }
        Commands::UploadLogo { path, quiet } => {
            let pinning = config::resolve_pinning()?;
            commands::upload_logo(&path, pinning, quiet).await?;
        }
        Commands::Deploy {
            name,
            symbol,
            decimals,
            initial_supply,
            admin_wallet,
            description,
            logo,
        } => {
            let params = TokenParams {
                name,
                symbol,
                decimals,
                initial_supply,
                admin_wallet,
            };
            let pinning = if logo.is_some() {
                Some(config::resolve_pinning()?)
            } else {
                None
            };
            commands::deploy(
                &factory_url,
                network,
                DeployArgs {
                    params,
                    description,
                    logo,
                },
                pinning,
            )
            .await?;
        }
        Commands::Wizard {} => {
            let pinning = config::resolve_pinning().ok();
            wizard::run(&factory_url, network, pinning).await?;
        }
        Commands::History { search, limit } => {
            wizard::show_history(search.as_deref(), limit)?;
        }
    }

    Ok(())
}
