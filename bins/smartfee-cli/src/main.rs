//! smartfee-cli — Command-line front end for Smart Fee.
//!
//! Queries the fee service, registers return addresses, and produces
//! change-free build parameters either live (through an Express wallet
//! gateway) or offline from a saved trial build.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use smartfee_client::{ApiKey, ExpressWalletEngine, SmartFeeClient};
use smartfee_core::{AddressType, FeeService, Recipient};
use smartfee_planner::trial::trial_params;
use smartfee_planner::{
    ChangeEliminationReconciler, Reconciliation, RoundingPolicy, SmartFeeOptions,
    augment_recipients, plan_with_service,
};

mod config;
mod files;

use config::Config;

/// Smart Fee command-line interface.
#[derive(Parser)]
#[command(name = "smartfee-cli")]
#[command(version, about = "Change-free withdrawal batches with a Smart Fee bumping output.")]
struct Cli {
    /// Prompt for the API key instead of reading SMARTFEE_API_KEY.
    #[arg(long, global = true)]
    prompt_key: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current next-block minimum fee rate (sats/kB).
    Fee,
    /// Request a one-time bumping address.
    BumpAddress,
    /// Register the address bumped funds are returned to.
    ReturnAddress(ReturnAddressArgs),
    /// Generate send params against a live wallet (Express gateway).
    Plan(PlanArgs),
    /// Reconcile a saved trial build offline.
    Reconcile(ReconcileArgs),
}

#[derive(Args)]
struct ReturnAddressArgs {
    /// Address to register.
    #[arg(short, long)]
    address: String,
}

#[derive(Args)]
struct PolicyArgs {
    /// Output script type (p2sh, p2shP2wsh, p2wsh, p2tr).
    #[arg(long, default_value = "p2wsh")]
    address_type: AddressType,

    /// Fee-rate rounding when recomputing (directional or nearest).
    #[arg(long, default_value = "directional")]
    rounding: RoundingPolicy,
}

#[derive(Args)]
struct PlanArgs {
    /// JSON file with the recipient list.
    #[arg(short, long)]
    recipients: PathBuf,

    /// Label for the wallet return address.
    #[arg(short, long)]
    label: Option<String>,

    /// Desired wallet unspent count (enables change splitting).
    #[arg(long)]
    target_unspents: Option<u32>,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Args)]
struct ReconcileArgs {
    /// JSON file with the saved trial build.
    #[arg(short, long)]
    trial: PathBuf,

    /// JSON file with the original recipient list.
    #[arg(short, long)]
    recipients: PathBuf,

    /// Bumping address the trial build paid.
    #[arg(short, long)]
    bump_address: String,

    /// Fee rate (sats/kB) the trial build requested.
    #[arg(long, default_value = "0")]
    fee_rate: u64,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Fee => {
            let service = fee_client(&config, cli.prompt_key)?;
            println!("{}", service.fee_rate().await?);
            Ok(())
        }
        Commands::BumpAddress => {
            let service = fee_client(&config, cli.prompt_key)?;
            println!("{}", service.bump_address().await?);
            Ok(())
        }
        Commands::ReturnAddress(args) => {
            let service = fee_client(&config, cli.prompt_key)?;
            service.register_return_address(&args.address).await?;
            println!("Registered return address {}", args.address);
            Ok(())
        }
        Commands::Plan(args) => plan(&config, cli.prompt_key, args).await,
        Commands::Reconcile(args) => reconcile(args),
    }
}

/// Resolve the API key from the environment or an interactive prompt.
fn api_key(config: &Config, prompt: bool) -> Result<ApiKey> {
    if prompt {
        let key = rpassword::prompt_password("Smart Fee API key: ")
            .context("Failed to read API key")?;
        return Ok(ApiKey::new(key));
    }
    match &config.api_key {
        Some(key) => Ok(key.clone()),
        None => bail!("SMARTFEE_API_KEY is not set (or pass --prompt-key)"),
    }
}

fn fee_client(config: &Config, prompt: bool) -> Result<SmartFeeClient> {
    let key = api_key(config, prompt)?;
    info!(env = %config.environment, "using Smart Fee service");
    SmartFeeClient::new(config.environment.clone(), key).context("Failed to build HTTP client")
}

/// Run the whole pipeline against the configured Express gateway.
async fn plan(config: &Config, prompt: bool, args: PlanArgs) -> Result<()> {
    let express = config
        .express
        .as_ref()
        .context("plan needs SMARTFEE_EXPRESS_URL, SMARTFEE_WALLET_ID and SMARTFEE_ACCESS_TOKEN")?;
    let recipients = files::load_recipients(&args.recipients)?;

    let options = SmartFeeOptions {
        api_key: Some(api_key(config, prompt)?),
        return_address_label: args.label,
        target_wallet_unspents: args.target_unspents,
        address_type: args.policy.address_type,
        rounding: args.policy.rounding,
    };
    let wallet = ExpressWalletEngine::new(
        express.url.clone(),
        express.coin.clone(),
        express.wallet_id.clone(),
        express.access_token.clone(),
    )
    .context("Failed to build wallet gateway client")?;
    let key = options.validate()?.clone();
    let service = SmartFeeClient::new(config.environment.clone(), key)
        .context("Failed to build HTTP client")?;
    info!(env = %config.environment, wallet = %express.wallet_id, "planning against wallet gateway");

    let outcome = plan_with_service(&wallet, &service, &recipients, &options)
        .await
        .context("Failed to generate send params")?;
    report(&outcome);
    println!("{}", serde_json::to_string_pretty(outcome.params())?);
    Ok(())
}

/// Reconcile a trial build saved from an earlier prebuild.
fn reconcile(args: ReconcileArgs) -> Result<()> {
    let trial = files::load_trial(&args.trial)?;
    let recipients = files::load_recipients(&args.recipients)?;

    let (augmented, _) = augment_recipients(&recipients, &args.bump_address)?;
    let params = trial_params(augmented, args.fee_rate, args.policy.address_type, None);

    let outcome = ChangeEliminationReconciler::new(args.policy.address_type, args.policy.rounding)
        .reconcile(params, &trial, &recipients, &args.bump_address)
        .context("Failed to reconcile trial build")?;
    report(&outcome);
    println!("{}", serde_json::to_string_pretty(outcome.params())?);
    Ok(())
}

fn report(outcome: &Reconciliation) {
    match outcome {
        Reconciliation::Accepted { change_outputs, .. } => {
            eprintln!("Trial build accepted ({change_outputs} change output(s))");
        }
        Reconciliation::Recomputed {
            new_size,
            new_fee,
            bump_amount,
            params,
        } => {
            let bump: Option<&Recipient> = params.recipients.last();
            eprintln!(
                "Recomputed without change: size {new_size} bytes, fee {new_fee} sats, \
                 Smart Fee output {bump_amount} sats to {}",
                bump.map(|r| r.address.as_str()).unwrap_or("?")
            );
        }
    }
}
