//! CLI command implementations.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::{Network, PinningConfig};
use crate::deploy;
use crate::logo::{self, format_file_size, ImageRules, LogoFile};
use crate::upload::{HttpPinningTransport, UploadClient, UploadOutcome};
use crate::validation::{self, TokenParams};

/// Inputs for the `deploy` command.
pub struct DeployArgs {
    pub params: TokenParams,
    pub description: Option<String>,
    pub logo: Option<PathBuf>,
}

pub async fn validate_logo(path: &Path, json_output: bool) -> Result<()> {
    let file = LogoFile::from_path(path)?;
    let report = logo::validate(&file, &ImageRules::default()).await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", "Logo Validation".bold().cyan());
        println!("{}", "=".repeat(80).cyan());
        println!("{}: {}", "File".bold(), file.file_name);
        println!(
            "{}: {}",
            "Type".bold(),
            if report.content_type.is_empty() {
                "unknown".to_string()
            } else {
                report.content_type.clone()
            }
        );
        println!("{}: {}", "Size".bold(), format_file_size(report.size));
        if let Some(dims) = &report.dimensions {
            println!("{}: {}", "Dimensions".bold(), dims);
        }

        println!();
        if report.valid {
            println!("{}", "✓ Logo is valid".green().bold());
        } else if let Some(error) = &report.error {
            println!("{} {}", "✗".red().bold(), error.red());
        }
        for warning in &report.warnings {
            println!("{} {}", "!".yellow().bold(), warning.yellow());
        }
        println!();
    }

    if !report.valid {
        anyhow::bail!("logo validation failed");
    }
    Ok(())
}

pub async fn upload_logo(path: &Path, pinning: PinningConfig, quiet: bool) -> Result<()> {
    let file = LogoFile::from_path(path)?;
    let gateway = pinning.gateway.clone();
    let client = UploadClient::new(HttpPinningTransport::new(pinning), gateway);

    println!("\n{}", "Uploading logo to pinning gateway...".bold().cyan());

    let outcome = run_upload(&client, &file, quiet).await;

    match outcome {
        UploadOutcome {
            success: true,
            hash: Some(hash),
            url: Some(url),
            ..
        } => {
            println!("{}", "✓ Logo pinned".green().bold());
            println!("{}: {}", "Hash".bold(), hash);
            println!("{}: {}", "URL".bold(), url.bright_blue());
            println!();
            Ok(())
        }
        outcome => {
            let message = outcome
                .error
                .unwrap_or_else(|| "upload failed".to_string());
            println!("{} {}\n", "✗".red().bold(), message.red());
            anyhow::bail!("{}", message)
        }
    }
}

pub async fn deploy(
    factory_url: &str,
    network: Network,
    args: DeployArgs,
    pinning: Option<PinningConfig>,
) -> Result<()> {
    // Surface every parameter violation before any network traffic
    let report = validation::validate_token_params(&args.params);
    if !report.valid {
        println!("\n{}", "✗ Invalid token parameters".red().bold());
        for (field, message) in &report.errors {
            println!("  {} {}", format!("{}:", field).bold(), message.red());
        }
        println!();
        anyhow::bail!("fix the parameters above and retry");
    }
    if let Some(description) = &args.description {
        if let Err(message) = validation::validate_description(description) {
            anyhow::bail!("description: {}", message);
        }
    }

    let mut metadata_uri = None;
    if let Some(logo_path) = &args.logo {
        let pinning =
            pinning.context("logo upload requires pinning credentials (PINATA_API_KEY)")?;
        let file = LogoFile::from_path(logo_path)?;
        let gateway = pinning.gateway.clone();
        let client = UploadClient::new(HttpPinningTransport::new(pinning), gateway);

        println!("\n{}", "Uploading logo to pinning gateway...".bold().cyan());
        let outcome = run_upload(&client, &file, false).await;

        if !outcome.success {
            let message = outcome
                .error
                .unwrap_or_else(|| "upload failed".to_string());
            println!("{} {}\n", "✗".red().bold(), message.red());
            anyhow::bail!("{}", message);
        }
        let url = outcome.url.unwrap_or_default();
        println!("{} {}", "✓ Logo pinned:".green().bold(), url.bright_blue());
        metadata_uri = Some(url);
    }

    println!("\n{}", "Deploying token...".bold().cyan());
    let token = deploy::deploy_token(
        factory_url,
        &args.params,
        args.description.as_deref(),
        metadata_uri.as_deref(),
        network,
    )
    .await?;

    println!("{}", "✓ Token deployed successfully!".green().bold());
    println!("\n{}: {}", "Name".bold(), token.name);
    println!("{}: {}", "Symbol".bold(), token.symbol);
    println!("{}: {}", "Decimals".bold(), token.decimals);
    println!("{}: {}", "Address".bold(), token.address.bright_black());
    println!("{}: {}", "Admin".bold(), token.creator.bright_black());
    if let Some(uri) = &token.metadata_uri {
        println!("{}: {}", "Metadata".bold(), uri.bright_blue());
    }
    println!("{}: {}", "Network".bold(), network.to_string().bright_blue());
    println!();

    Ok(())
}

async fn run_upload(
    client: &UploadClient<HttpPinningTransport>,
    file: &LogoFile,
    quiet: bool,
) -> UploadOutcome {
    if quiet {
        return client.upload(file).await;
    }

    let outcome = client
        .upload_with_progress(
            file,
            Box::new(|percent| {
                print!("\r  {} {}%", "Progress:".bold(), percent);
                let _ = std::io::stdout().flush();
            }),
        )
        .await;
    println!();
    outcome
}
