//! Interactive token deployment wizard and deployment history.
//!
//! The terminal stand-in for the original deployment form: every field is
//! prompted with the same validators the non-interactive command uses, the
//! plan is previewed, and each run is appended to an NDJSON history file
//! under `~/.token-factory/`.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;

use crate::config::{Network, PinningConfig};
use crate::deploy;
use crate::logo::{self, format_file_size, ImageRules, LogoFile};
use crate::upload::{HttpPinningTransport, UploadClient};
use crate::validation::{self, TokenParams};

const HISTORY_FILE_NAME: &str = "deployments.ndjson";

pub async fn run(
    factory_url: &str,
    network: Network,
    pinning: Option<PinningConfig>,
) -> Result<()> {
    println!("\n{}", "Token Deployment Wizard".bold().cyan());
    println!("{}", "=".repeat(80).cyan());

    let name = prompt_with_validation("Token name", None, validation::validate_token_name)?;
    let symbol = prompt_with_validation("Token symbol", None, validation::validate_token_symbol)?;
    let decimals_str = prompt_with_validation(
        "Decimals (0-18)",
        Some("7".to_string()),
        |s| match s.trim().parse::<u32>() {
            Ok(value) => validation::validate_decimals(value),
            Err(_) => Err("decimals must be a whole number".to_string()),
        },
    )?;
    let decimals: u32 = decimals_str.trim().parse().unwrap_or(7);
    let initial_supply =
        prompt_with_validation("Initial supply", None, validation::validate_initial_supply)?;
    let admin_wallet = prompt_with_validation(
        "Admin wallet (G...)",
        None,
        validation::validate_admin_wallet,
    )?;
    let description = prompt_with_validation(
        "Description (optional)",
        Some(String::new()),
        validation::validate_description,
    )?;

    let logo_path = prompt_with_validation(
        "Path to logo image (optional)",
        Some(String::new()),
        |s| {
            let s = s.trim();
            if s.is_empty() || Path::new(s).is_file() {
                Ok(())
            } else {
                Err("file not found".to_string())
            }
        },
    )?;

    let params = TokenParams {
        name,
        symbol,
        decimals,
        initial_supply,
        admin_wallet,
    };

    let logo_file = if logo_path.trim().is_empty() {
        None
    } else {
        Some(LogoFile::from_path(Path::new(logo_path.trim()))?)
    };

    println!("\n{}", "Deployment Plan Preview".bold().cyan());
    println!("{}", "-".repeat(80).cyan());
    println!("{}: {}", "Network".bold(), network.to_string().bright_blue());
    println!("{}: {}", "Name".bold(), params.name);
    println!("{}: {}", "Symbol".bold(), params.symbol);
    println!("{}: {}", "Decimals".bold(), params.decimals);
    println!("{}: {}", "Initial supply".bold(), params.initial_supply);
    println!(
        "{}: {}",
        "Admin wallet".bold(),
        shorten_address(&params.admin_wallet).bright_black()
    );
    if !description.is_empty() {
        println!("{}: {}", "Description".bold(), description.bright_black());
    }
    if let Some(file) = &logo_file {
        println!(
            "{}: {} ({})",
            "Logo".bold(),
            file.file_name,
            format_file_size(file.size()).bright_black()
        );
    }
    println!("{}", "-".repeat(80).cyan());

    if !confirm("Proceed with deployment? [y/N]", false)? {
        println!("{}", "Aborted.".yellow());
        let _ = record_history(json!({
            "status": "planned",
            "network": network.as_str(),
            "name": params.name,
            "symbol": params.symbol,
            "admin": shorten_address(&params.admin_wallet),
            "ts": now_ts(),
        }));
        return Ok(());
    }

    let mut metadata_uri: Option<String> = None;
    if let Some(file) = &logo_file {
        let report = logo::validate(file, &ImageRules::default()).await;
        if !report.valid {
            let message = report
                .error
                .unwrap_or_else(|| "logo failed validation".to_string());
            println!("{} {}", "✗ Logo rejected:".red().bold(), message.red());
            let _ = record_history(json!({
                "status": "logo_rejected",
                "network": network.as_str(),
                "name": params.name,
                "symbol": params.symbol,
                "error": message,
                "ts": now_ts(),
            }));
            return Ok(());
        }
        for warning in &report.warnings {
            println!("{} {}", "!".yellow().bold(), warning.yellow());
        }

        let Some(pinning) = pinning else {
            println!(
                "{}",
                "No pinning credentials configured; cannot upload the logo.".yellow()
            );
            println!(
                "{}",
                "Set PINATA_API_KEY and PINATA_SECRET_API_KEY and retry.".yellow()
            );
            return Ok(());
        };

        let gateway = pinning.gateway.clone();
        let client = UploadClient::new(HttpPinningTransport::new(pinning), gateway);
        println!("{}", "Uploading logo...".bright_black());
        let outcome = client
            .upload_with_progress(
                file,
                Box::new(|percent| {
                    print!("\r  {} {}%", "Progress:".bold(), percent);
                    let _ = io::stdout().flush();
                }),
            )
            .await;
        println!();

        if !outcome.success {
            let message = outcome
                .error
                .unwrap_or_else(|| "upload failed".to_string());
            println!("{} {}", "✗ Upload failed:".red().bold(), message.red());
            let _ = record_history(json!({
                "status": "upload_failed",
                "network": network.as_str(),
                "name": params.name,
                "symbol": params.symbol,
                "error": message,
                "ts": now_ts(),
            }));
            return Ok(());
        }

        let url = outcome.url.unwrap_or_default();
        println!("{} {}", "✓ Logo pinned:".green().bold(), url.bright_blue());
        metadata_uri = Some(url);
    }

    let deployed = deploy::deploy_token(
        factory_url,
        &params,
        if description.is_empty() {
            None
        } else {
            Some(description.as_str())
        },
        metadata_uri.as_deref(),
        network,
    )
    .await;

    match deployed {
        Ok(token) => {
            println!("{}", "✓ Token deployed".green().bold());
            println!("{}: {}", "Address".bold(), token.address.bright_black());
            let _ = record_history(json!({
                "status": "success",
                "network": network.as_str(),
                "name": params.name,
                "symbol": params.symbol,
                "admin": shorten_address(&params.admin_wallet),
                "address": token.address,
                "metadata_uri": metadata_uri,
                "ts": now_ts(),
            }));
        }
        Err(error) => {
            println!("{} {}", "✗ Deployment failed:".red().bold(), error);
            let _ = record_history(json!({
                "status": "failed",
                "network": network.as_str(),
                "name": params.name,
                "symbol": params.symbol,
                "error": error.to_string(),
                "ts": now_ts(),
            }));
        }
    }

    println!();
    Ok(())
}

pub fn show_history(search: Option<&str>, limit: usize) -> Result<()> {
    let path = history_path().context("Cannot determine home directory")?;
    if !path.exists() {
        println!("{}", "No history found.".yellow());
        return Ok(());
    }

    let file = File::open(&path).context("Failed to open history file")?;
    let reader = BufReader::new(file);

    let mut count = 0usize;
    let needle = search.map(|s| s.to_lowercase());

    println!("\n{}", "Deployment History".bold().cyan());
    println!("{}", "=".repeat(80).cyan());

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => continue,
        };

        if let Some(ref query) = needle {
            let haystack = format!(
                "{} {} {} {}",
                record.get("status").and_then(|x| x.as_str()).unwrap_or(""),
                record.get("network").and_then(|x| x.as_str()).unwrap_or(""),
                record.get("name").and_then(|x| x.as_str()).unwrap_or(""),
                record.get("symbol").and_then(|x| x.as_str()).unwrap_or("")
            )
            .to_lowercase();
            if !haystack.contains(query) {
                continue;
            }
        }

        print_record(&record);
        count += 1;
        if count >= limit {
            break;
        }
    }

    if count == 0 {
        println!("{}", "No matching records.".yellow());
    } else {
        println!(
            "\n{}",
            format!("Showing {} record(s)", count).bright_black()
        );
    }
    println!();
    Ok(())
}

fn print_record(record: &serde_json::Value) {
    let status = record.get("status").and_then(|x| x.as_str()).unwrap_or("");
    let status_str = match status {
        "success" => "✓ success".green(),
        "planned" => "planned".yellow(),
        "failed" => "failed".red(),
        "logo_rejected" | "upload_failed" => status.red(),
        _ => status.normal(),
    };
    println!(
        "{} {} {} {}",
        "●".green(),
        status_str.bold(),
        record
            .get("symbol")
            .and_then(|x| x.as_str())
            .unwrap_or("")
            .bold(),
        record
            .get("network")
            .and_then(|x| x.as_str())
            .unwrap_or("")
            .bright_blue()
    );
    if let Some(address) = record.get("address").and_then(|x| x.as_str()) {
        println!("   {} {}", "Address:".bold(), address.bright_black());
    }
    if let Some(uri) = record.get("metadata_uri").and_then(|x| x.as_str()) {
        println!("   {} {}", "Metadata:".bold(), uri.bright_black());
    }
    if let Some(error) = record.get("error").and_then(|x| x.as_str()) {
        println!("   {} {}", "Error:".bold(), error.red());
    }
    if let Some(ts) = record.get("ts").and_then(|x| x.as_i64()) {
        println!("   {} {}", "Timestamp:".bold(), ts);
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".token-factory");
        p.push(HISTORY_FILE_NAME);
        p
    })
}

fn record_history(entry: serde_json::Value) -> Result<()> {
    let path = history_path().context("Cannot determine home directory")?;
    if let Some(parent) = path.parent() {
        create_dir_all(parent).context("Failed to create history directory")?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context("Failed to open history file")?;
    writeln!(file, "{}", entry).context("Failed to append history record")?;
    Ok(())
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

fn shorten_address(address: &str) -> String {
    let address = address.trim();
    if address.len() > 12 {
        format!("{}…{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

fn prompt(label: &str, default: Option<String>) -> Result<String> {
    print!(
        "{}{}: ",
        label.bold(),
        default
            .as_ref()
            .filter(|d| !d.is_empty())
            .map(|d| format!(" [{}]", d))
            .unwrap_or_default()
    );
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    let s = buf.trim().to_string();
    if s.is_empty() {
        Ok(default.unwrap_or_default())
    } else {
        Ok(s)
    }
}

fn prompt_with_validation<F>(label: &str, default: Option<String>, validate: F) -> Result<String>
where
    F: Fn(&str) -> Result<(), String>,
{
    loop {
        let value = prompt(label, default.clone())?;
        match validate(&value) {
            Ok(()) => return Ok(value),
            Err(message) => println!("{} {}", "✗".red(), message.red()),
        }
    }
}

fn confirm(label: &str, default: bool) -> Result<bool> {
    let answer = prompt(label, None)?;
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() {
        return Ok(default);
    }
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_address() {
        let full = "GDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";
        let short = shorten_address(full);
        assert!(short.starts_with("GDLZFC"));
        assert!(short.ends_with("CYSC"));
        assert!(short.len() < full.len());

        assert_eq!(shorten_address("GABC"), "GABC");
    }
}
