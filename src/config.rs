//! Configuration resolution for the deployment CLI.
//!
//! Network and factory endpoint follow the usual chain: CLI flag, then the
//! `~/.token-factory.toml` config file, then a default. Pinning credentials
//! additionally read the `PINATA_*` environment variables, which win over
//! the config file.

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FACTORY_URL: &str = "http://localhost:8080";
pub const DEFAULT_PINATA_API_BASE: &str = "https://api.pinata.cloud";
pub const DEFAULT_PINATA_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs";

const CONFIG_FILE_NAME: &str = ".token-factory.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Futurenet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Futurenet => "futurenet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "futurenet" => Ok(Network::Futurenet),
            _ => anyhow::bail!(
                "Invalid network: {}. Allowed values: mainnet, testnet, futurenet",
                s
            ),
        }
    }
}

/// Pinning gateway endpoint and the two static auth headers.
#[derive(Debug, Clone)]
pub struct PinningConfig {
    pub api_base: String,
    pub gateway: String,
    pub api_key: String,
    pub secret_api_key: String,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    network: Option<String>,
    factory_url: Option<String>,
    #[serde(default)]
    pinning: PinningSection,
}

#[derive(Debug, Deserialize, Default)]
struct PinningSection {
    api_base: Option<String>,
    gateway: Option<String>,
    api_key: Option<String>,
    secret_api_key: Option<String>,
}

fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(CONFIG_FILE_NAME);
        p
    })
}

fn load_config_file() -> Result<ConfigFile> {
    let Some(path) = config_file_path() else {
        return Ok(ConfigFile::default());
    };
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

/// Resolve the target network: CLI flag, config file, default (testnet).
pub fn resolve_network(cli_flag: Option<String>) -> Result<Network> {
    if let Some(net_str) = cli_flag {
        return net_str.parse::<Network>();
    }

    if let Some(net_str) = load_config_file()?.network {
        return net_str.parse::<Network>();
    }

    Ok(Network::Testnet)
}

/// Resolve the factory service URL: CLI flag/env, config file, default.
pub fn resolve_factory_url(cli_flag: Option<String>) -> Result<String> {
    if let Some(url) = cli_flag {
        return Ok(url);
    }

    if let Some(url) = load_config_file()?.factory_url {
        return Ok(url);
    }

    Ok(DEFAULT_FACTORY_URL.to_string())
}

/// Resolve pinning configuration. Credentials are required; endpoint and
/// gateway fall back to the public Pinata defaults.
pub fn resolve_pinning() -> Result<PinningConfig> {
    let section = load_config_file()?.pinning;
    merge_pinning(
        section,
        env::var("PINATA_API_KEY").ok(),
        env::var("PINATA_SECRET_API_KEY").ok(),
        env::var("PINATA_API_BASE").ok(),
        env::var("PINATA_GATEWAY").ok(),
    )
}

fn merge_pinning(
    section: PinningSection,
    api_key_env: Option<String>,
    secret_env: Option<String>,
    api_base_env: Option<String>,
    gateway_env: Option<String>,
) -> Result<PinningConfig> {
    let api_key = api_key_env
        .filter(|v| !v.is_empty())
        .or(section.api_key)
        .context("Pinata API key not configured; set PINATA_API_KEY or [pinning].api_key in ~/.token-factory.toml")?;
    let secret_api_key = secret_env
        .filter(|v| !v.is_empty())
        .or(section.secret_api_key)
        .context("Pinata secret not configured; set PINATA_SECRET_API_KEY or [pinning].secret_api_key in ~/.token-factory.toml")?;

    let api_base = api_base_env
        .filter(|v| !v.is_empty())
        .or(section.api_base)
        .unwrap_or_else(|| DEFAULT_PINATA_API_BASE.to_string());
    let gateway = gateway_env
        .filter(|v| !v.is_empty())
        .or(section.gateway)
        .unwrap_or_else(|| DEFAULT_PINATA_GATEWAY.to_string());

    Ok(PinningConfig {
        api_base,
        gateway,
        api_key,
        secret_api_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("futurenet".parse::<Network>().unwrap(), Network::Futurenet);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet); // Case insensitive
        assert!("invalid".parse::<Network>().is_err());
    }

    #[test]
    fn test_config_file_parsing() {
        let content = r#"
network = "mainnet"
factory_url = "https://factory.example.com"

[pinning]
api_key = "key"
secret_api_key = "secret"
gateway = "https://my-gateway.example/ipfs"
"#;
        let parsed: ConfigFile = toml::from_str(content).unwrap();
        assert_eq!(parsed.network.as_deref(), Some("mainnet"));
        assert_eq!(parsed.factory_url.as_deref(), Some("https://factory.example.com"));
        assert_eq!(parsed.pinning.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_config_file_without_pinning_section() {
        let parsed: ConfigFile = toml::from_str("network = \"testnet\"").unwrap();
        assert!(parsed.pinning.api_key.is_none());
    }

    #[test]
    fn test_merge_pinning_env_wins_over_file() {
        let section = PinningSection {
            api_base: None,
            gateway: None,
            api_key: Some("file-key".to_string()),
            secret_api_key: Some("file-secret".to_string()),
        };
        let merged = merge_pinning(
            section,
            Some("env-key".to_string()),
            None,
            None,
            None,
        )
        .unwrap();

        assert_eq!(merged.api_key, "env-key");
        assert_eq!(merged.secret_api_key, "file-secret");
        assert_eq!(merged.api_base, DEFAULT_PINATA_API_BASE);
        assert_eq!(merged.gateway, DEFAULT_PINATA_GATEWAY);
    }

    #[test]
    fn test_merge_pinning_requires_credentials() {
        let merged = merge_pinning(PinningSection::default(), None, None, None, None);
        assert!(merged.is_err());
    }
}
