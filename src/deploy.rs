//! Token deployment against the factory service.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;
use serde_json::json;

use crate::config::Network;
use crate::validation::{self, TokenParams};

/// Record of a deployed token as returned by the factory service.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployedToken {
    pub address: String,
    pub creator: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    #[serde(default)]
    pub initial_supply: Option<String>,
    #[serde(default)]
    pub metadata_uri: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Validate the parameters and submit the deployment request.
///
/// Field-validation failures never reach the network; the aggregate report
/// is folded into the error message so the caller can show every violation
/// at once.
pub async fn deploy_token(
    factory_url: &str,
    params: &TokenParams,
    description: Option<&str>,
    metadata_uri: Option<&str>,
    network: Network,
) -> Result<DeployedToken> {
    let report = validation::validate_token_params(params);
    if !report.valid {
        let lines: Vec<String> = report
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        bail!("invalid token parameters:\n  {}", lines.join("\n  "));
    }
    if let Some(desc) = description {
        if let Err(message) = validation::validate_description(desc) {
            bail!("invalid token parameters:\n  description: {}", message);
        }
    }

    let client = reqwest::Client::new();
    let url = format!("{}/api/tokens", factory_url.trim_end_matches('/'));

    let payload = json!({
        "name": params.name,
        "symbol": params.symbol,
        "decimals": params.decimals,
        "initial_supply": params.initial_supply,
        "admin_wallet": params.admin_wallet,
        "description": description,
        "metadata_uri": metadata_uri,
        "network": network.as_str(),
    });

    debug!("deploying token {} via {}", params.symbol, url);

    let response = client
        .post(&url)
        .json(&payload)
        .send()
        .await
        .context("Failed to reach token factory service")?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        bail!("Deployment rejected ({}): {}", status, error_text);
    }

    let token: DeployedToken = response
        .json()
        .await
        .context("Invalid response from token factory service")?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_params_fail_before_any_request() {
        let params = TokenParams {
            name: "".to_string(),
            symbol: "abc".to_string(),
            decimals: 19,
            initial_supply: "-5".to_string(),
            admin_wallet: "bad".to_string(),
        };

        // The URL is unroutable; reaching the network would surface a
        // different error than the parameter report.
        let err = deploy_token("http://127.0.0.1:1", &params, None, None, Network::Testnet)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("invalid token parameters"));
        assert!(message.contains("admin_wallet"));
        assert!(message.contains("symbol"));
    }

    #[tokio::test]
    async fn test_overlong_description_rejected_locally() {
        let params = TokenParams {
            name: "Token".to_string(),
            symbol: "TOK".to_string(),
            decimals: 7,
            initial_supply: "1000".to_string(),
            admin_wallet: "GDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC"
                .to_string(),
        };
        let description = "x".repeat(501);

        let err = deploy_token(
            "http://127.0.0.1:1",
            &params,
            Some(&description),
            None,
            Network::Testnet,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn test_deployed_token_parsing() {
        let body = r#"{
            "address": "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC",
            "creator": "GDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC",
            "name": "Token",
            "symbol": "TOK",
            "decimals": 7,
            "metadata_uri": "https://gateway.pinata.cloud/ipfs/QmHash"
        }"#;

        let token: DeployedToken = serde_json::from_str(body).unwrap();
        assert_eq!(token.symbol, "TOK");
        assert!(token.created_at.is_none());
        assert_eq!(
            token.metadata_uri.as_deref(),
            Some("https://gateway.pinata.cloud/ipfs/QmHash")
        );
    }
}
