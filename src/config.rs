use serde::Deserialize;
use std::env;

use crate::constants::{DEFAULT_RELAY_PORT, RESULT_WAIT_SECS, SEPOLIA_CHAIN_ID};
use crate::services::reconciler::DedupePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Blockchain
    pub ethereum_rpc_url: String,
    pub chain_id: u64,

    // Contract
    pub lottery_contract_address: String,

    // Signing
    pub lottery_private_key: String,

    // Session behaviour
    pub history_dedupe: DedupePolicy,
    pub result_wait_secs: u64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_RELAY_PORT.to_string())
                .parse()?,

            ethereum_rpc_url: env::var("ETHEREUM_RPC_URL")?,
            chain_id: env::var("LOTTERY_CHAIN_ID")
                .unwrap_or_else(|_| SEPOLIA_CHAIN_ID.to_string())
                .parse()?,

            lottery_contract_address: env::var("LOTTERY_CONTRACT_ADDRESS")?,
            lottery_private_key: env::var("LOTTERY_PRIVATE_KEY")?,

            history_dedupe: env::var("HISTORY_DEDUPE")
                .map(|v| DedupePolicy::parse(&v))
                .unwrap_or(Ok(DedupePolicy::ByRound))?,
            result_wait_secs: env::var("RESULT_WAIT_SECS")
                .unwrap_or_else(|_| RESULT_WAIT_SECS.to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ethereum_rpc_url.trim().is_empty() {
            anyhow::bail!("ETHEREUM_RPC_URL is empty");
        }
        url::Url::parse(self.ethereum_rpc_url.trim())
            .map_err(|e| anyhow::anyhow!("ETHEREUM_RPC_URL is not a valid URL: {}", e))?;

        if crate::utils::parse_address(&self.lottery_contract_address).is_err() {
            anyhow::bail!("LOTTERY_CONTRACT_ADDRESS is not a 20-byte hex address");
        }
        if self.lottery_contract_address.trim() == crate::constants::NULL_ADDRESS {
            anyhow::bail!("LOTTERY_CONTRACT_ADDRESS is the null address");
        }

        if self.lottery_private_key.trim().is_empty() {
            anyhow::bail!("LOTTERY_PRIVATE_KEY is missing");
        }

        if self.result_wait_secs == 0 {
            tracing::warn!("RESULT_WAIT_SECS is 0; results will be read immediately");
        }
        if self.chain_id != SEPOLIA_CHAIN_ID {
            tracing::warn!("Configured chain {} is not Sepolia", self.chain_id);
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: DEFAULT_RELAY_PORT,
        ethereum_rpc_url: "http://localhost:8545".to_string(),
        chain_id: SEPOLIA_CHAIN_ID,
        lottery_contract_address: "0x00000000000000000000000000000000000000aa".to_string(),
        lottery_private_key: "0x0123456789012345678901234567890123456789012345678901234567890123"
            .to_string(),
        history_dedupe: DedupePolicy::ByRound,
        result_wait_secs: RESULT_WAIT_SECS,
        cors_allowed_origins: "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_complete_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_rpc_url() {
        let mut config = test_config();
        config.ethereum_rpc_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_null_contract_address() {
        let mut config = test_config();
        config.lottery_contract_address = crate::constants::NULL_ADDRESS.to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_key() {
        let mut config = test_config();
        config.lottery_private_key = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
