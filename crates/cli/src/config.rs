//! Process configuration, read once from the environment at startup.

use careplan_gateway::config::gateway_config_from_env_values;
use careplan_gateway::{GatewayConfig, StaticToken, TokenSupplier};

pub const API_URL_VAR: &str = "CAREPLAN_API_URL";
pub const API_TOKEN_VAR: &str = "CAREPLAN_API_TOKEN";
pub const API_TIMEOUT_VAR: &str = "CAREPLAN_API_TIMEOUT_SECS";

pub struct CliConfig {
    pub gateway: GatewayConfig,
    pub token: StaticToken,
}

impl CliConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_values(
            std::env::var(API_URL_VAR).ok(),
            std::env::var(API_TOKEN_VAR).ok(),
            std::env::var(API_TIMEOUT_VAR).ok(),
        )
    }

    pub fn from_env_values(
        url: Option<String>,
        token: Option<String>,
        timeout_secs: Option<String>,
    ) -> anyhow::Result<Self> {
        let gateway = gateway_config_from_env_values(url, timeout_secs)?;
        let token = StaticToken::new(token);
        if token.bearer_token().is_none() {
            tracing::warn!("{API_TOKEN_VAR} is not set; requests are sent without a token");
        }
        Ok(Self { gateway, token })
    }
}
