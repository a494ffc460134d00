//! Layered configuration: compiled-in defaults, an optional `swarm.toml`,
//! then `SWARM_`-prefixed environment variables, plus the handful of
//! non-prefixed variables the kernel reads directly (`POSTGRES_URL`,
//! `GITHUB_TOKEN`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub postgres_url: Option<String>,
    pub github_token: Option<String>,
    pub lite_mode: bool,
    pub strict_git: bool,
    pub strict_tools: bool,
    pub sbfl_enabled: bool,
    pub verbose_telemetry: bool,
    pub trace_prompts: bool,
    pub debug: bool,
    pub install_id: Option<String>,
    pub default_worker_model: String,
    pub blackboard_root: String,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            github_token: None,
            lite_mode: false,
            strict_git: true,
            strict_tools: false,
            sbfl_enabled: false,
            verbose_telemetry: false,
            trace_prompts: false,
            debug: false,
            install_id: None,
            default_worker_model: "default".to_string(),
            blackboard_root: ".".to_string(),
        }
    }
}

impl SwarmConfig {
    /// Loads defaults, then `swarm.toml` (if present) relative to the
    /// current directory, then environment variables. Environment
    /// variables always win, matching §1.3 of SPEC_FULL.md.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&SwarmConfig::default())?)
            .add_source(config::File::with_name("swarm").required(false))
            .add_source(
                config::Environment::with_prefix("SWARM")
                    .try_parsing(true)
                    .separator("_"),
            );

        let mut cfg: SwarmConfig = builder.build()?.try_deserialize()?;

        if let Ok(url) = std::env::var("POSTGRES_URL") {
            cfg.postgres_url = Some(url);
        }
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            cfg.github_token = Some(token);
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_strict_git_and_disable_lite_mode() {
        let cfg = SwarmConfig::default();
        assert!(cfg.strict_git);
        assert!(!cfg.lite_mode);
        assert_eq!(cfg.default_worker_model, "default");
    }
}
