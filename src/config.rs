use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::UnknownRulePolicy;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub tables: TableSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub agent: AgentSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Shared secret for the admin ingestion endpoint; unset disables it.
    pub admin_api_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    #[serde(default = "default_programs_table")]
    pub programs: String,
    #[serde(default = "default_rules_table")]
    pub eligibility_rules: String,
    #[serde(default = "default_requirements_table")]
    pub requirements: String,
    #[serde(default = "default_deadlines_table")]
    pub deadlines: String,
    #[serde(default = "default_profiles_table")]
    pub academic_profiles: String,
    #[serde(default = "default_turns_table")]
    pub conversation_turns: String,
    #[serde(default = "default_users_table")]
    pub users: String,
    #[serde(default = "default_subscriptions_table")]
    pub subscriptions: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            programs: default_programs_table(),
            eligibility_rules: default_rules_table(),
            requirements: default_requirements_table(),
            deadlines: default_deadlines_table(),
            academic_profiles: default_profiles_table(),
            conversation_turns: default_turns_table(),
            users: default_users_table(),
            subscriptions: default_subscriptions_table(),
        }
    }
}

fn default_programs_table() -> String {
    "programs".to_string()
}
fn default_rules_table() -> String {
    "eligibility_rules".to_string()
}
fn default_requirements_table() -> String {
    "requirements".to_string()
}
fn default_deadlines_table() -> String {
    "deadlines".to_string()
}
fn default_profiles_table() -> String {
    "academic_profiles".to_string()
}
fn default_turns_table() -> String {
    "onboarding_conversations".to_string()
}
fn default_users_table() -> String {
    "users".to_string()
}
fn default_subscriptions_table() -> String {
    "subscriptions".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_size")]
    pub l1_cache_size: u64,
}

fn default_cache_ttl() -> u64 {
    300
}
fn default_l1_size() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,
}

fn default_agent_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub unknown_rule_policy: UnknownRulePolicy,
    #[serde(default = "default_match_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            unknown_rule_policy: UnknownRulePolicy::default(),
            default_limit: default_match_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_match_limit() -> u16 {
    20
}
fn default_max_limit() -> u16 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with SCHOLARMATCH)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables
            // e.g., SCHOLARMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SCHOLARMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Substitute well-known plain environment variables
        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SCHOLARMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply plain (unprefixed) environment variables for the values that
/// deployment platforms conventionally inject under fixed names.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    // DATABASE_URL wins over the prefixed form, matching platform injection
    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("SCHOLARMATCH__DATABASE__URL"))
        .ok();

    let supabase_url = env::var("SUPABASE_URL").ok();
    let supabase_api_key = env::var("SUPABASE_API_KEY").ok();
    let supabase_jwt_secret = env::var("SUPABASE_JWT_SECRET").ok();
    let redis_url = env::var("REDIS_URL").ok();
    let agent_base_url = env::var("AGENT_BASE_URL").ok();
    let agent_api_key = env::var("AGENT_API_KEY").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = database_url {
        builder = builder.set_override("database.url", url)?;
    }
    if let Some(url) = supabase_url {
        builder = builder.set_override("supabase.url", url)?;
    }
    if let Some(api_key) = supabase_api_key {
        builder = builder.set_override("supabase.api_key", api_key)?;
    }
    if let Some(secret) = supabase_jwt_secret {
        builder = builder.set_override("supabase.jwt_secret", secret)?;
    }
    if let Some(url) = redis_url {
        builder = builder.set_override("cache.redis_url", url)?;
    }
    if let Some(url) = agent_base_url {
        builder = builder.set_override("agent.base_url", url)?;
    }
    if let Some(api_key) = agent_api_key {
        builder = builder.set_override("agent.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let tables = TableSettings::default();
        assert_eq!(tables.programs, "programs");
        assert_eq!(tables.eligibility_rules, "eligibility_rules");
        assert_eq!(tables.academic_profiles, "academic_profiles");
        assert_eq!(tables.subscriptions, "subscriptions");
    }

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.unknown_rule_policy, UnknownRulePolicy::Permissive);
        assert_eq!(matching.default_limit, 20);
        assert_eq!(matching.max_limit, 100);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
