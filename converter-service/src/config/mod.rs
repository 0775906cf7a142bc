use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Origins allowed when `ALLOWED_ORIGINS` is unset.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,https://fundocs.vercel.app";

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub cors: CorsConfig,
    pub soffice: SofficeConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CorsMode {
    /// Any origin, no credentials.
    Permissive,
    /// Only listed origins, credentials allowed.
    AllowList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub mode: CorsMode,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SofficeConfig {
    /// Path or name of the LibreOffice executable.
    pub binary_path: String,
}

impl ConverterConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = get_env("ENVIRONMENT", Some("dev"))?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let config = ConverterConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("converter-service"))?,
            log_level: get_env("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            cors: CorsConfig {
                mode: get_env("CORS_MODE", Some("allowlist"))?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                allowed_origins: parse_origins(&get_env(
                    "ALLOWED_ORIGINS",
                    Some(DEFAULT_ALLOWED_ORIGINS),
                )?),
            },
            soffice: SofficeConfig {
                binary_path: get_env("SOFFICE_PATH", Some("soffice"))?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.cors.mode == CorsMode::AllowList {
            if self.cors.allowed_origins.is_empty() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "ALLOWED_ORIGINS must list at least one origin in allowlist mode"
                )));
            }

            if self.environment == Environment::Prod
                && self.cors.allowed_origins.iter().any(|o| o == "*")
            {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        if self.soffice.binary_path.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SOFFICE_PATH must not be empty"
            )));
        }

        Ok(())
    }
}

/// Splits a comma-separated origin list, trimming entries and dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for CorsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permissive" => Ok(CorsMode::Permissive),
            "allowlist" | "allow-list" => Ok(CorsMode::AllowList),
            _ => Err(format!("Invalid CORS mode: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => default.map(|d| d.to_string()).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(format!("{} is required but not set", key)))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: CorsMode, origins: &[&str], environment: Environment) -> ConverterConfig {
        ConverterConfig {
            common: core_config::Config::default(),
            environment,
            service_name: "converter-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            cors: CorsConfig {
                mode,
                allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            },
            soffice: SofficeConfig {
                binary_path: "soffice".to_string(),
            },
        }
    }

    #[test]
    fn parses_default_origins() {
        assert_eq!(
            parse_origins(DEFAULT_ALLOWED_ORIGINS),
            vec!["http://localhost:3000", "https://fundocs.vercel.app"]
        );
    }

    #[test]
    fn parse_origins_trims_and_drops_blanks() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn cors_mode_parses_case_insensitively() {
        assert_eq!("Permissive".parse::<CorsMode>(), Ok(CorsMode::Permissive));
        assert_eq!("ALLOWLIST".parse::<CorsMode>(), Ok(CorsMode::AllowList));
        assert!("open".parse::<CorsMode>().is_err());
    }

    #[test]
    fn empty_allow_list_is_rejected() {
        let cfg = config(CorsMode::AllowList, &[], Environment::Dev);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_list_is_fine_when_permissive() {
        let cfg = config(CorsMode::Permissive, &[], Environment::Prod);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn wildcard_rejected_only_in_prod() {
        let dev = config(CorsMode::AllowList, &["*"], Environment::Dev);
        assert!(dev.validate().is_ok());

        let prod = config(CorsMode::AllowList, &["*"], Environment::Prod);
        assert!(prod.validate().is_err());
    }
}
