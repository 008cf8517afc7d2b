use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub admin_emails: Vec<String>,
    pub host: IpAddr,
    pub port: u16,
    pub sheets: Option<SheetsConfig>,
    pub stats_ttl: Duration,
    pub max_body_size: usize,
    pub cors_origins: Vec<String>,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("FORMIFY_JWT_SECRET")?;

        let admin_emails = split_list(&env_or("FORMIFY_ADMIN_EMAILS", ""))
            .into_iter()
            .map(|e| e.to_lowercase())
            .collect();

        let host: IpAddr = env_or("FORMIFY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMIFY_HOST: {e}"))?;

        let port: u16 = env_or("FORMIFY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMIFY_PORT: {e}"))?;

        let sheets_timeout: u64 = env_or("FORMIFY_SHEETS_TIMEOUT_SECS", "20")
            .parse()
            .map_err(|e| format!("Invalid FORMIFY_SHEETS_TIMEOUT_SECS: {e}"))?;

        let sheets = std::env::var("FORMIFY_SHEETS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| SheetsConfig {
                url,
                token: std::env::var("FORMIFY_SHEETS_TOKEN").ok(),
                timeout: Duration::from_secs(sheets_timeout),
            });

        let stats_ttl: u64 = env_or("FORMIFY_STATS_TTL_SECS", "300")
            .parse()
            .map_err(|e| format!("Invalid FORMIFY_STATS_TTL_SECS: {e}"))?;

        let max_body_size: usize = env_or("FORMIFY_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid FORMIFY_MAX_BODY_SIZE: {e}"))?;

        let cors_origins = split_list(&env_or("FORMIFY_CORS_ORIGINS", ""));

        let log_level = env_or("FORMIFY_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            admin_emails,
            host,
            port,
            sheets,
            stats_ttl: Duration::from_secs(stats_ttl),
            max_body_size,
            cors_origins,
            log_level,
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
