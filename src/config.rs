use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub token_ttl_hours: i64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("DESKBOOK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid DESKBOOK_HOST: {e}"))?;

        let port: u16 = env_or("DESKBOOK_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid DESKBOOK_PORT: {e}"))?;

        let token_ttl_hours: i64 = env_or("DESKBOOK_TOKEN_TTL_HOURS", "24")
            .parse()
            .map_err(|e| format!("Invalid DESKBOOK_TOKEN_TTL_HOURS: {e}"))?;

        let log_level = env_or("DESKBOOK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            token_ttl_hours,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
