use chrono::FixedOffset;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    /// Fixed UTC offset of the deployment; week boundaries (Monday 00:00)
    /// are computed in this offset.
    pub reset_utc_offset: FixedOffset,
    pub reset_sweep_interval_secs: u64,
    pub ranking_limit: usize,
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/kudos.db".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let offset_hours: i32 = env::var("RESET_UTC_OFFSET_HOURS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| "Invalid RESET_UTC_OFFSET_HOURS")?;
        let reset_utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or("RESET_UTC_OFFSET_HOURS out of range")?;

        let reset_sweep_interval_secs = env::var("RESET_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| "Invalid RESET_SWEEP_INTERVAL_SECS")?;

        let ranking_limit = env::var("RANKING_LIMIT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| "Invalid RANKING_LIMIT")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            reset_utc_offset,
            reset_sweep_interval_secs,
            ranking_limit,
            environment,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
