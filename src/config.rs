use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Versioned prefix the API routers are mounted under, e.g. `/api/v1`.
    pub api_prefix: String,
    /// Directory uploaded product images are written to and served from.
    pub upload_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let api_prefix = env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string());
        let api_prefix = if api_prefix.starts_with('/') {
            api_prefix
        } else {
            format!("/{api_prefix}")
        };
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/uploads".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            api_prefix,
            upload_dir,
        })
    }
}
