use std::path::PathBuf;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string (store endpoint + credential)
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 5)
    pub db_max_connections: u32,

    /// Base URL of the HTTP gateway fronting the paired WhatsApp session
    pub whatsapp_gateway_url: String,

    /// Bearer token for the gateway, if it requires one
    pub whatsapp_gateway_token: Option<String>,

    /// Per-request timeout for gateway calls in seconds (default: 60)
    pub whatsapp_request_timeout_secs: u64,

    /// Media attachment sent to every contact
    pub media_path: PathBuf,

    /// Caption text file sent alongside the media
    pub caption_path: PathBuf,

    pub dispatch: DispatchConfig,
}

/// Timing knobs for the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Wait after a poll that returned no pending contacts (default: 30)
    pub idle_secs: u64,
    /// Wait after a failed poll before retrying (default: 10)
    pub backoff_secs: u64,
    /// Lower bound of the jittered pause between contacts (default: 10)
    pub min_delay_secs: u64,
    /// Upper bound of the jittered pause between contacts (default: 30)
    pub max_delay_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            idle_secs: 30,
            backoff_secs: 10,
            min_delay_secs: 10,
            max_delay_secs: 30,
        }
    }
}

impl DispatchConfig {
    /// Reject a jitter window whose bounds are inverted.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_delay_secs > self.max_delay_secs {
            anyhow::bail!(
                "DISPATCH_MIN_DELAY_SECS ({}) must not exceed DISPATCH_MAX_DELAY_SECS ({})",
                self.min_delay_secs,
                self.max_delay_secs
            );
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = DispatchConfig::default();
        let dispatch = DispatchConfig {
            idle_secs: env_u64("DISPATCH_IDLE_SECS", defaults.idle_secs)?,
            backoff_secs: env_u64("DISPATCH_BACKOFF_SECS", defaults.backoff_secs)?,
            min_delay_secs: env_u64("DISPATCH_MIN_DELAY_SECS", defaults.min_delay_secs)?,
            max_delay_secs: env_u64("DISPATCH_MAX_DELAY_SECS", defaults.max_delay_secs)?,
        };
        dispatch.validate()?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            whatsapp_gateway_url: std::env::var("WHATSAPP_GATEWAY_URL").map_err(|_| {
                anyhow::anyhow!("WHATSAPP_GATEWAY_URL environment variable is required")
            })?,
            whatsapp_gateway_token: std::env::var("WHATSAPP_GATEWAY_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            whatsapp_request_timeout_secs: env_u64("WHATSAPP_REQUEST_TIMEOUT_SECS", 60)?,
            media_path: std::env::var("MEDIA_PATH")
                .unwrap_or_else(|_| "media/image.jpg".to_string())
                .into(),
            caption_path: std::env::var("CAPTION_PATH")
                .unwrap_or_else(|_| "media/caption.txt".to_string())
                .into(),
            dispatch,
        })
    }
}

fn env_u64(key: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid u64")),
        Err(_) => Ok(default),
    }
}
