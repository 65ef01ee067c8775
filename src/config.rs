use serde::Deserialize;

pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub token: String,
    pub worldview: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Inactivity expiry. Always positive.
    pub ttl_minutes: i64,
    pub secure: bool,
    /// Interval between expired-session sweeps.
    pub sweep_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub geocoder: GeocoderConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} must be set"))
        };

        let database_url = required("DATABASE_URL")?;
        let geocoder = GeocoderConfig {
            base_url: lookup("GEOCODER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODER_BASE_URL.into()),
            token: required("MAPBOX_TOKEN")?,
            worldview: lookup("GEOCODER_WORLDVIEW").filter(|v| !v.is_empty()),
        };
        let positive = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                None => Ok(default),
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| anyhow::anyhow!("{key} must be a positive integer, got {v:?}")),
            }
        };

        let ttl_minutes = positive("SESSION_TTL_MINUTES", 60 * 24 * 7)?;
        let session = SessionConfig {
            ttl_minutes: i64::try_from(ttl_minutes)
                .map_err(|_| anyhow::anyhow!("SESSION_TTL_MINUTES is out of range"))?,
            secure: lookup("SESSION_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            sweep_seconds: positive("SESSION_SWEEP_SECONDS", 60)?,
        };
        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            max_connections,
            geocoder,
            session,
        })
    }
}
