use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

const DEFAULT_CONTACT: &str = "https://github.com/imgdrop/imgdrop";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; built once in `main`
/// and handed to the store, the sweeper and the dispatcher.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    /// Largest accepted upload body, in bytes.
    pub max_file_size: u64,
    /// Lifetime applied when a client asks for none (0 = never expires).
    pub default_lifetime_days: u32,
    /// Upper bound on any lifetime (0 = unlimited).
    pub max_lifetime_days: u32,
    pub sweep_interval: Duration,
    /// When set, fetches answer with `X-Accel-Redirect: <prefix>/<identifier>`.
    pub x_accel_prefix: Option<String>,
    pub motd: String,
    pub contact: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Minimal image hosting daemon")]
pub struct Args {
    /// Host to bind to (overrides IMGDROP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides IMGDROP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where images are stored (overrides IMGDROP_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Max upload size in bytes (overrides IMGDROP_MAX_SIZE)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Default lifetime in days, 0 for infinite (overrides IMGDROP_DEFAULT_LIFETIME)
    #[arg(long)]
    pub default_lifetime: Option<u32>,

    /// Max lifetime in days, 0 for unlimited (overrides IMGDROP_MAX_LIFETIME)
    #[arg(long)]
    pub max_lifetime: Option<u32>,

    /// Seconds between two expiration sweeps (overrides IMGDROP_SWEEP_INTERVAL)
    #[arg(long)]
    pub sweep_interval: Option<u64>,

    /// Path prefix for X-Accel-Redirect replies (overrides IMGDROP_X_ACCEL)
    #[arg(long)]
    pub x_accel: Option<String>,

    /// Lutim broadcast message (overrides IMGDROP_MOTD)
    #[arg(long)]
    pub motd: Option<String>,

    /// Contact URL advertised on /infos (overrides IMGDROP_CONTACT)
    #[arg(long)]
    pub contact: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            storage_dir: "/var/lib/imgdrop".into(),
            max_file_size: 10 << 20,
            default_lifetime_days: 7,
            max_lifetime_days: 0,
            sweep_interval: Duration::from_secs(3600),
            x_accel_prefix: None,
            motd: String::new(),
            contact: DEFAULT_CONTACT.into(),
        }
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        let defaults = Self::default();

        // --- Environment fallback ---
        let env_host = env::var("IMGDROP_HOST").unwrap_or(defaults.host);
        let env_port = env_parse("IMGDROP_PORT", defaults.port)?;
        let env_storage = env::var("IMGDROP_STORAGE_DIR").unwrap_or(defaults.storage_dir);
        let env_max_size = env_parse("IMGDROP_MAX_SIZE", defaults.max_file_size)?;
        let env_default_lifetime =
            env_parse("IMGDROP_DEFAULT_LIFETIME", defaults.default_lifetime_days)?;
        let env_max_lifetime = env_parse("IMGDROP_MAX_LIFETIME", defaults.max_lifetime_days)?;
        let env_sweep = env_parse("IMGDROP_SWEEP_INTERVAL", defaults.sweep_interval.as_secs())?;
        let env_x_accel = env::var("IMGDROP_X_ACCEL").ok();
        let env_motd = env::var("IMGDROP_MOTD").unwrap_or(defaults.motd);
        let env_contact = env::var("IMGDROP_CONTACT").unwrap_or(defaults.contact);

        // --- Merge ---
        let x_accel_prefix = args
            .x_accel
            .or(env_x_accel)
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .filter(|prefix| !prefix.is_empty());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            max_file_size: args.max_size.unwrap_or(env_max_size),
            default_lifetime_days: args.default_lifetime.unwrap_or(env_default_lifetime),
            max_lifetime_days: args.max_lifetime.unwrap_or(env_max_lifetime),
            sweep_interval: Duration::from_secs(args.sweep_interval.unwrap_or(env_sweep).max(1)),
            x_accel_prefix,
            motd: args.motd.unwrap_or(env_motd),
            contact: args.contact.unwrap_or(env_contact),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the lifetime a client asked for into the one actually applied.
    ///
    /// Missing, unparsable or negative input falls back to the default. When a
    /// maximum is configured, "infinite" (0) and anything above the maximum
    /// become the maximum.
    pub fn effective_lifetime(&self, requested: Option<&str>) -> u32 {
        let days = requested
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|days| *days >= 0)
            .map(|days| u32::try_from(days).unwrap_or(u32::MAX))
            .unwrap_or(self.default_lifetime_days);
        clamp_lifetime(days, self.max_lifetime_days)
    }
}

/// Bound `days` by `max_days`; a zero maximum means unlimited.
pub fn clamp_lifetime(days: u32, max_days: u32) -> u32 {
    if max_days > 0 && (days == 0 || days > max_days) {
        max_days
    } else {
        days
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(default: u32, max: u32) -> AppConfig {
        AppConfig {
            default_lifetime_days: default,
            max_lifetime_days: max,
            ..AppConfig::default()
        }
    }

    #[test]
    fn missing_or_garbage_lifetime_uses_default() {
        let cfg = config(7, 0);
        assert_eq!(cfg.effective_lifetime(None), 7);
        assert_eq!(cfg.effective_lifetime(Some("")), 7);
        assert_eq!(cfg.effective_lifetime(Some("soon")), 7);
        assert_eq!(cfg.effective_lifetime(Some("-3")), 7);
    }

    #[test]
    fn explicit_lifetime_is_kept_when_unbounded() {
        let cfg = config(7, 0);
        assert_eq!(cfg.effective_lifetime(Some("42")), 42);
        assert_eq!(cfg.effective_lifetime(Some(" 0 ")), 0);
    }

    #[test]
    fn maximum_caps_long_and_infinite_lifetimes() {
        let cfg = config(0, 30);
        assert_eq!(cfg.effective_lifetime(Some("365")), 30);
        assert_eq!(cfg.effective_lifetime(Some("0")), 30);
        assert_eq!(cfg.effective_lifetime(None), 30);
        assert_eq!(cfg.effective_lifetime(Some("12")), 12);
    }

    #[test]
    fn clamp_with_zero_maximum_is_identity() {
        assert_eq!(clamp_lifetime(0, 0), 0);
        assert_eq!(clamp_lifetime(9000, 0), 9000);
    }
}
