//! Configuration for the trading node and the discovery service.
//!
//! Everything comes from environment variables with reasonable defaults:
//!
//! - `NODE_BIND_ADDR`             (default: "127.0.0.1")
//! - `NODE_PORT`                  (default: "0", ephemeral)
//! - `NODE_ADVERTISE_HOST`        (default: bind address)
//! - `NODE_DISCOVERY_ADDR`        (default: "127.0.0.1:30001")
//! - `NODE_RPC_TIMEOUT_MS`        (default: "10000")
//! - `NODE_ORDER_TIMEOUT_MS`      (default: "10000")
//! - `NODE_DISCOVERY_ATTEMPTS`    (default: "10")
//! - `NODE_DISCOVERY_INTERVAL_MS` (default: "1000")
//! - `NODE_LOCK_POLL_MS`          (default: "100")
//! - `NODE_LOCK_WAIT_LIMIT_MS`    (default: unset, wait forever)
//! - `NODE_ANNOUNCE_INTERVAL_MS`  (default: "1000")
//! - `NODE_ANNOUNCE_TTL_MS`       (default: "5000")
//! - `NODE_MAX_CONNECTIONS`       (default: "1024")
//! - `NODE_DEMO_INTERVAL_MS`      (default: unset, no demo orders)
//! - `DISCOVERY_BIND_ADDR`        (default: "127.0.0.1:30001")

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DISCOVERY_ADDR: &str = "127.0.0.1:30001";

/// A variable was set but could not be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Node configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind the peer RPC listener to.
    pub bind_addr: String,

    /// TCP port to listen on; `0` picks an ephemeral port.
    pub port: u16,

    /// Host part of the endpoint announced to discovery. Also the host
    /// part of this node's client id.
    pub advertise_host: String,

    /// `host:port` of the discovery service.
    pub discovery_addr: String,

    /// Timeout for lock/unlock/sync calls and discovery round trips.
    pub rpc_timeout: Duration,

    /// Timeout for the new-order fan-out.
    pub order_timeout: Duration,

    /// How many lookups to make while waiting to become discoverable.
    pub discovery_attempts: u32,

    /// Pause between discoverability lookups.
    pub discovery_interval: Duration,

    /// Poll period of the pre-submission wait on the lock registry.
    pub lock_poll: Duration,

    /// Upper bound on that wait; `None` waits indefinitely.
    pub lock_wait_limit: Option<Duration>,

    /// Period between re-announcements of every served capability.
    pub announce_interval: Duration,

    /// Lifetime of one announcement in the discovery directory.
    pub announce_ttl: Duration,

    /// Maximum number of simultaneously connected peers.
    pub max_connections: usize,

    /// Period of the demo order generator; `None` disables it.
    pub demo_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            advertise_host: "127.0.0.1".to_string(),
            discovery_addr: DEFAULT_DISCOVERY_ADDR.to_string(),
            rpc_timeout: Duration::from_secs(10),
            order_timeout: Duration::from_secs(10),
            discovery_attempts: 10,
            discovery_interval: Duration::from_secs(1),
            lock_poll: Duration::from_millis(100),
            lock_wait_limit: None,
            announce_interval: Duration::from_secs(1),
            announce_ttl: Duration::from_secs(5),
            max_connections: 1024,
            demo_interval: None,
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to reasonable defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let bind_addr = env::var("NODE_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let advertise_host = env::var("NODE_ADVERTISE_HOST").unwrap_or_else(|_| bind_addr.clone());

        let config = Config {
            port: read_env_or_default("NODE_PORT", defaults.port)?,
            advertise_host,
            discovery_addr: env::var("NODE_DISCOVERY_ADDR").unwrap_or(defaults.discovery_addr),
            rpc_timeout: read_millis_or_default("NODE_RPC_TIMEOUT_MS", defaults.rpc_timeout)?,
            order_timeout: read_millis_or_default("NODE_ORDER_TIMEOUT_MS", defaults.order_timeout)?,
            discovery_attempts: read_env_or_default(
                "NODE_DISCOVERY_ATTEMPTS",
                defaults.discovery_attempts,
            )?,
            discovery_interval: read_millis_or_default(
                "NODE_DISCOVERY_INTERVAL_MS",
                defaults.discovery_interval,
            )?,
            lock_poll: read_millis_or_default("NODE_LOCK_POLL_MS", defaults.lock_poll)?,
            lock_wait_limit: read_optional_millis("NODE_LOCK_WAIT_LIMIT_MS")?,
            announce_interval: read_millis_or_default(
                "NODE_ANNOUNCE_INTERVAL_MS",
                defaults.announce_interval,
            )?,
            announce_ttl: read_millis_or_default("NODE_ANNOUNCE_TTL_MS", defaults.announce_ttl)?,
            max_connections: read_env_or_default("NODE_MAX_CONNECTIONS", defaults.max_connections)?,
            demo_interval: read_optional_millis("NODE_DEMO_INTERVAL_MS")?,
            bind_addr,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall or panic a periodic task.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("NODE_LOCK_POLL_MS", self.lock_poll)?;
        non_zero("NODE_ANNOUNCE_INTERVAL_MS", self.announce_interval)?;
        if let Some(every) = self.demo_interval {
            non_zero("NODE_DEMO_INTERVAL_MS", every)?;
        }
        Ok(())
    }

    /// Convenience: `addr:port` socket string to bind.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration of the standalone discovery service.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub bind_addr: String,
}

impl DiscoveryConfig {
    pub fn from_env() -> Self {
        DiscoveryConfig {
            bind_addr: env::var("DISCOVERY_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_DISCOVERY_ADDR.to_string()),
        }
    }
}

fn non_zero(key: &'static str, period: Duration) -> Result<(), ConfigError> {
    if period.is_zero() {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be non-zero".to_string(),
        });
    }
    Ok(())
}

fn read_env_or_default<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value: val,
        }),
        Err(_) => Ok(default),
    }
}

fn read_millis_or_default(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    Ok(read_optional_millis(key)?.unwrap_or(default))
}

fn read_optional_millis(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(key) {
        Ok(_) => Ok(Some(Duration::from_millis(read_env_or_default(key, 0u64)?))),
        Err(_) => Ok(None),
    }
}
