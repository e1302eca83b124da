//! Server configuration
//!
//! Everything is read from the environment; the broker credential never
//! appears in source or in `Debug` output.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use relayq_broker::{
    MemorySender, MessageSender, SenderOptions, ServiceBusSender, DEFAULT_CAPACITY,
};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_MEMORY_QUEUE: &str = "local";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Which broker the gateway sends to
#[derive(Clone)]
pub enum BrokerConfig {
    /// Azure Service Bus queue
    ServiceBus {
        connection_string: String,
        /// Overrides the connection string's `EntityPath`
        queue_name: Option<String>,
        options: SenderOptions,
    },
    /// In-process sender for local development
    Memory {
        queue_name: String,
        /// Most recent messages kept in memory
        capacity: usize,
    },
}

impl BrokerConfig {
    /// Create the process-wide sender. Called once during startup.
    pub fn connect(&self) -> anyhow::Result<Arc<dyn MessageSender>> {
        match self {
            BrokerConfig::ServiceBus {
                connection_string,
                queue_name,
                options,
            } => {
                let sender = ServiceBusSender::from_connection_string(
                    connection_string,
                    queue_name.as_deref(),
                    options.clone(),
                )
                .context("failed to create Service Bus sender")?;
                Ok(Arc::new(sender))
            }
            BrokerConfig::Memory {
                queue_name,
                capacity,
            } => Ok(Arc::new(MemorySender::with_capacity(
                queue_name.clone(),
                *capacity,
            ))),
        }
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerConfig::ServiceBus {
                queue_name,
                options,
                ..
            } => f
                .debug_struct("ServiceBus")
                .field("connection_string", &"<redacted>")
                .field("queue_name", queue_name)
                .field("options", options)
                .finish(),
            BrokerConfig::Memory {
                queue_name,
                capacity,
            } => f
                .debug_struct("Memory")
                .field("queue_name", queue_name)
                .field("capacity", capacity)
                .finish(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// Broker to send to
    pub broker: BrokerConfig,
    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_address = get("RELAYQ_BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let log_format = match get("RELAYQ_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("RELAYQ_LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        };

        let broker = match get("RELAYQ_BROKER").as_deref() {
            None | Some("servicebus") => {
                let defaults = SenderOptions::default();
                BrokerConfig::ServiceBus {
                    connection_string: get("SERVICEBUS_CONNECTION_STRING")
                        .context("SERVICEBUS_CONNECTION_STRING must be set")?,
                    queue_name: get("SERVICEBUS_QUEUE_NAME"),
                    options: SenderOptions {
                        token_ttl: secs(&get, "SERVICEBUS_TOKEN_TTL_SECS", defaults.token_ttl)?,
                        timeout: secs(&get, "SERVICEBUS_TIMEOUT_SECS", defaults.timeout)?,
                    },
                }
            }
            Some("memory") => BrokerConfig::Memory {
                queue_name: get("SERVICEBUS_QUEUE_NAME")
                    .unwrap_or_else(|| DEFAULT_MEMORY_QUEUE.to_string()),
                capacity: positive(&get, "RELAYQ_MEMORY_CAPACITY", DEFAULT_CAPACITY as u64)?
                    as usize,
            },
            Some(other) => bail!("RELAYQ_BROKER must be 'servicebus' or 'memory', got '{}'", other),
        };

        Ok(Self {
            bind_address,
            broker,
            log_format,
        })
    }
}

fn secs(get: impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> anyhow::Result<Duration> {
    positive(get, key, default.as_secs()).map(Duration::from_secs)
}

fn positive(get: impl Fn(&str) -> Option<String>, key: &str, default: u64) -> anyhow::Result<u64> {
    match get(key) {
        Some(raw) => {
            let value: u64 = raw
                .parse()
                .with_context(|| format!("{} must be a whole number, got '{}'", key, raw))?;
            if value == 0 {
                bail!("{} must be greater than zero", key);
            }
            Ok(value)
        }
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONNECTION: &str = "Endpoint=sb://example.servicebus.windows.net/;SharedAccessKeyName=k;SharedAccessKey=top-secret";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SERVICEBUS_CONNECTION_STRING", CONNECTION)]).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        match config.broker {
            BrokerConfig::ServiceBus {
                queue_name, options, ..
            } => {
                assert_eq!(queue_name, None);
                assert_eq!(options.token_ttl, Duration::from_secs(3600));
                assert_eq!(options.timeout, Duration::from_secs(60));
            }
            other => panic!("unexpected broker: {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("RELAYQ_BIND_ADDRESS", "0.0.0.0:8080"),
            ("RELAYQ_LOG_FORMAT", "json"),
            ("SERVICEBUS_CONNECTION_STRING", CONNECTION),
            ("SERVICEBUS_QUEUE_NAME", "myqueue"),
            ("SERVICEBUS_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        match config.broker {
            BrokerConfig::ServiceBus {
                queue_name, options, ..
            } => {
                assert_eq!(queue_name.as_deref(), Some("myqueue"));
                assert_eq!(options.timeout, Duration::from_secs(5));
            }
            other => panic!("unexpected broker: {:?}", other),
        }
    }

    #[test]
    fn test_connection_string_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("SERVICEBUS_CONNECTION_STRING"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&[
            ("SERVICEBUS_CONNECTION_STRING", CONNECTION),
            ("SERVICEBUS_TIMEOUT_SECS", "soon"),
        ])
        .is_err());
        assert!(load(&[
            ("SERVICEBUS_CONNECTION_STRING", CONNECTION),
            ("SERVICEBUS_TOKEN_TTL_SECS", "0"),
        ])
        .is_err());
        assert!(load(&[("RELAYQ_BROKER", "kafka")]).is_err());
        assert!(load(&[("RELAYQ_BROKER", "memory"), ("RELAYQ_LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_memory_broker() {
        let config = load(&[("RELAYQ_BROKER", "memory")]).unwrap();
        assert!(matches!(
            config.broker,
            BrokerConfig::Memory { capacity: DEFAULT_CAPACITY, .. }
        ));
        let sender = config.broker.connect().unwrap();
        assert_eq!(sender.queue_name(), "local");
    }

    #[test]
    fn test_memory_capacity() {
        let config = load(&[("RELAYQ_BROKER", "memory"), ("RELAYQ_MEMORY_CAPACITY", "16")]).unwrap();
        assert!(matches!(config.broker, BrokerConfig::Memory { capacity: 16, .. }));

        assert!(load(&[("RELAYQ_BROKER", "memory"), ("RELAYQ_MEMORY_CAPACITY", "0")]).is_err());
        assert!(load(&[("RELAYQ_BROKER", "memory"), ("RELAYQ_MEMORY_CAPACITY", "lots")]).is_err());
    }

    #[test]
    fn test_connect_service_bus() {
        let config = load(&[
            ("SERVICEBUS_CONNECTION_STRING", CONNECTION),
            ("SERVICEBUS_QUEUE_NAME", "myqueue"),
        ])
        .unwrap();
        let sender = config.broker.connect().unwrap();
        assert_eq!(sender.queue_name(), "myqueue");

        let config = load(&[("SERVICEBUS_CONNECTION_STRING", CONNECTION)]).unwrap();
        assert!(config.broker.connect().is_err());
    }

    #[test]
    fn test_debug_redacts_connection_string() {
        let config = load(&[("SERVICEBUS_CONNECTION_STRING", CONNECTION)]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("top-secret"));
    }
}
