//! Server configuration from environment variables

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `CONCIERGE_DB_PATH`, default `$HOME/.concierge/concierge.db`
    pub db_path: PathBuf,
    /// `CONCIERGE_PORT`, default 8000
    pub port: u16,
    /// `CONCIERGE_RESERVATION_TRIGGER`: message that starts a reservation
    pub reservation_trigger: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("CONCIERGE_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".concierge").join("concierge.db")
            },
            PathBuf::from,
        );

        let port = lookup("CONCIERGE_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let reservation_trigger = lookup("CONCIERGE_RESERVATION_TRIGGER")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            db_path,
            port,
            reservation_trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("HOME", "/home/ada")]);
        assert_eq!(config.db_path, PathBuf::from("/home/ada/.concierge/concierge.db"));
        assert_eq!(config.port, 8000);
        assert_eq!(config.reservation_trigger, None);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("CONCIERGE_DB_PATH", "/var/lib/concierge.db"),
            ("CONCIERGE_PORT", "9100"),
            ("CONCIERGE_RESERVATION_TRIGGER", " book a room "),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/concierge.db"));
        assert_eq!(config.port, 9100);
        assert_eq!(config.reservation_trigger.as_deref(), Some("book a room"));
    }

    #[test]
    fn test_bad_port_and_blank_trigger_are_ignored() {
        let config = config(&[
            ("CONCIERGE_PORT", "eighty"),
            ("CONCIERGE_RESERVATION_TRIGGER", "   "),
        ]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.reservation_trigger, None);
    }
}
