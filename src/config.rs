use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which backend publishes the stored snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PublishMode {
    /// Local daemon reached over its HTTP API
    Daemon,
    /// Third-party pinning service
    #[default]
    Pinner,
    /// Throwaway in-process node
    Embedded,
}

impl PublishMode {
    /// Parse a mode name. Empty or unrecognized names fall back to `Pinner`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "daemon" => PublishMode::Daemon,
            "embedded" => PublishMode::Embedded,
            "pinner" => PublishMode::Pinner,
            other => {
                if !other.is_empty() {
                    ::log::warn!("Unknown publish mode {:?}, using pinner", other);
                }
                PublishMode::Pinner
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublishMode::Daemon => "daemon",
            PublishMode::Pinner => "pinner",
            PublishMode::Embedded => "embedded",
        }
    }
}

impl From<String> for PublishMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<PublishMode> for String {
    fn from(mode: PublishMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Pinning provider slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PinningSlot {
    /// Default provider, no credentials needed
    #[default]
    Infura,
    /// Named alternate, requires an api key and secret
    Pinata,
}

impl PinningSlot {
    /// Unset or unknown slot names select the default provider
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pinata" => PinningSlot::Pinata,
            _ => PinningSlot::Infura,
        }
    }
}

impl From<String> for PinningSlot {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<PinningSlot> for String {
    fn from(slot: PinningSlot) -> Self {
        match slot {
            PinningSlot::Infura => "infura".to_string(),
            PinningSlot::Pinata => "pinata".to_string(),
        }
    }
}

/// Pinning service selection and credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinningConfig {
    #[serde(default)]
    pub slot: PinningSlot,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub secret: String,
}

/// Configuration for one archiving batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiverConfig {
    /// Route captures through a local Tor proxy
    #[serde(default)]
    pub use_tor: bool,

    /// Name or path of the Tor executable
    #[serde(default = "default_tor_binary")]
    pub tor_binary: String,

    /// Publish backend; unknown values become `pinner`
    #[serde(default)]
    pub publish_mode: PublishMode,

    /// Daemon API host
    #[serde(default = "default_daemon_host")]
    pub daemon_host: String,

    /// Daemon API port, checked against 1..=65535 when publishing
    #[serde(default = "default_daemon_port")]
    pub daemon_port: u32,

    /// Optional per-stage timeout in seconds for capture and publish
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// URL for the WebDriver instance used to capture pages
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Public gateway used to build destination URLs
    #[serde(default = "default_gateway")]
    pub gateway: String,

    /// URL fragments for which JavaScript is disabled during capture
    #[serde(default)]
    pub disable_js_patterns: Vec<String>,

    #[serde(default)]
    pub pinning: PinningConfig,

    /// Parent of the per-batch scratch directory, system temp dir when unset
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
}

fn default_tor_binary() -> String {
    "tor".to_string()
}

fn default_daemon_host() -> String {
    "127.0.0.1".to_string()
}

fn default_daemon_port() -> u32 {
    5001
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_gateway() -> String {
    "https://ipfs.io/ipfs".to_string()
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            use_tor: false,
            tor_binary: default_tor_binary(),
            publish_mode: PublishMode::default(),
            daemon_host: default_daemon_host(),
            daemon_port: default_daemon_port(),
            timeout_secs: None,
            webdriver_url: default_webdriver_url(),
            gateway: default_gateway(),
            disable_js_patterns: Vec::new(),
            pinning: PinningConfig::default(),
            temp_root: None,
        }
    }
}

impl ArchiverConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Fold in the process environment, see [`ArchiverConfig::apply_vars`]
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Fold in `DISABLEJS_URIS`, `WEBDRIVER_URL`, `WAYBACK_SLOT`,
    /// `WAYBACK_APIKEY` and `WAYBACK_SECRET` as returned by `var`.
    ///
    /// Only variables that are set override; everything else keeps the value
    /// from the file or the defaults.
    pub fn apply_vars<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uris) = var("DISABLEJS_URIS") {
            self.disable_js_patterns.extend(
                uris.split('|')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }
        if let Some(webdriver_url) = var("WEBDRIVER_URL").filter(|v| !v.is_empty()) {
            self.webdriver_url = webdriver_url;
        }
        if let Some(slot) = var("WAYBACK_SLOT") {
            self.pinning.slot = PinningSlot::parse(&slot);
        }
        if let Some(api_key) = var("WAYBACK_APIKEY") {
            self.pinning.api_key = api_key;
        }
        if let Some(secret) = var("WAYBACK_SECRET") {
            self.pinning.secret = secret;
        }
        self
    }

    pub fn with_tor(mut self, use_tor: bool) -> Self {
        self.use_tor = use_tor;
        self
    }

    pub fn with_publish_mode(mut self, mode: PublishMode) -> Self {
        self.publish_mode = mode;
        self
    }

    pub fn with_daemon(mut self, host: &str, port: u32) -> Self {
        self.daemon_host = host.to_string();
        self.daemon_port = port;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = Some(seconds);
        self
    }

    pub fn with_pinning(mut self, pinning: PinningConfig) -> Self {
        self.pinning = pinning;
        self
    }

    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Per-stage timeout, if one is configured. Zero means no timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_mode_fallback() {
        assert_eq!(PublishMode::parse("daemon"), PublishMode::Daemon);
        assert_eq!(PublishMode::parse("embedded"), PublishMode::Embedded);
        assert_eq!(PublishMode::parse("pinner"), PublishMode::Pinner);

        // Empty and unknown names both land on the pinning service
        assert_eq!(PublishMode::parse(""), PublishMode::Pinner);
        assert_eq!(PublishMode::parse("ftp"), PublishMode::Pinner);
    }

    #[test]
    fn test_pinning_slot_fallback() {
        assert_eq!(PinningSlot::parse("pinata"), PinningSlot::Pinata);
        assert_eq!(PinningSlot::parse(""), PinningSlot::Infura);
        assert_eq!(PinningSlot::parse("nft.storage"), PinningSlot::Infura);
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config = ArchiverConfig::from_json("{}").unwrap();
        assert!(!config.use_tor);
        assert_eq!(config.publish_mode, PublishMode::Pinner);
        assert_eq!(config.daemon_host, "127.0.0.1");
        assert_eq!(config.daemon_port, 5001);
        assert_eq!(config.gateway, "https://ipfs.io/ipfs");
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_config_from_json_lenient_mode() {
        let json = r#"{"publish_mode": "carrier-pigeon", "daemon_port": 70000}"#;
        let config = ArchiverConfig::from_json(json).unwrap();
        assert_eq!(config.publish_mode, PublishMode::Pinner);
        assert_eq!(config.daemon_port, 70000);

        let json = r#"{"publish_mode": "daemon", "pinning": {"slot": "pinata", "api_key": "k"}}"#;
        let config = ArchiverConfig::from_json(json).unwrap();
        assert_eq!(config.publish_mode, PublishMode::Daemon);
        assert_eq!(config.pinning.slot, PinningSlot::Pinata);
        assert_eq!(config.pinning.api_key, "k");
        assert!(config.pinning.secret.is_empty());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_pinning_overrides_file() {
        let json = r#"{"pinning": {"slot": "infura", "api_key": "file-key"}, "webdriver_url": "http://grid:4444"}"#;
        let config = ArchiverConfig::from_json(json).unwrap().apply_vars(vars(&[
            ("WAYBACK_SLOT", "pinata"),
            ("WAYBACK_APIKEY", "env-key"),
            ("WAYBACK_SECRET", "env-secret"),
        ]));

        assert_eq!(config.pinning.slot, PinningSlot::Pinata);
        assert_eq!(config.pinning.api_key, "env-key");
        assert_eq!(config.pinning.secret, "env-secret");
        assert_eq!(config.webdriver_url, "http://grid:4444");
    }

    #[test]
    fn test_unset_env_keeps_file_values() {
        let json = r#"{"pinning": {"slot": "pinata", "api_key": "k", "secret": "s"}}"#;
        let config = ArchiverConfig::from_json(json)
            .unwrap()
            .apply_vars(vars(&[("DISABLEJS_URIS", "wikipedia.org|twitter.com")]));

        assert_eq!(config.pinning.slot, PinningSlot::Pinata);
        assert_eq!(config.pinning.api_key, "k");
        assert_eq!(config.pinning.secret, "s");
        assert_eq!(
            config.disable_js_patterns,
            vec!["wikipedia.org".to_string(), "twitter.com".to_string()]
        );
    }

    #[test]
    fn test_zero_timeout_means_none() {
        assert_eq!(ArchiverConfig::default().with_timeout(0).timeout(), None);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ArchiverConfig::default()
            .with_tor(true)
            .with_publish_mode(PublishMode::Daemon)
            .with_daemon("ipfs.local", 5002)
            .with_timeout(30);
        assert!(config.use_tor);
        assert_eq!(config.publish_mode, PublishMode::Daemon);
        assert_eq!(config.daemon_host, "ipfs.local");
        assert_eq!(config.daemon_port, 5002);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }
}
