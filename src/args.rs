use clap::Parser;
use ipfs_wayback::{ArchiverConfig, PublishMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ipfs-wayback")]
#[command(about = "Archive web pages and publish the snapshots to IPFS")]
#[command(version)]
pub struct Args {
    /// Links to archive
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// IPFS daemon host
    #[arg(long)]
    pub host: Option<String>,

    /// IPFS daemon port
    #[arg(long)]
    pub port: Option<u32>,

    /// Publish mode: daemon, pinner or embedded (anything else means pinner)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Capture pages through Tor, requires the tor executable
    #[arg(long)]
    pub tor: bool,

    /// Per-stage timeout in seconds for capture and publish, 0 disables it
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// WebDriver server used to capture pages
    #[arg(long)]
    pub webdriver: Option<String>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the results as a JSON object
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Fold the command-line overrides into `config`
    pub fn apply(&self, mut config: ArchiverConfig) -> ArchiverConfig {
        if let Some(host) = &self.host {
            config.daemon_host = host.clone();
        }
        if let Some(port) = self.port {
            config.daemon_port = port;
        }
        if let Some(mode) = &self.mode {
            config.publish_mode = PublishMode::parse(mode);
        }
        if self.tor {
            config.use_tor = true;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        if let Some(webdriver) = &self.webdriver {
            config.webdriver_url = webdriver.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "ipfs-wayback",
            "--host",
            "10.0.0.2",
            "--port",
            "5002",
            "--mode",
            "daemon",
            "--tor",
            "https://example.com/",
            "https://example.org/",
        ]);
        assert_eq!(args.urls.len(), 2);

        let config = args.apply(ArchiverConfig::default());
        assert_eq!(config.daemon_host, "10.0.0.2");
        assert_eq!(config.daemon_port, 5002);
        assert_eq!(config.publish_mode, PublishMode::Daemon);
        assert!(config.use_tor);
    }

    #[test]
    fn test_unknown_mode_flag_means_pinner() {
        let args = Args::parse_from(["ipfs-wayback", "--mode", "ftp", "https://example.com/"]);
        let config = args.apply(ArchiverConfig::default());
        assert_eq!(config.publish_mode, PublishMode::Pinner);
    }

    #[test]
    fn test_zero_timeout_disables_stage_limit() {
        let args = Args::parse_from(["ipfs-wayback", "--timeout", "0", "https://example.com/"]);
        let config = args.apply(ArchiverConfig::default());
        assert_eq!(config.timeout(), None);

        let args = Args::parse_from(["ipfs-wayback", "-t", "15", "https://example.com/"]);
        let config = args.apply(ArchiverConfig::default());
        assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(15)));
    }

    #[test]
    fn test_urls_required() {
        assert!(Args::try_parse_from(["ipfs-wayback"]).is_err());
    }
}
