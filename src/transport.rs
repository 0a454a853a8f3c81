//! Local Tor proxy used to anonymize page captures.
//!
//! `setup_transport` is run once per batch, before any job starts. The returned
//! [`TransportHandle`] keeps the proxy alive and must outlive every job; the
//! [`Dialer`] is handed to the page-snapshot collaborator.

use crate::error::TransportError;
use std::net::{Ipv4Addr, SocketAddr};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Upper bound on how long the proxy may take to bootstrap
pub const READY_CEILING: Duration = Duration::from_secs(60);

const READY_LINE: &str = "Bootstrapped 100%";

/// Address of the proxy that page captures are routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialer {
    socks_addr: SocketAddr,
}

impl Dialer {
    pub fn new(socks_addr: SocketAddr) -> Self {
        Self { socks_addr }
    }

    /// Address of the local SOCKS5 listener
    pub fn socks_addr(&self) -> SocketAddr {
        self.socks_addr
    }
}

/// Keeps the proxy process alive. Dropping it kills the process and removes
/// its data directory.
#[derive(Debug)]
pub struct TransportHandle {
    child: Child,
    drain: JoinHandle<()>,
    _data_dir: TempDir,
}

impl TransportHandle {
    /// Stop the proxy and wait for it to exit
    pub async fn close(mut self) {
        if let Err(e) = self.child.kill().await {
            ::log::warn!("Failed to stop tor process: {}", e);
        }
        self.drain.abort();
        ::log::debug!("Tor process stopped");
    }
}

/// Start the proxy and wait until it can carry connections.
///
/// Fails with `ExecutableNotFound` when `binary` is not on `PATH` and with
/// `TransportTimeout` when it does not bootstrap within `deadline`.
pub async fn setup_transport(
    binary: &str,
    deadline: Duration,
) -> Result<(Dialer, TransportHandle), TransportError> {
    let program =
        which::which(binary).map_err(|_| TransportError::ExecutableNotFound(binary.to_string()))?;
    ::log::info!("Starting tor from {}", program.display());

    let data_dir = tempfile::Builder::new().prefix("wayback-tor-").tempdir()?;
    let socks_addr = free_local_addr()?;

    let mut child = Command::new(&program)
        .arg("--SocksPort")
        .arg(socks_addr.to_string())
        .arg("--DataDirectory")
        .arg(data_dir.path())
        .arg("--Log")
        .arg("notice stdout")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(TransportError::Spawn)?;

    let stdout = child.stdout.take().ok_or(TransportError::Exited)?;
    let mut lines = BufReader::new(stdout).lines();

    let ready = tokio::time::timeout(deadline, async {
        while let Some(line) = lines.next_line().await? {
            ::log::trace!("tor: {}", line);
            if line.contains(READY_LINE) {
                return Ok(true);
            }
        }
        Ok::<bool, std::io::Error>(false)
    })
    .await;

    match ready {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => return Err(TransportError::Exited),
        Ok(Err(e)) => return Err(TransportError::Io(e)),
        Err(_) => return Err(TransportError::TransportTimeout(deadline)),
    }

    // Keep reading so the process never blocks on a full pipe
    let drain = tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            ::log::trace!("tor: {}", line);
        }
    });

    ::log::info!("Tor ready, SOCKS listener on {}", socks_addr);
    Ok((
        Dialer::new(socks_addr),
        TransportHandle {
            child,
            drain,
            _data_dir: data_dir,
        },
    ))
}

/// Ask the OS for an unused loopback port
fn free_local_addr() -> std::io::Result<SocketAddr> {
    let listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    listener.local_addr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_executable() {
        let result = setup_transport("definitely-not-a-tor-binary-xyz", READY_CEILING).await;
        match result {
            Err(TransportError::ExecutableNotFound(name)) => {
                assert_eq!(name, "definitely-not-a-tor-binary-xyz")
            }
            other => panic!("expected ExecutableNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_proxy_exiting_before_bootstrap() {
        // `true` ignores its arguments and exits without printing anything
        let result = setup_transport("true", Duration::from_secs(5)).await;
        assert!(matches!(result, Err(TransportError::Exited)));
    }
}
