//! Printer adapters for sending ESC/POS data

use crate::error::{PrintError, PrintResult};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// Raw printing port of network thermal printers
pub const DEFAULT_PORT: u16 = 9100;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (raw TCP)
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        Self::from_addr(&format!("{host}:{port}"))
    }

    /// Parse `ip:port`, or a bare IP which uses [`DEFAULT_PORT`]
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr = addr.trim();
        let parsed: SocketAddr = match addr.parse() {
            Ok(socket) => socket,
            Err(_) => addr
                .parse::<std::net::IpAddr>()
                .map(|ip| SocketAddr::new(ip, DEFAULT_PORT))
                .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {addr}")))?,
        };

        Ok(Self {
            addr: parsed,
            timeout: CONNECT_TIMEOUT,
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        info!("Connecting to printer");

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))?;

        stream.write_all(data).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        info!("Print job sent");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr))]
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer probe timeout");
                false
            }
        }
    }
}
