//! Run intake listener.
//!
//! Task processes report their live output by connecting to a localhost TCP
//! socket and writing raw text. One connection is one run: on accept the
//! listener registers a fresh run, makes it the current selection, appends
//! incoming data as it arrives, and relabels the run with a finished marker
//! on clean disconnect.
//!
//! The listener binds an ephemeral port by default; task launchers learn it
//! through [`INTAKE_PORT_ENV_VAR`] in the environment they pass to child
//! processes.
//!
//! Data carries no framing: fragments are appended exactly as read, decoded
//! lossily as UTF-8. A failure on one connection never affects other runs.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::registry::RunRegistry;
use crate::run_id::{RunId, RunIdGenerator, RunLabeler, finished_label};

/// Environment variable through which the bound intake port is advertised
/// to task launchers.
pub const INTAKE_PORT_ENV_VAR: &str = "RUNMUX_INTAKE_PORT";

/// Registry shared between the intake listener and its host.
pub type SharedRegistry = Arc<Mutex<RunRegistry>>;

/// Build a [`SharedRegistry`] from a registry.
#[must_use]
pub fn shared(registry: RunRegistry) -> SharedRegistry {
    Arc::new(Mutex::new(registry))
}

// =============================================================================
// IntakeServer
// =============================================================================

/// TCP listener that turns inbound connections into runs.
pub struct IntakeServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    ids: Arc<RunIdGenerator>,
    labeler: Arc<RunLabeler>,
}

impl IntakeServer {
    /// Bind the listener.
    ///
    /// `addr` is usually `127.0.0.1:0` (ephemeral port); the actual bound
    /// address is available via [`Self::local_addr`].
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "Intake listener bound");
        Ok(Self {
            listener,
            local_addr,
            ids: Arc::new(RunIdGenerator::new()),
            labeler: Arc::new(RunLabeler::new()),
        })
    }

    /// The bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Environment entries a host should inject into task processes so
    /// their log writers can find this listener.
    #[must_use]
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![(INTAKE_PORT_ENV_VAR, self.port().to_string())]
    }

    /// Run the accept loop until the shutdown signal arrives.
    ///
    /// Each accepted connection is handled on its own task. Accept errors
    /// are logged and do not abort the loop.
    pub async fn run(self, registry: SharedRegistry, mut shutdown_rx: mpsc::Receiver<()>) {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let registry = registry.clone();
                            let ids = self.ids.clone();
                            let labeler = self.labeler.clone();
                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(stream, peer, registry, &ids, &labeler).await
                                {
                                    warn!(error = %e, peer = %peer, "Run stream error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept run stream connection");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Intake listener shutting down");
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for IntakeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeServer")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

/// Handle one run stream: register, select, append until EOF, mark finished.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    registry: SharedRegistry,
    ids: &RunIdGenerator,
    labeler: &RunLabeler,
) -> std::io::Result<()> {
    let run_id: RunId = ids.next_id();
    let label = labeler.next_label();
    {
        let mut reg = registry.lock().await;
        reg.begin_run(run_id.clone(), label.clone());
        reg.set_current_run(&run_id);
    }
    info!(run_id = %run_id, peer = %peer, "Run stream connected");

    let mut buf = [0u8; 8192];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let chunk = String::from_utf8_lossy(&buf[..n]);
        debug!(run_id = %run_id, bytes = n, "Run output fragment");
        registry.lock().await.append_to_run(&run_id, &chunk);
    }

    registry
        .lock()
        .await
        .set_label(&run_id, finished_label(&label));
    info!(run_id = %run_id, "Run stream finished");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
