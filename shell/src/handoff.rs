//! Second-instance hand-off: the losing process sends its arguments to the
//! primary over a local endpoint and exits.
//!
//! Wire format is one newline-terminated JSON object per connection:
//! `{"argv": [...], "working_dir": "..."}`.
//!
//! The endpoint is a Unix domain socket (`handoff.sock`) on Unix. Elsewhere it
//! is a loopback TCP listener whose port is published in `handoff.port`. Both
//! live in the directory passed to [`serve`] and [`send`].
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Longest accepted message, newline included.
pub const MAX_MESSAGE_BYTES: u64 = 64 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffMessage {
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
}

impl HandoffMessage {
    /// Arguments (without the executable path) and working directory of this process.
    pub fn from_current_process() -> Self {
        Self {
            argv: std::env::args().skip(1).collect(),
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self).context("Failed to encode handoff message")?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn decode(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim_end()).context("Malformed handoff message")
    }
}

/// Reads a single message, rejecting anything longer than [`MAX_MESSAGE_BYTES`].
pub fn read_message<R: Read>(reader: R) -> Result<HandoffMessage> {
    let mut line = String::new();
    BufReader::new(reader.take(MAX_MESSAGE_BYTES + 1))
        .read_line(&mut line)
        .context("Failed to read handoff message")?;
    if line.len() as u64 > MAX_MESSAGE_BYTES {
        bail!("Handoff message exceeds {MAX_MESSAGE_BYTES} bytes");
    }
    if line.trim().is_empty() {
        bail!("Empty handoff message");
    }
    HandoffMessage::decode(&line)
}

/// Binds the endpoint in `dir` and serves it on a dedicated thread for the
/// rest of the process life, passing each decoded message to `on_message`.
///
/// Binding happens before this returns, so a message sent afterwards is
/// never lost. Must only be called by the lock holder.
pub fn serve<F>(dir: &Path, on_message: F) -> Result<JoinHandle<()>>
where
    F: Fn(HandoffMessage) + Send + 'static,
{
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create handoff directory: {}", dir.display()))?;
    let listener = imp::bind(dir)?;

    std::thread::Builder::new()
        .name("instance-handoff".into())
        .spawn(move || {
            for conn in listener.incoming() {
                let stream = match conn {
                    Ok(s) => s,
                    Err(e) => {
                        warn!("handoff accept failed: {e}");
                        continue;
                    }
                };
                if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
                    debug!("could not set handoff read timeout: {e}");
                }
                match read_message(stream) {
                    Ok(message) => on_message(message),
                    Err(e) => warn!("dropped handoff message: {e:#}"),
                }
            }
        })
        .context("Failed to spawn handoff thread")
}

/// Delivers `message` to the primary instance serving `dir`.
pub fn send(dir: &Path, message: &HandoffMessage) -> Result<()> {
    let mut stream = imp::connect(dir)?;
    stream
        .write_all(&message.encode()?)
        .context("Failed to write handoff message")?;
    stream.flush().context("Failed to flush handoff message")?;
    Ok(())
}

// ── Unix: domain socket ───────────────────────────────────────────────────────

#[cfg(unix)]
mod imp {
    use std::os::unix::net::{UnixListener, UnixStream};
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};

    pub const SOCKET_FILE_NAME: &str = "handoff.sock";

    fn socket_path(dir: &Path) -> PathBuf {
        dir.join(SOCKET_FILE_NAME)
    }

    pub fn bind(dir: &Path) -> Result<UnixListener> {
        let path = socket_path(dir);
        // Only the lock holder binds, so an existing socket is left over from
        // a process that died without cleaning up.
        if path.exists() {
            std::fs::remove_file(&path).with_context(|| {
                format!("Failed to remove stale handoff socket: {}", path.display())
            })?;
        }
        UnixListener::bind(&path)
            .with_context(|| format!("Failed to bind handoff socket: {}", path.display()))
    }

    pub fn connect(dir: &Path) -> Result<UnixStream> {
        let path = socket_path(dir);
        UnixStream::connect(&path)
            .with_context(|| format!("Failed to connect to handoff socket: {}", path.display()))
    }
}

// ── Other platforms: loopback TCP ─────────────────────────────────────────────

#[cfg(not(unix))]
mod imp {
    use std::net::{Ipv4Addr, TcpListener, TcpStream};
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};

    pub const PORT_FILE_NAME: &str = "handoff.port";

    fn port_path(dir: &Path) -> PathBuf {
        dir.join(PORT_FILE_NAME)
    }

    pub fn bind(dir: &Path) -> Result<TcpListener> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .context("Failed to bind handoff listener")?;
        let port = listener
            .local_addr()
            .context("Failed to read handoff listener address")?
            .port();
        let path = port_path(dir);
        std::fs::write(&path, port.to_string())
            .with_context(|| format!("Failed to write handoff port file: {}", path.display()))?;
        Ok(listener)
    }

    pub fn connect(dir: &Path) -> Result<TcpStream> {
        let path = port_path(dir);
        let port: u16 = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read handoff port file: {}", path.display()))?
            .trim()
            .parse()
            .context("Handoff port file is corrupt")?;
        TcpStream::connect((Ipv4Addr::LOCALHOST, port)).context("Failed to connect to handoff port")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
