//! Remote launcher client.
//!
//! Instead of spawning the SUT locally, the adapter asks a launcher service to
//! start and stop it. The launcher speaks a line protocol:
//!
//! | request | reply |
//! |---|---|
//! | `start` | `started` or `started <port>` |
//! | `stop` | `stopped` |
//! | `alive` | `alive true` or `alive false` |
//! | `exit` | none, the launcher closes the connection |

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::sul::SulError;

/// Starts and stops the SUT through some launcher.
pub trait LauncherAdapter {
    /// Start a SUT instance. Returns the port it listens on, if the launcher chose one.
    fn start(&mut self) -> Result<Option<u16>, SulError>;

    /// Stop the running instance.
    fn stop(&mut self) -> Result<(), SulError>;

    /// Whether the running instance is still alive.
    fn is_alive(&mut self) -> Result<bool, SulError>;

    /// Release the connection to the launcher.
    fn close(&mut self) {}
}

/// `LauncherAdapter` over a TCP connection to a launcher service.
pub struct TcpLauncherClient {
    address: String,
    port: u16,
    timeout: Option<Duration>,
    conn: Option<Connection>,
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TcpLauncherClient {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            timeout: None,
            conn: None,
        }
    }

    /// Bound each reply wait by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn connection(&mut self) -> Result<&mut Connection, SulError> {
        if self.conn.is_none() {
            let stream = TcpStream::connect((self.address.as_str(), self.port)).map_err(|e| {
                SulError::Adapter(format!(
                    "cannot reach launcher at {}:{}: {e}",
                    self.address, self.port
                ))
            })?;
            stream.set_read_timeout(self.timeout)?;
            stream.set_nodelay(true)?;
            let writer = stream.try_clone()?;
            tracing::debug!(address = %self.address, port = self.port, "connected to launcher");
            self.conn = Some(Connection {
                reader: BufReader::new(stream),
                writer,
            });
        }
        self.conn
            .as_mut()
            .ok_or_else(|| SulError::Adapter("launcher connection unavailable".to_string()))
    }

    fn request(&mut self, command: &str) -> Result<String, SulError> {
        let conn = self.connection()?;
        writeln!(conn.writer, "{command}")?;
        conn.writer.flush()?;

        let mut line = String::new();
        if conn.reader.read_line(&mut line)? == 0 {
            self.conn = None;
            return Err(SulError::Adapter(format!(
                "launcher closed the connection after '{command}'"
            )));
        }
        Ok(line.trim().to_string())
    }
}

impl LauncherAdapter for TcpLauncherClient {
    fn start(&mut self) -> Result<Option<u16>, SulError> {
        let reply = self.request("start")?;
        let mut parts = reply.split_whitespace();
        if parts.next() != Some("started") {
            return Err(SulError::Adapter(format!("unexpected reply to start: '{reply}'")));
        }
        match parts.next() {
            None => Ok(None),
            Some(port) => port
                .parse::<u16>()
                .map(Some)
                .map_err(|_| SulError::Adapter(format!("invalid port in reply: '{reply}'"))),
        }
    }

    fn stop(&mut self) -> Result<(), SulError> {
        let reply = self.request("stop")?;
        if reply != "stopped" {
            return Err(SulError::Adapter(format!("unexpected reply to stop: '{reply}'")));
        }
        Ok(())
    }

    fn is_alive(&mut self) -> Result<bool, SulError> {
        let reply = self.request("alive")?;
        match reply.as_str() {
            "alive true" => Ok(true),
            "alive false" => Ok(false),
            _ => Err(SulError::Adapter(format!("unexpected reply to alive: '{reply}'"))),
        }
    }

    fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            // The launcher may already be gone.
            let _ = writeln!(conn.writer, "exit");
            let _ = conn.writer.flush();
        }
    }
}

impl Drop for TcpLauncherClient {
    fn drop(&mut self) {
        self.close();
    }
}
