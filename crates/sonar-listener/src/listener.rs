//! Line-based command server driving a wrapped SUT.
//!
//! One client is served at a time. Each line is a command token:
//!
//! - `reset` ends the current query and answers `resetok`
//! - `exit` ends the current query and terminates the listener
//! - `query` starts a batch: input names, one per line, up to a blank line,
//!   executed in a single query
//! - anything else is an input name, executed in the current query (started
//!   on demand) and answered with the output's textual form

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use sonar_sul::{Sul, SulError};
use sonar_types::{Alphabet, CleanupTasks, InputSymbol};

use crate::config::ListenerConfig;

const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Longest command line accepted, terminator included.
pub const MAX_LINE_LEN: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Listener I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown input symbol '{0}'")]
    UnknownSymbol(String),

    #[error(transparent)]
    Sul(#[from] SulError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SulOff,
    SulOn,
    ReadQuery,
    ConnClosed,
    Terminate,
}

struct Connection {
    peer: SocketAddr,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    fn new(stream: TcpStream, peer: SocketAddr) -> io::Result<Self> {
        stream.set_nonblocking(false)?;
        let writer = stream.try_clone()?;
        Ok(Self {
            peer,
            reader: BufReader::new(stream),
            writer,
        })
    }

    /// Next line without its terminator. None once the peer is gone or sent
    /// a line longer than `MAX_LINE_LEN`.
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match (&mut self.reader).take(MAX_LINE_LEN as u64).read_line(&mut line) {
            Ok(0) => None,
            Ok(n) if n == MAX_LINE_LEN && !line.ends_with('\n') => {
                tracing::warn!(peer = %self.peer, limit = MAX_LINE_LEN, "command line too long, dropping client");
                None
            }
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "read failed");
                None
            }
        }
    }

    /// False if the peer can no longer be written to.
    fn write_line(&mut self, line: &str) -> bool {
        let result = writeln!(self.writer, "{line}").and_then(|()| self.writer.flush());
        if let Err(e) = &result {
            tracing::debug!(peer = %self.peer, error = %e, "write failed");
        }
        result.is_ok()
    }
}

/// Serves the command protocol over TCP against one SUT.
pub struct CommandListener<S: Sul> {
    listener: TcpListener,
    config: ListenerConfig,
    sul: S,
    alphabet: Alphabet,
    cleanup: CleanupTasks,
}

impl<S: Sul> CommandListener<S> {
    /// Bind the listening socket. `cleanup` holds the release actions of
    /// whatever was acquired to build `sul`; they run when the listener terminates.
    pub fn bind(
        config: ListenerConfig,
        sul: S,
        alphabet: Alphabet,
        cleanup: CleanupTasks,
    ) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind((config.address.as_str(), config.port))?;
        tracing::info!(address = %listener.local_addr()?, "command listener bound");
        Ok(Self {
            listener,
            config,
            sul,
            alphabet,
            cleanup,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ListenerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve clients until `exit`, an accept timeout, the end of the only
    /// connection (non-continuous mode), or a fatal error. Cleanup tasks run
    /// once on every path.
    pub fn run(mut self) -> Result<(), ListenerError> {
        let result = self.serve();
        match &result {
            Ok(()) => tracing::info!("command listener terminated"),
            Err(e) => tracing::error!(error = %e, "command listener terminated"),
        }
        let Self {
            listener,
            mut cleanup,
            ..
        } = self;
        drop(listener);
        cleanup.run_all();
        result
    }

    fn serve(&mut self) -> Result<(), ListenerError> {
        loop {
            let Some(mut conn) = self.accept()? else {
                tracing::info!("no client within accept timeout");
                return Ok(());
            };
            tracing::info!(peer = %conn.peer, "client connected");
            let end = self.session(&mut conn)?;
            match end {
                State::Terminate => return Ok(()),
                _ if self.config.continuous => {
                    tracing::info!(peer = %conn.peer, "client disconnected, waiting for next");
                }
                _ => {
                    tracing::info!(peer = %conn.peer, "client disconnected");
                    return Ok(());
                }
            }
        }
    }

    fn accept(&mut self) -> Result<Option<Connection>, ListenerError> {
        let Some(timeout) = self.config.accept_timeout() else {
            self.listener.set_nonblocking(false)?;
            let (stream, peer) = self.listener.accept()?;
            return Ok(Some(Connection::new(stream, peer)?));
        };

        self.listener.set_nonblocking(true)?;
        let deadline = Instant::now() + timeout;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => return Ok(Some(Connection::new(stream, peer)?)),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Run the state machine for one connection. Returns `ConnClosed` or `Terminate`.
    fn session(&mut self, conn: &mut Connection) -> Result<State, ListenerError> {
        let mut state = State::SulOff;
        loop {
            state = match state {
                State::SulOff | State::SulOn => self.command(state, conn)?,
                State::ReadQuery => self.query(conn)?,
                State::ConnClosed | State::Terminate => return Ok(state),
            };
        }
    }

    fn command(&mut self, state: State, conn: &mut Connection) -> Result<State, ListenerError> {
        let on = state == State::SulOn;
        let Some(token) = conn.read_line() else {
            if on {
                self.sul.post()?;
            }
            return Ok(State::ConnClosed);
        };

        match token.as_str() {
            "" => Ok(state),
            "reset" => {
                if on {
                    self.sul.post()?;
                }
                if conn.write_line("resetok") {
                    Ok(State::SulOff)
                } else {
                    Ok(State::ConnClosed)
                }
            }
            "exit" => {
                if on {
                    self.sul.post()?;
                }
                Ok(State::Terminate)
            }
            "query" => {
                if on {
                    self.sul.post()?;
                }
                Ok(State::ReadQuery)
            }
            name => {
                let input = match self.resolve(name) {
                    Ok(input) => input,
                    Err(e) => {
                        if on {
                            self.sul.post()?;
                        }
                        return Err(e);
                    }
                };
                if !on {
                    self.sul.pre()?;
                }
                let output = match self.sul.step(&input) {
                    Ok(output) => output,
                    Err(e) => {
                        self.post_quietly();
                        return Err(e.into());
                    }
                };
                if conn.write_line(&output.to_string()) {
                    Ok(State::SulOn)
                } else {
                    self.sul.post()?;
                    Ok(State::ConnClosed)
                }
            }
        }
    }

    fn query(&mut self, conn: &mut Connection) -> Result<State, ListenerError> {
        let mut inputs = Vec::new();
        let mut closed = false;
        loop {
            match conn.read_line() {
                None => {
                    closed = true;
                    break;
                }
                Some(line) if line.is_empty() => break,
                Some(line) => inputs.push(self.resolve(&line)?),
            }
        }
        tracing::debug!(peer = %conn.peer, inputs = inputs.len(), "executing query batch");

        self.sul.pre()?;
        let mut outputs = Vec::with_capacity(inputs.len());
        for input in &inputs {
            match self.sul.step(input) {
                Ok(output) => outputs.push(output.to_string()),
                Err(e) => {
                    self.post_quietly();
                    return Err(e.into());
                }
            }
        }
        self.sul.post()?;

        if closed || !outputs.iter().all(|output| conn.write_line(output)) {
            return Ok(State::ConnClosed);
        }
        Ok(State::SulOff)
    }

    fn resolve(&self, name: &str) -> Result<InputSymbol, ListenerError> {
        match self.alphabet.get(name) {
            Some(input) => Ok(input.clone()),
            None => {
                tracing::error!(symbol = name, "unknown input symbol");
                Err(ListenerError::UnknownSymbol(name.to_string()))
            }
        }
    }

    /// End the current query on a failure path, keeping the original error.
    fn post_quietly(&mut self) {
        if let Err(e) = self.sul.post() {
            tracing::warn!(error = %e, "post failed while terminating");
        }
    }
}
