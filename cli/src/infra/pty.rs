//! Pseudo-terminal transport for ssh/scp.
//!
//! ssh and scp only prompt for passwords on a terminal, so sessions run the
//! client inside a PTY via `portable-pty`. A reader thread bridges the
//! blocking PTY master into a tokio channel; the driver awaits that channel
//! with a timeout.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{debug, trace};

use crate::application::ports::{Received, Transport, TransportFactory};
use crate::domain::{SessionError, SpawnSpec};

/// Wide enough that echoed commands are not wrapped by the remote line editor.
const PTY_COLS: u16 = 512;
const PTY_ROWS: u16 = 24;

/// How long `terminate` lets an exiting child finish before killing it.
const REAP_GRACE: Duration = Duration::from_millis(500);
const REAP_POLL: Duration = Duration::from_millis(50);

/// Spawns ssh/scp inside a fresh PTY.
#[derive(Debug, Default, Clone, Copy)]
pub struct PtyTransportFactory;

impl TransportFactory for PtyTransportFactory {
    type Transport = PtyTransport;

    fn spawn(&self, spec: &SpawnSpec) -> Result<PtyTransport, SessionError> {
        PtyTransport::spawn(spec)
    }
}

/// A child process attached to a PTY.
pub struct PtyTransport {
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    rx: UnboundedReceiver<Vec<u8>>,
    // Keeps the PTY open for the lifetime of the transport.
    _master: Box<dyn MasterPty + Send>,
}

impl PtyTransport {
    /// Open a PTY and start `spec.program` in it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Spawn` if the PTY cannot be opened or the
    /// program cannot be started.
    pub fn spawn(spec: &SpawnSpec) -> Result<Self, SessionError> {
        let spawn_err = |reason: String| SessionError::Spawn {
            program: spec.program.clone(),
            reason,
        };

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: PTY_ROWS,
                cols: PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| spawn_err(format!("cannot open pty: {e}")))?;

        let mut cmd = CommandBuilder::new(&spec.program);
        cmd.args(&spec.args);
        cmd.env("TERM", "dumb");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| spawn_err(e.to_string()))?;
        // Only the child holds the slave end now, so its exit closes the PTY.
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_err(format!("cannot read pty: {e}")))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_err(format!("cannot write pty: {e}")))?;

        let (tx, rx) = unbounded_channel();
        let program = spec.program.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    // EIO from the master means the child closed the slave.
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(%program, "pty reader finished");
        });

        debug!(program = %spec.program, target = %spec.target, "spawned in pty");
        Ok(Self {
            child,
            writer,
            rx,
            _master: pair.master,
        })
    }
}

impl Transport for PtyTransport {
    async fn send(&mut self, data: &[u8]) -> std::io::Result<()> {
        // PTY writes of a few KiB complete immediately.
        self.writer.write_all(data)?;
        self.writer.flush()
    }

    async fn recv(&mut self, timeout: Duration) -> std::io::Result<Received> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(data)) => {
                trace!(bytes = data.len(), "pty output");
                Ok(Received::Data(data))
            }
            Ok(None) => Ok(Received::Eof),
            Err(_) => Ok(Received::Idle),
        }
    }

    fn terminate(&mut self) -> Option<u32> {
        let mut waited = Duration::ZERO;
        while waited < REAP_GRACE {
            match self.child.try_wait() {
                Ok(Some(status)) => return Some(status.exit_code()),
                Ok(None) => {}
                Err(_) => break,
            }
            thread::sleep(REAP_POLL);
            waited += REAP_POLL;
        }
        let _ = self.child.kill();
        self.child.wait().ok().map(|status| status.exit_code())
    }
}
