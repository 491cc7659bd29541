//! The connection actor: one task owning one encrypted gateway session.
//!
//! The actor processes a FIFO mailbox strictly sequentially, so no two
//! operations on the same connection ever race on the socket. Every failure
//! is terminal: the actor reports a [`Termination`] reason and a fresh
//! connection with a new handshake is required to resume service.

use std::{
    io,
    ops::ControlFlow,
    sync::atomic::{AtomicU64, Ordering},
};

use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};

use crate::{
    config::ConnectionConfig,
    frame::FrameError,
    message::NotificationMessage,
    tls::{self, ConnectError},
};

/// Mailbox depth before senders experience backpressure.
pub const MAILBOX_CAPACITY: usize = 32;

static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one connection's socket.
///
/// Transport close notices carry the identifier of the socket they concern;
/// the actor only recognizes notices for its own socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(u64);

impl SocketId {
    fn next() -> Self { Self(NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed)) }

    /// Return the inner identifier value.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

/// The closed set of inputs a connection actor accepts.
///
/// Anything outside `Send` and `Stop` is an anomaly; the `SocketClosed` and
/// `Unrecognized` arms exist so unexpected events terminate the actor instead
/// of being silently tolerated.
#[derive(Debug)]
pub enum Command {
    /// Encode and transmit one notification.
    Send(NotificationMessage),
    /// End the session voluntarily.
    Stop,
    /// Transport-layer notice that the named socket has closed.
    SocketClosed(SocketId),
    /// Catch-all for input outside the protocol surface; always fatal.
    Unrecognized(String),
}

/// Transport-level failure that ended a session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Writing to the socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A message could not be framed for transmission.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Why a connection actor stopped.
#[derive(Debug)]
pub enum Termination {
    /// Voluntary shutdown requested through [`ConnectionHandle::stop`].
    Normal,
    /// The transport failed; the error is preserved for the owner.
    Transport(TransportError),
    /// The gateway closed the socket.
    PeerClosed,
    /// The actor received input it does not recognize.
    Unrecognized(String),
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::PeerClosed => f.write_str("peer closed"),
            Self::Unrecognized(detail) => write!(f, "unrecognized input: {detail}"),
        }
    }
}

/// Error returned when commanding an already-terminated connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The actor has terminated and its mailbox is gone.
    #[error("connection already terminated")]
    Terminated,
}

struct Actor<S> {
    stream: S,
    id: SocketId,
    mailbox: mpsc::Receiver<Command>,
}

impl<S> Actor<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn run(mut self) -> Termination {
        let reason = self.serve().await;
        // Guaranteed release: shut the socket down on every exit path.
        if let Err(err) = self.stream.shutdown().await {
            tracing::debug!(socket = self.id.as_u64(), error = %err, "socket shutdown failed");
        }
        tracing::info!(socket = self.id.as_u64(), reason = %reason, "connection terminated");
        reason
    }

    async fn serve(&mut self) -> Termination {
        // The gateway sends nothing in normal operation, so a readable socket
        // either signals close (zero bytes) or unexpected input.
        let mut intake = [0u8; 64];
        let mut mailbox_open = true;
        loop {
            let command = tokio::select! {
                cmd = self.mailbox.recv(), if mailbox_open => match cmd {
                    Some(cmd) => cmd,
                    None => {
                        // Owner dropped the handle; keep serving socket
                        // events so peer close is still observed.
                        mailbox_open = false;
                        continue;
                    }
                },
                read = self.stream.read(&mut intake) => match read {
                    Ok(0) => Command::SocketClosed(self.id),
                    Ok(n) => Command::Unrecognized(format!("{n} unexpected bytes from gateway")),
                    Err(err) => return Termination::Transport(err.into()),
                },
            };
            if let ControlFlow::Break(reason) = self.handle(command).await {
                return reason;
            }
        }
    }

    async fn handle(&mut self, command: Command) -> ControlFlow<Termination> {
        match command {
            Command::Send(message) => self.transmit(&message).await,
            Command::Stop => ControlFlow::Break(Termination::Normal),
            Command::SocketClosed(id) if id == self.id => {
                ControlFlow::Break(Termination::PeerClosed)
            }
            Command::SocketClosed(id) => ControlFlow::Break(Termination::Unrecognized(format!(
                "close notice for foreign socket {}",
                id.as_u64()
            ))),
            Command::Unrecognized(detail) => {
                ControlFlow::Break(Termination::Unrecognized(detail))
            }
        }
    }

    async fn transmit(&mut self, message: &NotificationMessage) -> ControlFlow<Termination> {
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(err) => return ControlFlow::Break(Termination::Transport(err.into())),
        };
        let written = async {
            self.stream.write_all(&frame).await?;
            self.stream.flush().await
        };
        match written.await {
            Ok(()) => {
                tracing::debug!(
                    socket = self.id.as_u64(),
                    bytes = frame.len(),
                    "notification transmitted"
                );
                ControlFlow::Continue(())
            }
            Err(err) => ControlFlow::Break(Termination::Transport(err.into())),
        }
    }
}

/// Owner-facing handle to a running connection actor.
///
/// Sends are fire-and-forget; delivery problems surface later as the
/// termination reason returned by [`ConnectionHandle::join`]. Dropping the
/// handle without [`ConnectionHandle::stop`] leaves the actor serving socket
/// events until the peer closes the session.
#[derive(Debug)]
pub struct ConnectionHandle {
    commands: mpsc::Sender<Command>,
    id: SocketId,
    task: JoinHandle<Termination>,
}

impl ConnectionHandle {
    /// Spawn an actor over an already-established stream.
    ///
    /// [`connect`] is the normal entry point; this exists so callers and
    /// tests can drive the actor over any duplex byte stream.
    #[must_use]
    pub fn spawn<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (commands, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
        let id = SocketId::next();
        let task = tokio::spawn(
            Actor {
                stream,
                id,
                mailbox,
            }
            .run(),
        );
        tracing::debug!(socket = id.as_u64(), "connection actor started");
        Self { commands, id, task }
    }

    /// Return the identifier of the socket this connection owns.
    #[must_use]
    pub const fn id(&self) -> SocketId { self.id }

    /// Enqueue one notification for transmission.
    ///
    /// # Errors
    /// Returns [`CommandError::Terminated`] if the actor has already stopped.
    #[must_use = "handle the result"]
    pub async fn send(&self, message: NotificationMessage) -> Result<(), CommandError> {
        self.command(Command::Send(message)).await
    }

    /// Request a voluntary shutdown.
    ///
    /// # Errors
    /// Returns [`CommandError::Terminated`] if the actor has already stopped.
    #[must_use = "handle the result"]
    pub async fn stop(&self) -> Result<(), CommandError> {
        self.command(Command::Stop).await
    }

    /// Deliver a raw command to the actor's mailbox.
    ///
    /// # Errors
    /// Returns [`CommandError::Terminated`] if the actor has already stopped.
    #[must_use = "handle the result"]
    pub async fn command(&self, command: Command) -> Result<(), CommandError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CommandError::Terminated)
    }

    /// Wait for the actor to terminate and return the reason.
    pub async fn join(self) -> Termination {
        self.task.await.unwrap_or_else(|err| {
            Termination::Unrecognized(format!("connection task failed: {err}"))
        })
    }
}

/// Establish the encrypted session and start a connection actor over it.
///
/// # Errors
/// Returns a [`ConnectError`] when the handshake fails; no actor is spawned
/// on any failure path.
#[must_use = "handle the result"]
pub async fn connect(config: &ConnectionConfig) -> Result<ConnectionHandle, ConnectError> {
    let stream = tls::connect(config).await?;
    Ok(ConnectionHandle::spawn(stream))
}
