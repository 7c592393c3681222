//! IRC session loop and the `ProtocolEngine` it exposes to event handlers.

use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use anyhow::{anyhow, Context, Result};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::mpsc;
use wutbot_irc::{
    parse_irc_line, InboundEvent, IrcEventKind, IrcMessage, IrcParseError, MAX_IRC_LINE_BYTES,
};
use wutbot_runtime::{EventHandler, ProtocolEngine};

use crate::connection_config::ConnectionConfig;
use crate::tls_transport::connect_tls;

mod registration;

pub use registration::SessionState;
use registration::Registration;

/// Live session handle. Sends are queued to the writer task and never wait on the socket.
pub struct IrcSession {
    outbound: mpsc::UnboundedSender<String>,
    state: RwLock<SessionState>,
    quit_message: String,
    quitting: AtomicBool,
}

impl IrcSession {
    fn new(outbound: mpsc::UnboundedSender<String>, config: &ConnectionConfig) -> Self {
        Self {
            outbound,
            state: RwLock::new(SessionState {
                current_nick: config.nick.clone(),
                isupport: BTreeMap::new(),
            }),
            quit_message: config.version.clone(),
            quitting: AtomicBool::new(false),
        }
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }

    fn send_message(&self, message: &IrcMessage) -> Result<()> {
        let line = message.to_line()?;
        if message.is_command("AUTHENTICATE") {
            tracing::debug!(line = "AUTHENTICATE <redacted>", "irc ->");
        } else {
            tracing::debug!(line = %line, "irc ->");
        }
        self.outbound
            .send(line)
            .map_err(|_| anyhow!("irc session writer has shut down"))
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProtocolEngine for IrcSession {
    fn send_raw(&self, command: &str, params: &[&str]) -> Result<()> {
        self.send_message(&IrcMessage::new(command, params.iter().copied()))
    }

    fn send_with_tags(
        &self,
        tags: &BTreeMap<String, String>,
        command: &str,
        params: &[&str],
    ) -> Result<()> {
        self.send_message(&IrcMessage::new(command, params.iter().copied()).with_tags(tags.clone()))
    }

    fn quit(&self) -> Result<()> {
        if self.quitting.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("quitting");
        self.send_message(&IrcMessage::new("QUIT", [self.quit_message.as_str()]))
    }

    fn current_nick(&self) -> String {
        self.read_state().current_nick.clone()
    }

    fn isupport(&self) -> BTreeMap<String, String> {
        self.read_state().isupport.clone()
    }
}

/// Connects over TLS and runs the session until the server closes it.
pub async fn connect_and_run(
    config: &ConnectionConfig,
    handler: Arc<dyn EventHandler>,
) -> Result<()> {
    let stream = connect_tls(&config.server, config.insecure_skip_verify).await?;
    tracing::info!(server = %config.server, "connected");
    run_irc_session(stream, config, handler).await
}

/// Registers on `stream` and delivers inbound events to `handler` one at a time, in arrival
/// order, from a dedicated delivery task.
///
/// Returns `Ok` when the server closes the connection or sends `ERROR`.
pub async fn run_irc_session<S>(
    stream: S,
    config: &ConnectionConfig,
    handler: Arc<dyn EventHandler>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let session = Arc::new(IrcSession::new(outbound_tx, config));
    let writer_task = tokio::spawn(async move {
        if let Err(error) = write_outbound_lines(writer, outbound_rx).await {
            tracing::warn!(error = %error, "irc writer stopped");
        }
    });
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let delivery_task = tokio::spawn(deliver_events(handler, Arc::clone(&session), event_rx));

    let mut registration = Registration::new(config);
    let result = async {
        for message in registration.opening_messages() {
            session.send_message(&message)?;
        }
        read_inbound_lines(reader, &session, &mut registration, &event_tx).await
    }
    .await;

    drop(event_tx);
    if let Err(error) = delivery_task.await {
        tracing::warn!(error = %error, "irc event delivery stopped");
    }
    writer_task.abort();
    result
}

async fn read_inbound_lines<R>(
    reader: R,
    session: &Arc<IrcSession>,
    registration: &mut Registration,
    events: &mpsc::UnboundedSender<InboundEvent>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        let Some(read) = read_bounded_line(&mut reader, &mut buffer).await? else {
            tracing::info!("irc server closed the connection");
            return Ok(());
        };
        let ReadLine::Complete = read else {
            tracing::debug!(limit = MAX_LINE_READ_BYTES, "discarding overlong irc line");
            continue;
        };

        let line = String::from_utf8_lossy(&buffer);
        let message = match parse_irc_line(&line) {
            Ok(message) => message,
            Err(IrcParseError::Empty) => continue,
            Err(error) => {
                tracing::debug!(error = %error, "skipping malformed irc line");
                continue;
            }
        };
        tracing::debug!(line = %line.trim_end(), "irc <-");

        let reaction = {
            let mut state = session.write_state();
            registration.react(message, &mut state)?
        };
        for reply in &reaction.replies {
            session.send_message(reply)?;
        }
        if let Some(event) = reaction.event {
            events
                .send(event)
                .map_err(|_| anyhow!("irc event delivery has shut down"))?;
        }
        if reaction.closed {
            return Ok(());
        }
    }
}

// CRLF on top of the largest line the parser accepts.
const MAX_LINE_READ_BYTES: usize = MAX_IRC_LINE_BYTES + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadLine {
    Complete,
    Overlong,
}

/// Reads one line into `buffer`, never holding more than `MAX_LINE_READ_BYTES` of it.
///
/// An overlong line is consumed through its terminator and reported as `Overlong`.
/// Returns `None` at end of stream.
async fn read_bounded_line<R>(reader: &mut R, buffer: &mut Vec<u8>) -> Result<Option<ReadLine>>
where
    R: AsyncBufRead + Unpin,
{
    buffer.clear();
    let read = read_line_chunk(reader, buffer).await?;
    if read == 0 {
        return Ok(None);
    }
    if buffer.ends_with(b"\n") || buffer.len() < MAX_LINE_READ_BYTES {
        return Ok(Some(ReadLine::Complete));
    }

    loop {
        buffer.clear();
        let read = read_line_chunk(reader, buffer).await?;
        if read == 0 || buffer.ends_with(b"\n") {
            buffer.clear();
            return Ok(Some(ReadLine::Overlong));
        }
    }
}

async fn read_line_chunk<R>(reader: &mut R, buffer: &mut Vec<u8>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    (&mut *reader)
        .take(MAX_LINE_READ_BYTES as u64)
        .read_until(b'\n', buffer)
        .await
        .context("failed to read from irc server")
}

async fn deliver_events(
    handler: Arc<dyn EventHandler>,
    session: Arc<IrcSession>,
    mut events: mpsc::UnboundedReceiver<InboundEvent>,
) {
    while let Some(event) = events.recv().await {
        if event.kind() == IrcEventKind::Connect {
            handler.on_connect(session.as_ref());
        } else {
            handler.on_event(&event, session.as_ref());
        }
    }
}

async fn write_outbound_lines<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<String>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = outbound.recv().await {
        writer
            .write_all(line.as_bytes())
            .await
            .context("failed to write to irc server")?;
        writer
            .write_all(b"\r\n")
            .await
            .context("failed to write to irc server")?;
        writer.flush().await.context("failed to flush irc stream")?;
    }
    Ok(())
}
