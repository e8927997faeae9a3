/**
 * Connection Session
 *
 * One session per accepted WebSocket. A session registers itself with the
 * hub and then runs two loops:
 *
 * - **receive loop** (on the calling task) - reads client frames under a
 *   read deadline that is pushed back on every frame, decodes text frames
 *   and hands them to the fanout router
 * - **send loop** (spawned) - writes queued events and heartbeat pings,
 *   each write bounded by the write timeout
 *
 * Whichever loop stops first asks the hub to unregister the session. The
 * hub drops the session's close signal in response, which stops the other
 * loop. Queued events are not flushed once the close signal fires.
 *
 * The loops are generic over the transport so they run the same way over an
 * axum `WebSocket` and over in-memory channels in tests.
 */

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::backend::realtime::fanout::FanoutRouter;
use crate::backend::realtime::gateway::GatewayError;
use crate::backend::realtime::hub::{new_session, HubHandle, OutboundFrame, SessionId, SessionMailbox};
use crate::shared::messaging::UserId;
use crate::shared::{ClientCommand, HubConfig, InboundFrame};

/// Why a session loop stopped abnormally
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no frame received before the read deadline")]
    ReadTimeout,

    #[error("read failed: {0}")]
    Read(String),

    #[error("write did not complete before the write deadline")]
    WriteTimeout,

    #[error("write failed: {0}")]
    Write(String),
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Registered,
    Closing,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Connecting, SessionState::Registered)
                | (SessionState::Connecting, SessionState::Closed)
                | (SessionState::Registered, SessionState::Closing)
                | (SessionState::Closing, SessionState::Closed)
        )
    }
}

/// Identity and lifecycle state of one connection
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    state: SessionState,
}

impl Session {
    pub fn new(id: SessionId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            state: SessionState::Connecting,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`; returns false and leaves the state alone if illegal
    pub fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                "[Session] {} rejected transition {:?} -> {:?}",
                self.id,
                self.state,
                next
            );
            return false;
        }
        self.state = next;
        true
    }
}

/// Outcome of a finished session
#[derive(Debug)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub reader: Result<(), SessionError>,
    pub writer: Result<(), SessionError>,
    pub state: SessionState,
}

/// Register a session for `user_id` and run it until either side stops
///
/// Returns once both loops have exited and the session is unregistered.
pub async fn run_session<S, R, E>(
    sink: S,
    stream: R,
    user_id: UserId,
    hub: HubHandle,
    fanout: FanoutRouter,
    config: HubConfig,
) -> SessionReport
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display,
{
    let (entry, mailbox) = new_session(user_id, config.outbound_capacity);
    let mut session = Session::new(entry.id(), user_id);
    hub.register(entry);
    session.transition(SessionState::Registered);
    tracing::debug!("[Session] {} registered for user {}", session.id(), user_id);

    let SessionMailbox {
        outbound, closed, ..
    } = mailbox;
    let writer = tokio::spawn(send_loop(
        sink,
        outbound,
        closed.clone(),
        session.id(),
        hub.clone(),
        config.clone(),
    ));

    let reader = receive_loop(stream, closed, &session, &fanout, config.read_timeout).await;
    session.transition(SessionState::Closing);
    hub.unregister(session.id());

    let writer = match writer.await {
        Ok(result) => result,
        Err(e) => Err(SessionError::Write(format!("send loop aborted: {}", e))),
    };
    session.transition(SessionState::Closed);

    match (&reader, &writer) {
        (Ok(()), Ok(())) => {
            tracing::info!("[Session] {} closed (user {})", session.id(), user_id)
        }
        (Err(e), _) | (_, Err(e)) => tracing::debug!(
            "[Session] {} closed with error (user {}): {}",
            session.id(),
            user_id,
            e
        ),
    }

    SessionReport {
        session_id: session.id(),
        user_id,
        reader,
        writer,
        state: session.state(),
    }
}

async fn receive_loop<R, E>(
    mut stream: R,
    mut closed: watch::Receiver<()>,
    session: &Session,
    fanout: &FanoutRouter,
    read_timeout: Duration,
) -> Result<(), SessionError>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut deadline = Instant::now() + read_timeout;
    loop {
        let next = tokio::select! {
            biased;
            _ = closed.changed() => return Ok(()),
            next = tokio::time::timeout_at(deadline, stream.next()) => next,
        };

        let frame = match next {
            Err(_) => {
                tracing::warn!("[Session] {} read deadline passed", session.id());
                return Err(SessionError::ReadTimeout);
            }
            Ok(None) => return Ok(()),
            Ok(Some(Err(e))) => {
                tracing::warn!("[Session] {} read error: {}", session.id(), e);
                return Err(SessionError::Read(e.to_string()));
            }
            Ok(Some(Ok(frame))) => frame,
        };
        deadline = Instant::now() + read_timeout;

        match frame {
            Message::Text(text) => handle_text(session, fanout, text.as_str()).await,
            Message::Binary(data) => tracing::warn!(
                "[Session] {} sent a {} byte binary frame, ignoring",
                session.id(),
                data.len()
            ),
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Ok(()),
        }
    }
}

async fn handle_text(session: &Session, fanout: &FanoutRouter, text: &str) {
    let command = match InboundFrame::parse(text).and_then(InboundFrame::into_command) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("[Session] {} sent an invalid frame: {}", session.id(), e);
            return;
        }
    };

    match command {
        ClientCommand::SendMessage(payload) => {
            let conversation_id = payload.conversation_id;
            match fanout.handle_new_message(session.user_id(), payload).await {
                Ok(_) => {}
                Err(e @ GatewayError::NotParticipant { .. }) => {
                    tracing::warn!("[Session] {} message rejected: {}", session.id(), e)
                }
                Err(e) => tracing::error!(
                    "[Session] Failed to store message for conversation {}: {}",
                    conversation_id,
                    e
                ),
            }
        }
        ClientCommand::Typing { conversation_id } => {
            if let Err(e) = fanout.handle_typing(session.user_id(), conversation_id).await {
                tracing::warn!(
                    "[Session] Typing for conversation {} not delivered: {}",
                    conversation_id,
                    e
                );
            }
        }
        ClientCommand::Unknown(kind) => {
            tracing::debug!("[Session] {} ignoring frame type {:?}", session.id(), kind)
        }
    }
}

async fn send_loop<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<OutboundFrame>,
    mut closed: watch::Receiver<()>,
    session_id: SessionId,
    hub: HubHandle,
    config: HubConfig,
) -> Result<(), SessionError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let period = config.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            biased;
            _ = closed.changed() => {
                break close(&mut sink, config.write_timeout).await;
            }
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = write(&mut sink, Message::Text(text), config.write_timeout).await {
                        break Err(e);
                    }
                }
                None => break close(&mut sink, config.write_timeout).await,
            },
            _ = heartbeat.tick() => {
                if let Err(e) = write(&mut sink, Message::Ping(Default::default()), config.write_timeout).await {
                    break Err(e);
                }
            }
        }
    };

    if let Err(e) = &result {
        tracing::warn!("[Session] {} write error: {}", session_id, e);
    }
    hub.unregister(session_id);
    result
}

async fn write<S>(sink: &mut S, frame: Message, limit: Duration) -> Result<(), SessionError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match tokio::time::timeout(limit, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionError::Write(e.to_string())),
        Err(_) => Err(SessionError::WriteTimeout),
    }
}

/// Send a Close frame and shut the sink; the peer may already be gone
async fn close<S>(sink: &mut S, limit: Duration) -> Result<(), SessionError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    if let Err(e) = write(sink, Message::Close(None), limit).await {
        tracing::debug!("[Session] Close frame not delivered: {}", e);
        return Ok(());
    }
    let _ = tokio::time::timeout(limit, sink.close()).await;
    Ok(())
}
