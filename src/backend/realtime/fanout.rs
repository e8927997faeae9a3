/**
 * Fanout Router
 *
 * Turns decoded client commands into persisted records and hub dispatches.
 *
 * # Message Flow
 *
 * 1. Commit the message through the gateway (participants only)
 * 2. Look up the conversation's current participants
 * 3. Dispatch a `new_message` event to every participant, sender included
 *
 * Step 3 never runs unless steps 1 and 2 succeeded, so no recipient ever
 * sees a message that is not in the store. Typing indicators skip the store
 * and go to every participant except the typing user.
 *
 * # Presence
 *
 * The hub produces presence changes in order; `spawn_presence_writer` applies
 * them to the store one at a time on its own task so the hub never waits on
 * the database.
 */

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::backend::realtime::gateway::{ChatGateway, GatewayError};
use crate::backend::realtime::hub::{HubHandle, PresenceUpdate};
use crate::shared::messaging::{ConversationId, MessageRecord, UserId};
use crate::shared::{MessagePayload, PresenceStatus, RealtimeEvent};

/// Routes client commands to the store and the hub
#[derive(Clone)]
pub struct FanoutRouter {
    gateway: Arc<dyn ChatGateway>,
    hub: HubHandle,
}

impl FanoutRouter {
    pub fn new(gateway: Arc<dyn ChatGateway>, hub: HubHandle) -> Self {
        Self { gateway, hub }
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Persist a message and notify every participant
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the write or the participant lookup
    /// fails. Nothing is dispatched in that case.
    pub async fn handle_new_message(
        &self,
        sender_id: UserId,
        payload: MessagePayload,
    ) -> Result<MessageRecord, GatewayError> {
        let conversation_id = payload.conversation_id;
        let record = self
            .gateway
            .create_message(payload.with_sender(sender_id))
            .await?;
        let participants = self
            .gateway
            .conversation_participants(conversation_id)
            .await?;

        tracing::debug!(
            "[Fanout] Message {} in conversation {} -> {} participants",
            record.id,
            conversation_id,
            participants.len()
        );
        self.hub
            .dispatch(RealtimeEvent::new_message(record.clone()), participants);
        Ok(record)
    }

    /// Notify the other participants that `sender_id` is typing
    pub async fn handle_typing(
        &self,
        sender_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<(), GatewayError> {
        let participants = self
            .gateway
            .conversation_participants(conversation_id)
            .await?;
        if !participants.contains(&sender_id) {
            tracing::debug!(
                "[Fanout] Ignoring typing from user {} outside conversation {}",
                sender_id,
                conversation_id
            );
            return Ok(());
        }

        let targets: Vec<UserId> = participants
            .into_iter()
            .filter(|user_id| *user_id != sender_id)
            .collect();
        self.hub
            .dispatch(RealtimeEvent::typing(conversation_id, sender_id), targets);
        Ok(())
    }
}

/// Persist one presence change, logging instead of failing
pub async fn record_presence(
    gateway: &dyn ChatGateway,
    user_id: UserId,
    status: PresenceStatus,
    at: DateTime<Utc>,
) {
    match gateway.set_user_presence(user_id, status, at).await {
        Ok(()) => tracing::debug!("[Fanout] User {} marked {}", user_id, status),
        Err(e) => tracing::warn!(
            "[Fanout] Failed to mark user {} {}: {}",
            user_id,
            status,
            e
        ),
    }
}

/// Start the task that applies the hub's presence changes in order
pub fn spawn_presence_writer(gateway: Arc<dyn ChatGateway>) -> mpsc::UnboundedSender<PresenceUpdate> {
    let (tx, mut rx) = mpsc::unbounded_channel::<PresenceUpdate>();
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            record_presence(gateway.as_ref(), update.user_id, update.status, update.at).await;
        }
        tracing::debug!("[Fanout] Presence writer stopped");
    });
    tx
}
