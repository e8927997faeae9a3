//! Database operations for conversations and messages
//!
//! Participant lookups here are the authority the realtime path relies on:
//! `participant_ids` is read fresh for every fanout and `create_message`
//! refuses senders that are not members.

use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::{HashMap, HashSet};

use crate::shared::messaging::{
    Conversation, ConversationId, ConversationType, MessageRecord, NewMessage, UserId,
    UserSummary,
};

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.conversation_id, m.sender_id, m.content, m.message_type, m.status,
           m.media_url, m.reply_to_id, m.created_at, m.updated_at,
           u.username AS sender_username, u.avatar AS sender_avatar, u.status AS sender_status
    FROM messages m
    JOIN users u ON u.id = m.sender_id
"#;

fn message_from_row(row: &PgRow) -> MessageRecord {
    let sender_id: UserId = row.get("sender_id");
    MessageRecord {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id,
        sender: Some(UserSummary {
            id: sender_id,
            username: row.get("sender_username"),
            avatar: row.get("sender_avatar"),
            status: row.get("sender_status"),
        }),
        content: row.get("content"),
        message_type: row
            .get::<String, _>("message_type")
            .parse()
            .unwrap_or_default(),
        status: row.get::<String, _>("status").parse().unwrap_or_default(),
        media_url: row.get("media_url"),
        reply_to_id: row.get("reply_to_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn summary_from_row(row: &PgRow) -> UserSummary {
    UserSummary {
        id: row.get("id"),
        username: row.get("username"),
        avatar: row.get("avatar"),
        status: row.get("status"),
    }
}

/// Find the direct conversation between two users, if one exists
pub async fn find_direct_conversation(
    pool: &PgPool,
    user_a: UserId,
    user_b: UserId,
) -> Result<Option<ConversationId>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT c.id
        FROM conversations c
        JOIN conversation_participants p1 ON p1.conversation_id = c.id
        JOIN conversation_participants p2 ON p2.conversation_id = c.id
        WHERE c.conversation_type = 'direct'
          AND p1.user_id = $1
          AND p2.user_id = $2
        ORDER BY c.id
        LIMIT 1
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("id")))
}

/// Create a conversation with the creator and the given members
///
/// Member ids that do not name an existing user are skipped.
pub async fn create_conversation(
    pool: &PgPool,
    created_by: UserId,
    conversation_type: ConversationType,
    name: Option<&str>,
    members: &[UserId],
) -> Result<ConversationId, sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let conversation_id: ConversationId = sqlx::query_scalar(
        r#"
        INSERT INTO conversations (conversation_type, name, created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id
        "#,
    )
    .bind(conversation_type.as_str())
    .bind(name)
    .bind(created_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let mut member_ids: Vec<UserId> = Vec::with_capacity(members.len() + 1);
    member_ids.push(created_by);
    member_ids.extend(members.iter().copied().filter(|id| *id != created_by));

    sqlx::query(
        r#"
        INSERT INTO conversation_participants (conversation_id, user_id, joined_at)
        SELECT $1, id, $3 FROM users WHERE id = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(conversation_id)
    .bind(&member_ids)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(
        "[Conversations] User {} created {} conversation {}",
        created_by,
        conversation_type,
        conversation_id
    );
    Ok(conversation_id)
}

/// Load a conversation with its participants
pub async fn get_conversation(
    pool: &PgPool,
    conversation_id: ConversationId,
) -> Result<Option<Conversation>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, conversation_type, name, avatar, created_by, created_at, updated_at
        FROM conversations
        WHERE id = $1
        "#,
    )
    .bind(conversation_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut conversation = conversation_from_row(&row);
    conversation.participants = participants(pool, conversation_id).await?;
    Ok(Some(conversation))
}

fn conversation_from_row(row: &PgRow) -> Conversation {
    Conversation {
        id: row.get("id"),
        conversation_type: row
            .get::<String, _>("conversation_type")
            .parse()
            .unwrap_or(ConversationType::Group),
        name: row.get("name"),
        avatar: row.get("avatar"),
        created_by: row.get("created_by"),
        participants: Vec::new(),
        last_message: None,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Participant profiles of one conversation
pub async fn participants(
    pool: &PgPool,
    conversation_id: ConversationId,
) -> Result<Vec<UserSummary>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.username, u.avatar, u.status
        FROM conversation_participants p
        JOIN users u ON u.id = p.user_id
        WHERE p.conversation_id = $1
        ORDER BY u.id
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(summary_from_row).collect())
}

/// Every conversation the user belongs to, most recently active first
///
/// Each conversation carries its participants and its latest message.
pub async fn list_conversations_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<Conversation>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.conversation_type, c.name, c.avatar, c.created_by, c.created_at, c.updated_at
        FROM conversations c
        JOIN conversation_participants p ON p.conversation_id = c.id
        WHERE p.user_id = $1
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut conversations: Vec<Conversation> = rows.iter().map(conversation_from_row).collect();
    if conversations.is_empty() {
        return Ok(conversations);
    }
    let ids: Vec<ConversationId> = conversations.iter().map(|c| c.id).collect();

    let participant_rows = sqlx::query(
        r#"
        SELECT p.conversation_id, u.id, u.username, u.avatar, u.status
        FROM conversation_participants p
        JOIN users u ON u.id = p.user_id
        WHERE p.conversation_id = ANY($1)
        ORDER BY u.id
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_conversation: HashMap<ConversationId, Vec<UserSummary>> = HashMap::new();
    for row in &participant_rows {
        by_conversation
            .entry(row.get("conversation_id"))
            .or_default()
            .push(summary_from_row(row));
    }

    let latest_rows = latest_messages(pool, &ids).await?;
    let mut latest: HashMap<ConversationId, MessageRecord> = latest_rows
        .iter()
        .map(message_from_row)
        .map(|m| (m.conversation_id, m))
        .collect();

    for conversation in &mut conversations {
        conversation.participants = by_conversation.remove(&conversation.id).unwrap_or_default();
        conversation.last_message = latest.remove(&conversation.id);
    }
    Ok(conversations)
}

async fn latest_messages(
    pool: &PgPool,
    ids: &[ConversationId],
) -> Result<Vec<PgRow>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT DISTINCT ON (m.conversation_id)
               m.id, m.conversation_id, m.sender_id, m.content, m.message_type, m.status,
               m.media_url, m.reply_to_id, m.created_at, m.updated_at,
               u.username AS sender_username, u.avatar AS sender_avatar, u.status AS sender_status
        FROM messages m
        JOIN users u ON u.id = m.sender_id
        WHERE m.conversation_id = ANY($1) AND m.deleted_at IS NULL
        ORDER BY m.conversation_id, m.created_at DESC, m.id DESC
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Whether the user belongs to the conversation
pub async fn is_participant(
    pool: &PgPool,
    conversation_id: ConversationId,
    user_id: UserId,
) -> Result<bool, sqlx::Error> {
    let member: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM conversation_participants
            WHERE conversation_id = $1 AND user_id = $2
        )
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(member)
}

/// All live messages of a conversation, oldest first
pub async fn list_messages(
    pool: &PgPool,
    conversation_id: ConversationId,
) -> Result<Vec<MessageRecord>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        {MESSAGE_SELECT}
        WHERE m.conversation_id = $1 AND m.deleted_at IS NULL
        ORDER BY m.created_at ASC, m.id ASC
        "#
    ))
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(message_from_row).collect())
}

/// Ids of the conversation's current members
pub async fn participant_ids(
    pool: &PgPool,
    conversation_id: ConversationId,
) -> Result<HashSet<UserId>, sqlx::Error> {
    let ids: Vec<UserId> = sqlx::query_scalar(
        r#"
        SELECT user_id FROM conversation_participants
        WHERE conversation_id = $1
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().collect())
}

/// Store a message from a participant
///
/// Returns `None` without writing anything when the sender is not a member
/// of the conversation. On success the conversation's `updated_at` is bumped
/// in the same transaction and the stored record comes back with its sender
/// summary.
pub async fn create_message(
    pool: &PgPool,
    message: &NewMessage,
) -> Result<Option<MessageRecord>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let member: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM conversation_participants
            WHERE conversation_id = $1 AND user_id = $2
        )
        "#,
    )
    .bind(message.conversation_id)
    .bind(message.sender_id)
    .fetch_one(&mut *tx)
    .await?;
    if !member {
        tx.rollback().await?;
        return Ok(None);
    }

    let now = Utc::now();
    let message_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO messages (conversation_id, sender_id, content, message_type, status, reply_to_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'sent', $5, $6, $6)
        RETURNING id
        "#,
    )
    .bind(message.conversation_id)
    .bind(message.sender_id)
    .bind(&message.content)
    .bind(message.message_type.as_str())
    .bind(message.reply_to_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE conversations SET updated_at = $1 WHERE id = $2
        "#,
    )
    .bind(now)
    .bind(message.conversation_id)
    .execute(&mut *tx)
    .await?;

    let row = sqlx::query(&format!("{MESSAGE_SELECT} WHERE m.id = $1"))
        .bind(message_id)
        .fetch_one(&mut *tx)
        .await?;
    let record = message_from_row(&row);

    tx.commit().await?;
    Ok(Some(record))
}
