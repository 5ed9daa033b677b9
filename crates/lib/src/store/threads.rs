//! Anti-To-Do threads, their messages and recommendations.

use super::{connect, parse_timestamp, returned_id, text_or_null, value_to_text};
use crate::{
    errors::AssistantError,
    types::{Difficulty, RecommendationItem, SenderType},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use turso::{params, params::Params, Connection, Database, Row, Value};

/// An onboarding session and the conversation hanging off it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionThread {
    pub id: i64,
    pub role_raw: String,
    pub industry_raw: String,
    pub pains_raw: String,
    pub role_normalized: Option<String>,
    pub onet_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for SessionThread {
    type Error = AssistantError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let created_at: String = row.get(6)?;
        Ok(SessionThread {
            id: row.get(0)?,
            role_raw: row.get(1)?,
            industry_raw: row.get(2)?,
            pains_raw: row.get(3)?,
            role_normalized: value_to_text(row.get_value(4)?),
            onet_code: value_to_text(row.get_value(5)?),
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMessage {
    pub id: i64,
    pub thread_id: i64,
    pub sender: SenderType,
    pub content: String,
}

impl TryFrom<&Row> for StoredMessage {
    type Error = AssistantError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let sender: String = row.get(2)?;
        Ok(StoredMessage {
            id: row.get(0)?,
            thread_id: row.get(1)?,
            sender: sender
                .parse()
                .map_err(AssistantError::StorageOperationFailed)?,
            content: row.get(3)?,
        })
    }
}

impl TryFrom<&Row> for RecommendationItem {
    type Error = AssistantError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let difficulty: String = row.get(4)?;
        Ok(RecommendationItem {
            item: row.get(0)?,
            rationale: row.get(1)?,
            category: row.get(2)?,
            estimated_gain_minutes: row.get(3)?,
            difficulty: difficulty
                .parse::<Difficulty>()
                .map_err(AssistantError::StorageOperationFailed)?,
        })
    }
}

/// The fields captured at onboarding.
#[derive(Debug, Clone)]
pub struct NewThread<'a> {
    pub role_raw: &'a str,
    pub industry_raw: &'a str,
    pub pains_raw: &'a str,
    pub role_normalized: Option<&'a str>,
    pub onet_code: Option<&'a str>,
}

const THREAD_COLUMNS: &str =
    "id, role_raw, industry_raw, pains_raw, role_normalized, onet_code, created_at";

pub async fn create_thread(
    db: &Database,
    thread: NewThread<'_>,
) -> Result<SessionThread, AssistantError> {
    let id = insert_thread(&connect(db)?, &thread).await?;
    info!(thread_id = id, "Created session thread.");
    fetch_created(db, id).await
}

/// Creates a thread and its opening messages in one transaction, so a thread
/// never exists without them.
pub async fn create_thread_with_messages(
    db: &Database,
    thread: NewThread<'_>,
    messages: &[(SenderType, &str)],
) -> Result<SessionThread, AssistantError> {
    let conn = connect(db)?;
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let written = async {
        let id = insert_thread(&conn, &thread).await?;
        insert_messages(&conn, id, messages).await?;
        Ok::<_, AssistantError>(id)
    }
    .await;

    let id = match written {
        Ok(id) => {
            conn.execute("COMMIT", ()).await?;
            id
        }
        Err(e) => {
            conn.execute("ROLLBACK", ()).await?;
            return Err(e);
        }
    };
    info!(thread_id = id, messages = messages.len(), "Created session thread.");
    fetch_created(db, id).await
}

async fn insert_thread(conn: &Connection, thread: &NewThread<'_>) -> Result<i64, AssistantError> {
    let rows = conn
        .query(
            "INSERT INTO session_threads (role_raw, industry_raw, pains_raw, role_normalized, onet_code) VALUES (?, ?, ?, ?, ?) RETURNING id",
            Params::Positional(vec![
                Value::Text(thread.role_raw.to_string()),
                Value::Text(thread.industry_raw.to_string()),
                Value::Text(thread.pains_raw.to_string()),
                text_or_null(thread.role_normalized),
                text_or_null(thread.onet_code),
            ]),
        )
        .await?;
    returned_id(rows, "session_threads").await
}

async fn fetch_created(db: &Database, id: i64) -> Result<SessionThread, AssistantError> {
    get_thread(db, id)
        .await?
        .ok_or_else(|| AssistantError::NotFound(format!("Thread {id}")))
}

pub async fn get_thread(db: &Database, id: i64) -> Result<Option<SessionThread>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            &format!("SELECT {THREAD_COLUMNS} FROM session_threads WHERE id = ?"),
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(SessionThread::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Appends messages to a thread atomically, in the given order.
pub async fn append_messages(
    db: &Database,
    thread_id: i64,
    messages: &[(SenderType, &str)],
) -> Result<(), AssistantError> {
    if messages.is_empty() {
        return Ok(());
    }
    let conn = connect(db)?;
    conn.execute("BEGIN TRANSACTION", ()).await?;

    if let Err(e) = insert_messages(&conn, thread_id, messages).await {
        conn.execute("ROLLBACK", ()).await?;
        return Err(e);
    }

    conn.execute("COMMIT", ()).await?;
    debug!(thread_id, count = messages.len(), "Appended chat messages.");
    Ok(())
}

async fn insert_messages(
    conn: &Connection,
    thread_id: i64,
    messages: &[(SenderType, &str)],
) -> Result<(), AssistantError> {
    for (sender, content) in messages {
        conn.execute(
            "INSERT INTO chat_messages (thread_id, sender, content) VALUES (?, ?, ?)",
            params![thread_id, sender.as_str(), content.to_string()],
        )
        .await?;
    }
    Ok(())
}

pub async fn append_message(
    db: &Database,
    thread_id: i64,
    sender: SenderType,
    content: &str,
) -> Result<(), AssistantError> {
    append_messages(db, thread_id, &[(sender, content)]).await
}

/// Returns the `limit` most recent messages of a thread, oldest first.
///
/// Insertion order (`id`) decides recency, so messages written within the
/// same second keep their order.
pub async fn recent_messages(
    db: &Database,
    thread_id: i64,
    limit: usize,
) -> Result<Vec<StoredMessage>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            &format!(
                "SELECT id, thread_id, sender, content FROM chat_messages WHERE thread_id = ? ORDER BY id DESC LIMIT {limit}"
            ),
            params![thread_id],
        )
        .await?;

    let mut messages = Vec::new();
    while let Some(row) = rows.next().await? {
        messages.push(StoredMessage::try_from(&row)?);
    }
    messages.reverse();
    Ok(messages)
}

pub async fn insert_recommendations(
    db: &Database,
    thread_id: i64,
    items: &[RecommendationItem],
) -> Result<(), AssistantError> {
    if items.is_empty() {
        return Ok(());
    }
    let conn = connect(db)?;
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for item in items {
        if let Err(e) = conn
            .execute(
                "INSERT INTO recommendations (thread_id, item, rationale, category, estimated_gain_minutes, difficulty) VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    thread_id,
                    item.item.clone(),
                    item.rationale.clone(),
                    item.category.clone(),
                    item.estimated_gain_minutes,
                    item.difficulty.as_str()
                ],
            )
            .await
        {
            conn.execute("ROLLBACK", ()).await?;
            return Err(e.into());
        }
    }

    conn.execute("COMMIT", ()).await?;
    info!(thread_id, count = items.len(), "Stored recommendations.");
    Ok(())
}

pub async fn list_recommendations(
    db: &Database,
    thread_id: i64,
) -> Result<Vec<RecommendationItem>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            "SELECT item, rationale, category, estimated_gain_minutes, difficulty FROM recommendations WHERE thread_id = ? ORDER BY id",
            params![thread_id],
        )
        .await?;

    let mut items = Vec::new();
    while let Some(row) = rows.next().await? {
        items.push(RecommendationItem::try_from(&row)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::db::sqlite::SqliteProvider;

    async fn setup() -> Database {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        provider.db
    }

    fn new_thread() -> NewThread<'static> {
        NewThread {
            role_raw: "pm",
            industry_raw: "SaaS",
            pains_raw: "meetings",
            role_normalized: Some("Product Manager"),
            onet_code: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_thread() {
        let db = setup().await;
        let created = create_thread(&db, new_thread()).await.unwrap();
        let fetched = get_thread(&db, created.id).await.unwrap().unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.role_normalized.as_deref(), Some("Product Manager"));
        assert!(fetched.onet_code.is_none());
        assert!(get_thread(&db, created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_thread_with_messages_is_all_or_nothing() {
        let db = setup().await;
        let thread = create_thread_with_messages(
            &db,
            new_thread(),
            &[(SenderType::System, "ready"), (SenderType::User, "hi")],
        )
        .await
        .unwrap();
        assert_eq!(recent_messages(&db, thread.id, 12).await.unwrap().len(), 2);

        let conn = db.connect().unwrap();
        conn.execute("DROP TABLE chat_messages", ()).await.unwrap();
        let result =
            create_thread_with_messages(&db, new_thread(), &[(SenderType::System, "ready")]).await;
        assert!(result.is_err());
        assert!(get_thread(&db, thread.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_messages_window_is_chronological() {
        let db = setup().await;
        let thread = create_thread(&db, new_thread()).await.unwrap();
        for i in 0..15 {
            append_message(&db, thread.id, SenderType::User, &format!("msg {i}"))
                .await
                .unwrap();
        }

        let window = recent_messages(&db, thread.id, 12).await.unwrap();
        let contents: Vec<_> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents.len(), 12);
        assert_eq!(contents.first(), Some(&"msg 3"));
        assert_eq!(contents.last(), Some(&"msg 14"));
    }

    #[tokio::test]
    async fn test_recommendations_round_trip_in_order() {
        let db = setup().await;
        let thread = create_thread(&db, new_thread()).await.unwrap();
        let items = vec![
            RecommendationItem {
                item: "Draft documents".into(),
                rationale: "PRDs".into(),
                category: "Documents & Writing".into(),
                estimated_gain_minutes: 60,
                difficulty: Difficulty::Low,
            },
            RecommendationItem {
                item: "Triage bugs".into(),
                rationale: String::new(),
                category: "Building".into(),
                estimated_gain_minutes: 0,
                difficulty: Difficulty::High,
            },
        ];
        insert_recommendations(&db, thread.id, &items).await.unwrap();

        assert_eq!(list_recommendations(&db, thread.id).await.unwrap(), items);
    }
}
