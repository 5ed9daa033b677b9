//! Owners, product areas, their mappings and the support tickets resolved
//! against them.

use super::{
    connect, integer_or_null, parse_timestamp, real_or_null, returned_id, text_or_null,
    value_to_integer, value_to_real, value_to_text,
};
use crate::{
    errors::AssistantError,
    types::{OwnershipRecord, SenderType},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};
use turso::{params, params::Params, Connection, Database, Row, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub team: Option<String>,
    pub role: Option<String>,
}

impl TryFrom<&Row> for Owner {
    type Error = AssistantError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Owner {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            team: value_to_text(row.get_value(3)?),
            role: value_to_text(row.get_value(4)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductArea {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl TryFrom<&Row> for ProductArea {
    type Error = AssistantError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(ProductArea {
            id: row.get(0)?,
            name: row.get(1)?,
            description: value_to_text(row.get_value(2)?),
            category: value_to_text(row.get_value(3)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportTicket {
    pub id: i64,
    pub query_text: String,
    pub context: Option<String>,
    pub resolved_owner_id: Option<i64>,
    pub confidence_score: Option<f64>,
    pub supporting_context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for SupportTicket {
    type Error = AssistantError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let created_at: String = row.get(6)?;
        Ok(SupportTicket {
            id: row.get(0)?,
            query_text: row.get(1)?,
            context: value_to_text(row.get_value(2)?),
            resolved_owner_id: value_to_integer(row.get_value(3)?),
            confidence_score: value_to_real(row.get_value(4)?),
            supporting_context: value_to_text(row.get_value(5)?),
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

/// Which resolution path answered a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    Direct,
    Retrieval,
}

impl QuerySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuerySource::Direct => "direct",
            QuerySource::Retrieval => "retrieval",
        }
    }
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const OWNER_COLUMNS: &str = "id, name, email, team, role";
const AREA_COLUMNS: &str = "id, name, description, category";

pub async fn find_owner_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<Owner>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            &format!("SELECT {OWNER_COLUMNS} FROM owners WHERE email = ?"),
            params![email],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Owner::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Finds an owner by email, creating them from the given fields if absent.
///
/// An existing owner is returned unchanged.
pub async fn get_or_create_owner(
    db: &Database,
    name: &str,
    email: &str,
    team: Option<&str>,
    role: Option<&str>,
) -> Result<Owner, AssistantError> {
    if let Some(existing) = find_owner_by_email(db, email).await? {
        return Ok(existing);
    }

    let conn = connect(db)?;
    let rows = conn
        .query(
            "INSERT INTO owners (name, email, team, role) VALUES (?, ?, ?, ?) RETURNING id",
            Params::Positional(vec![
                Value::Text(name.to_string()),
                Value::Text(email.to_string()),
                text_or_null(team),
                text_or_null(role),
            ]),
        )
        .await?;
    let id = returned_id(rows, "owners").await?;
    debug!(owner_id = id, email, "Created owner.");

    Ok(Owner {
        id,
        name: name.to_string(),
        email: email.to_string(),
        team: team.map(str::to_string),
        role: role.map(str::to_string),
    })
}

pub async fn find_area_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<ProductArea>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            &format!("SELECT {AREA_COLUMNS} FROM product_areas WHERE name = ?"),
            params![name],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(ProductArea::try_from(&row)?)),
        None => Ok(None),
    }
}

pub async fn get_or_create_area(
    db: &Database,
    name: &str,
    description: Option<&str>,
    category: Option<&str>,
) -> Result<ProductArea, AssistantError> {
    if let Some(existing) = find_area_by_name(db, name).await? {
        return Ok(existing);
    }

    let conn = connect(db)?;
    let rows = conn
        .query(
            "INSERT INTO product_areas (name, description, category) VALUES (?, ?, ?) RETURNING id",
            Params::Positional(vec![
                Value::Text(name.to_string()),
                text_or_null(description),
                text_or_null(category),
            ]),
        )
        .await?;
    let id = returned_id(rows, "product_areas").await?;
    debug!(area_id = id, name, "Created product area.");

    Ok(ProductArea {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        category: category.map(str::to_string),
    })
}

pub async fn find_ownership(
    db: &Database,
    area_id: i64,
    owner_id: i64,
) -> Result<Option<i64>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            "SELECT id FROM ownerships WHERE area_id = ? AND owner_id = ?",
            params![area_id, owner_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

pub async fn create_ownership(
    db: &Database,
    area_id: i64,
    owner_id: i64,
    notes: Option<&str>,
) -> Result<i64, AssistantError> {
    insert_ownership(&connect(db)?, area_id, owner_id, notes).await
}

/// Inserts a mapping on `conn`, so callers can include it in a transaction.
pub(crate) async fn insert_ownership(
    conn: &Connection,
    area_id: i64,
    owner_id: i64,
    notes: Option<&str>,
) -> Result<i64, AssistantError> {
    let rows = conn
        .query(
            "INSERT INTO ownerships (area_id, owner_id, confidence, notes) VALUES (?, ?, 1.0, ?) RETURNING id",
            Params::Positional(vec![
                Value::Integer(area_id),
                Value::Integer(owner_id),
                text_or_null(notes),
            ]),
        )
        .await?;
    returned_id(rows, "ownerships").await
}

/// Returns the mapping id and whether this call created it.
pub async fn find_or_create_ownership(
    db: &Database,
    area_id: i64,
    owner_id: i64,
    notes: Option<&str>,
) -> Result<(i64, bool), AssistantError> {
    if let Some(id) = find_ownership(db, area_id, owner_id).await? {
        return Ok((id, false));
    }
    Ok((create_ownership(db, area_id, owner_id, notes).await?, true))
}

/// Every area/owner mapping, flattened for prompt context.
pub async fn list_ownership_records(db: &Database) -> Result<Vec<OwnershipRecord>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            "SELECT a.name, a.description, a.category, o.name, o.email, o.team, o.role
             FROM ownerships m
             JOIN product_areas a ON a.id = m.area_id
             JOIN owners o ON o.id = m.owner_id
             ORDER BY m.id",
            (),
        )
        .await?;

    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        records.push(OwnershipRecord {
            area_name: row.get(0)?,
            description: value_to_text(row.get_value(1)?),
            category: value_to_text(row.get_value(2)?),
            owner_name: row.get(3)?,
            owner_email: row.get(4)?,
            team: value_to_text(row.get_value(5)?),
            role: value_to_text(row.get_value(6)?),
        });
    }
    Ok(records)
}

pub async fn create_ticket(
    db: &Database,
    query_text: &str,
    context: Option<&str>,
) -> Result<i64, AssistantError> {
    let conn = connect(db)?;
    let rows = conn
        .query(
            "INSERT INTO support_tickets (query_text, context) VALUES (?, ?) RETURNING id",
            Params::Positional(vec![Value::Text(query_text.to_string()), text_or_null(context)]),
        )
        .await?;
    let id = returned_id(rows, "support_tickets").await?;
    info!(ticket_id = id, "Created support ticket.");
    Ok(id)
}

pub async fn resolve_ticket(
    db: &Database,
    ticket_id: i64,
    owner_id: Option<i64>,
    confidence_score: f64,
    supporting_context: Option<&str>,
) -> Result<(), AssistantError> {
    let conn = connect(db)?;
    conn.execute(
        "UPDATE support_tickets SET resolved_owner_id = ?, confidence_score = ?, supporting_context = ? WHERE id = ?",
        Params::Positional(vec![
            integer_or_null(owner_id),
            real_or_null(Some(confidence_score)),
            text_or_null(supporting_context),
            Value::Integer(ticket_id),
        ]),
    )
    .await?;
    Ok(())
}

pub async fn get_ticket(db: &Database, id: i64) -> Result<Option<SupportTicket>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            "SELECT id, query_text, context, resolved_owner_id, confidence_score, supporting_context, created_at FROM support_tickets WHERE id = ?",
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(SupportTicket::try_from(&row)?)),
        None => Ok(None),
    }
}

pub async fn append_ticket_messages(
    db: &Database,
    ticket_id: i64,
    messages: &[(SenderType, &str)],
) -> Result<(), AssistantError> {
    let conn = connect(db)?;
    conn.execute("BEGIN TRANSACTION", ()).await?;
    for (sender, content) in messages {
        if let Err(e) = conn
            .execute(
                "INSERT INTO ownership_messages (ticket_id, sender, content) VALUES (?, ?, ?)",
                params![ticket_id, sender.as_str(), content.to_string()],
            )
            .await
        {
            conn.execute("ROLLBACK", ()).await?;
            return Err(e.into());
        }
    }
    conn.execute("COMMIT", ()).await?;
    Ok(())
}

pub async fn list_ticket_messages(
    db: &Database,
    ticket_id: i64,
) -> Result<Vec<(SenderType, String)>, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query(
            "SELECT sender, content FROM ownership_messages WHERE ticket_id = ? ORDER BY id",
            params![ticket_id],
        )
        .await?;
    let mut messages = Vec::new();
    while let Some(row) = rows.next().await? {
        let sender: String = row.get(0)?;
        let sender = sender
            .parse()
            .map_err(AssistantError::StorageOperationFailed)?;
        messages.push((sender, row.get(1)?));
    }
    Ok(messages)
}

pub async fn record_query_history(
    db: &Database,
    query_text: &str,
    resolved_owner_id: Option<i64>,
    confidence_score: f64,
    source: QuerySource,
) -> Result<(), AssistantError> {
    let conn = connect(db)?;
    conn.execute(
        "INSERT INTO query_history (query_text, resolved_owner_id, confidence_score, source) VALUES (?, ?, ?, ?)",
        Params::Positional(vec![
            Value::Text(query_text.to_string()),
            integer_or_null(resolved_owner_id),
            Value::Real(confidence_score),
            Value::Text(source.as_str().to_string()),
        ]),
    )
    .await?;
    debug!(%source, "Recorded query history.");
    Ok(())
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

    #[tokio::test]
    async fn test_get_or_create_owner_is_keyed_by_email() {
        let db = setup().await;
        let first = get_or_create_owner(&db, "Jane Doe", "jane@example.com", Some("Product"), None)
            .await
            .unwrap();
        let second = get_or_create_owner(&db, "J. Doe", "jane@example.com", None, Some("PM"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Jane Doe");
        assert_eq!(second.team.as_deref(), Some("Product"));
        assert!(second.role.is_none());
    }

    #[tokio::test]
    async fn test_mapping_is_created_once_and_listed() {
        let db = setup().await;
        let owner = get_or_create_owner(&db, "Jane Doe", "jane@example.com", None, None)
            .await
            .unwrap();
        let area = get_or_create_area(&db, "Search", Some("Search features"), None)
            .await
            .unwrap();

        let (id, created) = find_or_create_ownership(&db, area.id, owner.id, None)
            .await
            .unwrap();
        assert!(created);
        let (again, created_again) = find_or_create_ownership(&db, area.id, owner.id, Some("dup"))
            .await
            .unwrap();
        assert_eq!(id, again);
        assert!(!created_again);

        let records = list_ownership_records(&db).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].area_name, "Search");
        assert_eq!(records[0].owner_email, "jane@example.com");
        assert_eq!(records[0].description.as_deref(), Some("Search features"));
    }

    #[tokio::test]
    async fn test_ticket_resolution_and_messages() {
        let db = setup().await;
        let ticket_id = create_ticket(&db, "Who owns search?", None).await.unwrap();
        let ticket = get_ticket(&db, ticket_id).await.unwrap().unwrap();
        assert!(ticket.resolved_owner_id.is_none());
        assert!(ticket.confidence_score.is_none());

        resolve_ticket(&db, ticket_id, Some(7), 0.9, Some("PM for search"))
            .await
            .unwrap();
        append_ticket_messages(
            &db,
            ticket_id,
            &[(SenderType::User, "Who owns search?"), (SenderType::Assistant, "{}")],
        )
        .await
        .unwrap();

        let ticket = get_ticket(&db, ticket_id).await.unwrap().unwrap();
        assert_eq!(ticket.resolved_owner_id, Some(7));
        assert_eq!(ticket.confidence_score, Some(0.9));
        assert_eq!(ticket.supporting_context.as_deref(), Some("PM for search"));

        let messages = list_ticket_messages(&db, ticket_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, SenderType::User);
        assert_eq!(messages[1].1, "{}");
    }
}
