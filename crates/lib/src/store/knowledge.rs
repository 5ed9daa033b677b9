use super::{connect, ownership::insert_ownership, returned_id, text_or_null};
use crate::errors::AssistantError;
use serde_json::Value as JsonValue;
use tracing::debug;
use turso::{params::Params, Connection, Database, Value};

/// A piece of ingested knowledge and the vector-store entry it produced.
#[derive(Debug, Clone)]
pub struct NewKnowledgeDocument<'a> {
    pub content: &'a str,
    pub source: &'a str,
    pub metadata: Option<&'a JsonValue>,
    pub embedding_id: Option<&'a str>,
}

/// Stable identifier for a document body.
pub fn content_hash(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

pub async fn insert_knowledge_document(
    db: &Database,
    doc: NewKnowledgeDocument<'_>,
) -> Result<i64, AssistantError> {
    insert_document(&connect(db)?, doc).await
}

async fn insert_document(
    conn: &Connection,
    doc: NewKnowledgeDocument<'_>,
) -> Result<i64, AssistantError> {
    let metadata = doc.metadata.map(JsonValue::to_string);
    let rows = conn
        .query(
            "INSERT INTO knowledge_documents (content, source, source_id, metadata, embedding_id) VALUES (?, ?, ?, ?, ?) RETURNING id",
            Params::Positional(vec![
                Value::Text(doc.content.to_string()),
                Value::Text(doc.source.to_string()),
                Value::Text(content_hash(doc.content)),
                text_or_null(metadata.as_deref()),
                text_or_null(doc.embedding_id),
            ]),
        )
        .await?;
    returned_id(rows, "knowledge_documents").await
}

/// Writes an ownership mapping and the knowledge document describing it in
/// one transaction. Either both rows exist afterwards or neither does.
///
/// Returns the ids of the mapping and the document.
pub async fn create_ownership_with_document(
    db: &Database,
    area_id: i64,
    owner_id: i64,
    notes: Option<&str>,
    doc: NewKnowledgeDocument<'_>,
) -> Result<(i64, i64), AssistantError> {
    let conn = connect(db)?;
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let written = async {
        let ownership_id = insert_ownership(&conn, area_id, owner_id, notes).await?;
        let document_id = insert_document(&conn, doc).await?;
        Ok::<_, AssistantError>((ownership_id, document_id))
    }
    .await;

    match written {
        Ok(ids) => {
            conn.execute("COMMIT", ()).await?;
            debug!(area_id, owner_id, "Recorded ownership mapping with its document.");
            Ok(ids)
        }
        Err(e) => {
            conn.execute("ROLLBACK", ()).await?;
            Err(e)
        }
    }
}

pub async fn count_knowledge_documents(db: &Database) -> Result<i64, AssistantError> {
    let conn = connect(db)?;
    let mut rows = conn
        .query("SELECT COUNT(*) FROM knowledge_documents", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::db::sqlite::SqliteProvider;
    use serde_json::json;

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        let metadata = json!({"source": "product_matrix"});

        let id = insert_knowledge_document(
            &provider.db,
            NewKnowledgeDocument {
                content: "Product Area: Search",
                source: "product_matrix",
                metadata: Some(&metadata),
                embedding_id: Some("vec-1"),
            },
        )
        .await
        .unwrap();

        assert!(id > 0);
        assert_eq!(count_knowledge_documents(&provider.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mapping_rolls_back_when_document_insert_fails() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        let conn = provider.db.connect().unwrap();
        conn.execute("INSERT INTO owners (name, email) VALUES ('Jane', 'jane@example.com')", ())
            .await
            .unwrap();
        conn.execute("INSERT INTO product_areas (name) VALUES ('Search')", ())
            .await
            .unwrap();
        conn.execute("DROP TABLE knowledge_documents", ())
            .await
            .unwrap();

        let doc = NewKnowledgeDocument {
            content: "Product Area: Search",
            source: "product_matrix",
            metadata: None,
            embedding_id: Some("vec-1"),
        };
        let result = create_ownership_with_document(&provider.db, 1, 1, None, doc.clone()).await;
        assert!(result.is_err());

        let mut rows = conn.query("SELECT COUNT(*) FROM ownerships", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0);

        provider.initialize_schema().await.unwrap();
        let (ownership_id, document_id) =
            create_ownership_with_document(&provider.db, 1, 1, None, doc)
                .await
                .unwrap();
        assert!(ownership_id > 0 && document_id > 0);
        assert_eq!(count_knowledge_documents(&provider.db).await.unwrap(), 1);
    }
}
