//! # SQLite Schema
//!
//! Table definitions for both assistants. Each statement is idempotent so the
//! whole list can run on every startup.

pub const CREATE_SESSION_THREADS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS session_threads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        role_raw TEXT NOT NULL,
        industry_raw TEXT NOT NULL,
        pains_raw TEXT NOT NULL,
        role_normalized TEXT,
        onet_code TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

pub const CREATE_CHAT_MESSAGES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id INTEGER NOT NULL,
        sender TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (thread_id) REFERENCES session_threads(id) ON DELETE CASCADE
    );
";

pub const CREATE_RECOMMENDATIONS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS recommendations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id INTEGER NOT NULL,
        item TEXT NOT NULL,
        rationale TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT 'General',
        estimated_gain_minutes INTEGER NOT NULL DEFAULT 0,
        difficulty TEXT NOT NULL DEFAULT 'medium',
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (thread_id) REFERENCES session_threads(id) ON DELETE CASCADE
    );
";

pub const CREATE_OWNERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS owners (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        team TEXT,
        role TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

pub const CREATE_PRODUCT_AREAS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS product_areas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        category TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

pub const CREATE_OWNERSHIPS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS ownerships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        area_id INTEGER NOT NULL,
        owner_id INTEGER NOT NULL,
        confidence REAL NOT NULL DEFAULT 1.0,
        notes TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (area_id) REFERENCES product_areas(id) ON DELETE CASCADE,
        FOREIGN KEY (owner_id) REFERENCES owners(id) ON DELETE CASCADE
    );
";

pub const CREATE_SUPPORT_TICKETS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS support_tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        query_text TEXT NOT NULL,
        context TEXT,
        resolved_owner_id INTEGER,
        confidence_score REAL,
        supporting_context TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

pub const CREATE_OWNERSHIP_MESSAGES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS ownership_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticket_id INTEGER NOT NULL,
        sender TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (ticket_id) REFERENCES support_tickets(id) ON DELETE CASCADE
    );
";

pub const CREATE_QUERY_HISTORY_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS query_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        query_text TEXT NOT NULL,
        resolved_owner_id INTEGER,
        confidence_score REAL NOT NULL DEFAULT 0.0,
        source TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

pub const CREATE_KNOWLEDGE_DOCUMENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS knowledge_documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        source TEXT NOT NULL,
        source_id TEXT,
        metadata TEXT,
        embedding_id TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

/// Parents come before children so foreign keys always resolve.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_SESSION_THREADS_TABLE,
    CREATE_CHAT_MESSAGES_TABLE,
    CREATE_RECOMMENDATIONS_TABLE,
    CREATE_OWNERS_TABLE,
    CREATE_PRODUCT_AREAS_TABLE,
    CREATE_OWNERSHIPS_TABLE,
    CREATE_SUPPORT_TICKETS_TABLE,
    CREATE_OWNERSHIP_MESSAGES_TABLE,
    CREATE_QUERY_HISTORY_TABLE,
    CREATE_KNOWLEDGE_DOCUMENTS_TABLE,
];
