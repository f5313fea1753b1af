//! SQL DDL for the roster table.

/// PostgreSQL schema:
/// - `id` SERIAL PRIMARY KEY
/// - `group` is a reserved word and stays quoted everywhere
pub const POSTGRES_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS student (
    id SERIAL PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    "group" INTEGER NOT NULL
)
"#;

pub const POSTGRES_DROP: &str = "DROP TABLE IF EXISTS student";
