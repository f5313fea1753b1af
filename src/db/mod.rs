//! Database module: the `student` table and its storage worker.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for the roster table (PostgreSQL)
//! - `postgres.rs`: pooled storage worker

pub mod models;
pub mod postgres;
pub mod schema;

pub use models::{NewStudent, Student};
pub use postgres::{PgPool, StudentStorage};
pub use schema::{POSTGRES_DROP, POSTGRES_INIT};
