use crate::db::models::{NewStudent, Student};
use crate::db::schema::{POSTGRES_DROP, POSTGRES_INIT};
use crate::error::DeskError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::debug;

pub type PgPool = Pool<Postgres>;

#[derive(Clone)]
pub struct StudentStorage {
    pool: PgPool,
}

impl StudentStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool that connects on first use, so the server starts even
    /// while the database is down.
    pub fn connect_lazy(opts: PgConnectOptions, acquire_timeout: Duration) -> Self {
        let pool = PgPoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(opts);
        Self::new(pool)
    }

    pub async fn create_schema(&self) -> Result<(), DeskError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(POSTGRES_INIT).execute(&mut *tx).await?;
        tx.commit().await?;
        debug!("student schema created");
        Ok(())
    }

    pub async fn drop_schema(&self) -> Result<(), DeskError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(POSTGRES_DROP).execute(&mut *tx).await?;
        tx.commit().await?;
        debug!("student schema dropped");
        Ok(())
    }

    /// Insert one student. Returns the generated id.
    pub async fn insert_student(&self, student: NewStudent) -> Result<i32, DeskError> {
        let mut tx = self.pool.begin().await?;
        let rec: (i32,) = sqlx::query_as(
            r#"INSERT INTO student (first_name, last_name, "group")
               VALUES ($1, $2, $3)
               RETURNING id"#,
        )
        .bind(student.first_name)
        .bind(student.last_name)
        .bind(student.group)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rec.0)
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, DeskError> {
        let rows = sqlx::query_as::<_, Student>(
            r#"SELECT id, first_name, last_name, "group" FROM student ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_students(&self) -> Result<i64, DeskError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM student")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }
}
