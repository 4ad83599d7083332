use gleaner_core::error::AppError;
use gleaner_core::models::Record;
use gleaner_core::schema::project;
use sqlx::{Row, SqlitePool};

/// Table every SQLite save writes into.
pub const TABLE_NAME: &str = "scraped_data";

/// Rows of the `scraped_data` table: an autoincrement id plus one TEXT
/// column per schema field.
#[derive(Clone)]
pub struct ScrapedDataRepository {
    pool: SqlitePool,
}

impl ScrapedDataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the table for `schema` unless it already exists.
    ///
    /// An existing table is used as-is; a save whose schema names a column
    /// the table lacks fails on insert.
    pub async fn ensure_table(&self, schema: &[String]) -> Result<(), AppError> {
        let columns: Vec<String> = schema
            .iter()
            .map(|name| format!("{} TEXT", quote_ident(name)))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    {}\n)",
            columns.join(",\n    ")
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Insert one row per record, projected onto `schema`, in a single
    /// transaction. Returns the number of rows written.
    pub async fn insert_all(&self, schema: &[String], records: &[Record]) -> Result<u64, AppError> {
        let column_list = schema
            .iter()
            .map(|name| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; schema.len()].join(", ");
        let sql = format!("INSERT INTO {TABLE_NAME} ({column_list}) VALUES ({placeholders})");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let mut written = 0;
        for record in records {
            let mut query = sqlx::query(&sql);
            for cell in project(record, schema) {
                query = query.bind(cell);
            }
            written += query
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?
                .rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(rows = written, "Inserted scraped rows");
        Ok(written)
    }

    /// Total rows in the table.
    pub async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    /// Values of `columns` for every row, in insertion order.
    pub async fn fetch_rows(
        &self,
        columns: &[String],
    ) -> Result<Vec<Vec<Option<String>>>, AppError> {
        let column_list = columns
            .iter()
            .map(|name| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {column_list} FROM {TABLE_NAME} ORDER BY id");

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| {
                        row.try_get::<Option<String>, _>(i)
                            .map_err(|e| AppError::DatabaseError(e.to_string()))
                    })
                    .collect()
            })
            .collect()
    }
}

/// Double-quote an SQL identifier, escaping embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
