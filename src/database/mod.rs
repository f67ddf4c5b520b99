use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

/// Summary of one completed prediction run, as persisted per user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub username: String,
    pub company_name: String,
    pub ticker: String,
    pub investment: Decimal,
    pub final_value: Decimal,
    pub total_profit: Decimal,
    pub recorded_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(&self, record: &HistoryRecord) -> Result<()>;

    /// Newest first.
    async fn history(&self, username: &str) -> Result<Vec<HistoryRecord>>;
}

pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
    /// Initialize database with schema
    pub async fn new(db_url: &str) -> Result<Self> {
        info!("Initializing SQLite database at: {}", db_url);

        // Create database file if it doesn't exist
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;

        info!("Database initialized successfully");
        Ok(store)
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                company_name TEXT NOT NULL,
                company_ticker TEXT NOT NULL,
                investment_amount TEXT NOT NULL,
                final_value TEXT NOT NULL,
                total_profit TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_history_username ON history(username)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn record(&self, record: &HistoryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO history (username, company_name, company_ticker, investment_amount, final_value, total_profit, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(normalize_username(&record.username))
        .bind(&record.company_name)
        .bind(&record.ticker)
        .bind(record.investment.to_string())
        .bind(record.final_value.to_string())
        .bind(record.total_profit.to_string())
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("Saved history for {}: {} ({})", record.username, record.ticker, record.total_profit);
        Ok(())
    }

    async fn history(&self, username: &str) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT username, company_name, company_ticker, investment_amount, final_value, total_profit, timestamp
            FROM history WHERE username = ? ORDER BY id DESC
            "#,
        )
        .bind(normalize_username(username))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<HistoryRecord> {
                Ok(HistoryRecord {
                    username: row.get("username"),
                    company_name: row.get("company_name"),
                    ticker: row.get("company_ticker"),
                    investment: Decimal::from_str(row.get("investment_amount"))?,
                    final_value: Decimal::from_str(row.get("final_value"))?,
                    total_profit: Decimal::from_str(row.get("total_profit"))?,
                    recorded_at: DateTime::parse_from_rfc3339(row.get("timestamp"))?.with_timezone(&Utc),
                })
            })
            .collect()
    }
}

fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(user: &str, ticker: &str, final_value: Decimal) -> HistoryRecord {
        HistoryRecord {
            username: user.to_string(),
            company_name: ticker.to_string(),
            ticker: ticker.to_string(),
            investment: dec!(1000),
            final_value,
            total_profit: final_value - dec!(1000),
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_and_list_newest_first() {
        let store = SqliteHistoryStore::in_memory().await.unwrap();
        store.record(&record("alice", "TCS.NS", dec!(1100))).await.unwrap();
        store.record(&record("alice", "AAPL", dec!(1250.55))).await.unwrap();
        store.record(&record("bob", "MSFT", dec!(900))).await.unwrap();

        let history = store.history("alice").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].ticker, "AAPL");
        assert_eq!(history[0].final_value, dec!(1250.55));
        assert_eq!(history[0].total_profit, dec!(250.55));
        assert_eq!(history[1].ticker, "TCS.NS");
    }

    #[tokio::test]
    async fn test_usernames_are_normalized() {
        let store = SqliteHistoryStore::in_memory().await.unwrap();
        store.record(&record(" Carol ", "INFY.NS", dec!(1000))).await.unwrap();

        let history = store.history("CAROL").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].username, "carol");
        assert!(store.history("dave").await.unwrap().is_empty());
    }
}
