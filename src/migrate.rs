use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS earmarks (
            id TEXT PRIMARY KEY,
            year INTEGER NOT NULL,
            member TEXT NOT NULL,
            recipient TEXT NOT NULL,
            amount REAL NOT NULL,
            agency TEXT,
            subcommittee TEXT,
            account TEXT,
            budget_function TEXT,
            location TEXT,
            dedup_hash TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // FTS5 virtual table over the text columns used by the /search endpoint.
    // FTS5 CREATE is not idempotent natively, so we check first.
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='earmarks_fts'",
    )
    .fetch_one(&pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE earmarks_fts USING fts5(
                earmark_id UNINDEXED,
                member,
                recipient,
                agency,
                subcommittee,
                account,
                budget_function,
                location
            )
            "#,
        )
        .execute(&pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_earmarks_year ON earmarks(year)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_earmarks_member ON earmarks(member)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_earmarks_amount ON earmarks(amount DESC)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
