//! CSV import for earmark records.
//!
//! Loads a spreadsheet export (year, member, recipient, amount, agency,
//! subcommittee, account, budget_function, location) into SQLite. Rows are
//! deduplicated by a content hash over all fields, so re-running an import
//! is safe. Amounts may carry `$` and thousands separators.

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;
use crate::db;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    year: i64,
    member: String,
    recipient: String,
    amount: String,
    #[serde(default)]
    agency: Option<String>,
    #[serde(default)]
    subcommittee: Option<String>,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    budget_function: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

/// Parses "$1,234,567.89" / "1234567" into dollars.
fn parse_amount(raw: &str) -> Result<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned
        .parse::<f64>()
        .with_context(|| format!("invalid amount: {:?}", raw))
}

/// Content hash over every field, used as the dedup key.
fn dedup_hash(record: &CsvRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record.year.to_le_bytes());
    for field in [
        Some(&record.member),
        Some(&record.recipient),
        Some(&record.amount),
        record.agency.as_ref(),
        record.subcommittee.as_ref(),
        record.account.as_ref(),
        record.budget_function.as_ref(),
        record.location.as_ref(),
    ] {
        hasher.update(field.map(|s| s.trim()).unwrap_or(""));
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

pub async fn run_import(config: &Config, csv_path: &Path, dry_run: bool) -> Result<()> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let pool = db::connect(config).await?;

    let mut imported = 0usize;
    let mut duplicates = 0usize;
    let mut invalid = 0usize;

    for (line, result) in reader.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                eprintln!("row {}: skipping malformed record: {}", line + 2, e);
                invalid += 1;
                continue;
            }
        };

        let amount = match parse_amount(&record.amount) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("row {}: {}", line + 2, e);
                invalid += 1;
                continue;
            }
        };

        if dry_run {
            imported += 1;
            continue;
        }

        let hash = dedup_hash(&record);
        let id = Uuid::new_v4().to_string();

        let agency = none_if_blank(record.agency);
        let subcommittee = none_if_blank(record.subcommittee);
        let account = none_if_blank(record.account);
        let budget_function = none_if_blank(record.budget_function);
        let location = none_if_blank(record.location);

        // The earmark row and its FTS row must land together, or a crash
        // would leave a record invisible to search forever (the dedup hash
        // blocks re-importing it).
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO earmarks
                (id, year, member, recipient, amount, agency, subcommittee,
                 account, budget_function, location, dedup_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(dedup_hash) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(record.year)
        .bind(record.member.trim())
        .bind(record.recipient.trim())
        .bind(amount)
        .bind(&agency)
        .bind(&subcommittee)
        .bind(&account)
        .bind(&budget_function)
        .bind(&location)
        .bind(&hash)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            duplicates += 1;
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO earmarks_fts
                (earmark_id, member, recipient, agency, subcommittee,
                 account, budget_function, location)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(record.member.trim())
        .bind(record.recipient.trim())
        .bind(agency.as_deref().unwrap_or(""))
        .bind(subcommittee.as_deref().unwrap_or(""))
        .bind(account.as_deref().unwrap_or(""))
        .bind(budget_function.as_deref().unwrap_or(""))
        .bind(location.as_deref().unwrap_or(""))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        imported += 1;
    }

    pool.close().await;

    if dry_run {
        println!("dry-run: parseable records: {}", imported);
    } else {
        println!("imported records: {}", imported);
        println!("skipped duplicates: {}", duplicates);
    }
    if invalid > 0 {
        println!("invalid rows: {}", invalid);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: &str) -> CsvRecord {
        CsvRecord {
            year: 2022,
            member: "Sen. Collins".to_string(),
            recipient: "Coastal Clinic".to_string(),
            amount: amount.to_string(),
            agency: Some("Labor".to_string()),
            subcommittee: None,
            account: None,
            budget_function: None,
            location: Some("ME".to_string()),
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234,567.89").unwrap(), 1_234_567.89);
        assert_eq!(parse_amount("500000").unwrap(), 500_000.0);
        assert!(parse_amount("n/a").is_err());
    }

    #[test]
    fn test_dedup_hash_stable_and_field_sensitive() {
        let a = record("500000");
        let b = record("500000");
        assert_eq!(dedup_hash(&a), dedup_hash(&b));

        let c = record("600000");
        assert_ne!(dedup_hash(&a), dedup_hash(&c));
    }

    #[test]
    fn test_none_if_blank() {
        assert_eq!(none_if_blank(Some("  ".to_string())), None);
        assert_eq!(none_if_blank(Some(" ME ".to_string())), Some("ME".to_string()));
        assert_eq!(none_if_blank(None), None);
    }

    #[tokio::test]
    async fn test_fts_rows_stay_in_step_with_earmarks() {
        let tmp = tempfile::TempDir::new().unwrap();
        let csv_path = tmp.path().join("earmarks.csv");
        std::fs::write(
            &csv_path,
            "year,member,recipient,amount,agency,subcommittee,account,budget_function,location\n\
             2022,Sen. Collins,Coastal Clinic,\"$500,000\",Labor,,,,ME\n",
        )
        .unwrap();

        let config = Config {
            db: crate::config::DbConfig {
                path: tmp.path().join("earmarks.sqlite"),
            },
            server: crate::config::ServerConfig {
                bind: "127.0.0.1:0".to_string(),
            },
            llm: Default::default(),
            answer: Default::default(),
            documents: Default::default(),
        };

        crate::migrate::run_migrations(&config).await.unwrap();
        run_import(&config, &csv_path, false).await.unwrap();
        // Re-import hits the dedup path and must not leave the FTS
        // index out of step with the earmarks table.
        run_import(&config, &csv_path, false).await.unwrap();

        let pool = db::connect(&config).await.unwrap();
        let earmarks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM earmarks")
            .fetch_one(&pool)
            .await
            .unwrap();
        let fts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM earmarks_fts")
            .fetch_one(&pool)
            .await
            .unwrap();
        pool.close().await;

        assert_eq!(earmarks, 1);
        assert_eq!(fts, 1);
    }
}
