//! Core data models for earmark records and question filters.
//!
//! An earmark (Community Project Funding item) is a congressionally directed
//! allocation of federal funds to a specific recipient. Records are read-only
//! once imported; this crate never updates them.

use serde::Serialize;
use sqlx::Row;

/// A single earmark record as stored in SQLite.
#[derive(Debug, Clone, Serialize)]
pub struct Earmark {
    pub id: String,
    pub year: i64,
    pub member: String,
    pub recipient: String,
    pub amount: f64,
    pub agency: Option<String>,
    pub subcommittee: Option<String>,
    pub account: Option<String>,
    pub budget_function: Option<String>,
    pub location: Option<String>,
}

impl Earmark {
    /// Maps a row from `SELECT * FROM earmarks`.
    pub fn from_row(row: &sqlx::sqlite::SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            year: row.get("year"),
            member: row.get("member"),
            recipient: row.get("recipient"),
            amount: row.get("amount"),
            agency: row.get("agency"),
            subcommittee: row.get("subcommittee"),
            account: row.get("account"),
            budget_function: row.get("budget_function"),
            location: row.get("location"),
        }
    }
}

/// Filters extracted from a natural-language question.
///
/// `None` / empty fields mean "no constraint". Keywords are the residue of
/// the question after entity spans and stopwords are removed, and are matched
/// against the descriptive text columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarmarkFilters {
    pub member: Option<String>,
    pub year: Option<i64>,
    pub agency: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub keywords: Vec<String>,
}

impl EarmarkFilters {
    pub fn is_empty(&self) -> bool {
        self.member.is_none()
            && self.year.is_none()
            && self.agency.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && self.keywords.is_empty()
    }
}
