//! Filtered earmark queries.
//!
//! Translates an [`EarmarkFilters`] into SQL predicates: equality on year,
//! case-insensitive pattern match on member and agency, range bounds on
//! amount, and a keyword OR-match across the descriptive text columns.
//! Ordering is amount descending, id ascending, so results are deterministic.

use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::{Earmark, EarmarkFilters};

/// Columns searched by the keyword residue, mirroring the text columns a
/// question is most likely to describe.
const KEYWORD_COLUMNS: &[&str] = &[
    "recipient",
    "subcommittee",
    "account",
    "location",
    "budget_function",
];

/// Wraps a term for a LIKE containment match.
fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}

/// Runs one filtered query. Does not relax anything.
pub async fn query_earmarks(
    pool: &SqlitePool,
    filters: &EarmarkFilters,
    limit: i64,
) -> Result<Vec<Earmark>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, year, member, recipient, amount, agency, subcommittee, account, \
         budget_function, location FROM earmarks WHERE 1=1",
    );

    if let Some(ref member) = filters.member {
        qb.push(" AND member LIKE ");
        qb.push_bind(like_pattern(member));
    }
    if let Some(year) = filters.year {
        qb.push(" AND year = ");
        qb.push_bind(year);
    }
    if let Some(ref agency) = filters.agency {
        qb.push(" AND agency LIKE ");
        qb.push_bind(like_pattern(agency));
    }
    if let Some(min) = filters.min_amount {
        qb.push(" AND amount >= ");
        qb.push_bind(min);
    }
    if let Some(max) = filters.max_amount {
        qb.push(" AND amount <= ");
        qb.push_bind(max);
    }

    if !filters.keywords.is_empty() {
        let term = like_pattern(&filters.keywords.join(" "));
        qb.push(" AND (");
        for (i, column) in KEYWORD_COLUMNS.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{} LIKE ", column));
            qb.push_bind(term.clone());
        }
        qb.push(")");
    }

    qb.push(" ORDER BY amount DESC, id ASC LIMIT ");
    qb.push_bind(limit);

    let rows = qb.build().fetch_all(pool).await?;
    Ok(rows.iter().map(Earmark::from_row).collect())
}

/// Queries with progressive relaxation: an exact match first, then without
/// the keyword residue (a joined keyword phrase rarely appears verbatim in
/// any column), then without the agency pattern. Stops at the first step
/// that matches anything.
pub async fn query_with_fallback(
    pool: &SqlitePool,
    filters: &EarmarkFilters,
    limit: i64,
) -> Result<Vec<Earmark>> {
    let rows = query_earmarks(pool, filters, limit).await?;
    if !rows.is_empty() {
        return Ok(rows);
    }

    if !filters.keywords.is_empty() {
        let mut relaxed = filters.clone();
        relaxed.keywords.clear();
        if relaxed.is_empty() {
            return Ok(rows);
        }
        let retry = query_earmarks(pool, &relaxed, limit).await?;
        if !retry.is_empty() {
            return Ok(retry);
        }

        if relaxed.agency.is_some() {
            relaxed.agency = None;
            if !relaxed.is_empty() {
                return query_earmarks(pool, &relaxed, limit).await;
            }
        }
    } else if filters.agency.is_some() {
        let mut relaxed = filters.clone();
        relaxed.agency = None;
        if !relaxed.is_empty() {
            return query_earmarks(pool, &relaxed, limit).await;
        }
    }

    Ok(rows)
}

/// Keyword search over the FTS index, with optional explicit year/member
/// filters. Backs the structured `/search` endpoint.
pub async fn search_earmarks(
    pool: &SqlitePool,
    query: &str,
    year: Option<i64>,
    member: Option<&str>,
    limit: i64,
) -> Result<Vec<Earmark>> {
    let fts = fts_query(query);
    // MATCH '' is an FTS5 syntax error; a query with no usable tokens
    // simply matches nothing.
    if fts.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT e.id, e.year, e.member, e.recipient, e.amount, e.agency, e.subcommittee, \
         e.account, e.budget_function, e.location \
         FROM earmarks_fts f JOIN earmarks e ON e.id = f.earmark_id \
         WHERE earmarks_fts MATCH ",
    );
    qb.push_bind(fts);

    if let Some(year) = year {
        qb.push(" AND e.year = ");
        qb.push_bind(year);
    }
    if let Some(member) = member {
        qb.push(" AND e.member LIKE ");
        qb.push_bind(like_pattern(member));
    }

    qb.push(" ORDER BY rank LIMIT ");
    qb.push_bind(limit);

    let rows = qb.build().fetch_all(pool).await?;
    Ok(rows.iter().map(Earmark::from_row).collect())
}

/// Strips FTS5 operator characters so free text cannot break the MATCH
/// expression, then quotes each token.
fn fts_query(raw: &str) -> String {
    raw.split_whitespace()
        .filter_map(|token| {
            let cleaned: String = token
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect();
            if cleaned.len() < 2 {
                None
            } else {
                Some(format!("\"{}\"", cleaned))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("Labor"), "%Labor%");
    }

    #[test]
    fn test_fts_query_quotes_and_strips_operators() {
        assert_eq!(fts_query("rural broadband"), "\"rural\" \"broadband\"");
        assert_eq!(fts_query("water* NEAR(x)"), "\"water\" \"NEARx\"");
    }

    #[test]
    fn test_fts_query_drops_short_tokens() {
        // A bare quoted pair is 2 chars; single-letter tokens vanish.
        assert_eq!(fts_query("a hospital"), "\"hospital\"");
    }

    #[test]
    fn test_fts_query_empty_when_nothing_usable() {
        assert_eq!(fts_query("a"), "");
        assert_eq!(fts_query("* !"), "");
        assert_eq!(fts_query(""), "");
    }
}
