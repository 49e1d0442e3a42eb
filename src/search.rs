//! Offline structured search.
//!
//! Runs the same entity extraction and filtered query as the answer pipeline
//! but prints the matching rows directly instead of calling the LLM. Useful
//! for checking what a question actually matches, and for working without
//! an API key.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::extract::Extractor;
use crate::prompt::fmt_usd;
use crate::query;

pub async fn run_search(config: &Config, question: &str, limit: Option<i64>) -> Result<()> {
    if question.trim().is_empty() {
        println!("No matching earmarks.");
        return Ok(());
    }

    let extractor = Extractor::new()?;
    let filters = extractor.extract(question);

    println!("filters:");
    println!("  member:  {}", filters.member.as_deref().unwrap_or("-"));
    println!(
        "  year:    {}",
        filters.year.map(|y| y.to_string()).unwrap_or("-".into())
    );
    println!("  agency:  {}", filters.agency.as_deref().unwrap_or("-"));
    println!(
        "  amount:  {} .. {}",
        filters.min_amount.map(fmt_usd).unwrap_or("-".into()),
        filters.max_amount.map(fmt_usd).unwrap_or("-".into())
    );
    println!("  keywords: {}", filters.keywords.join(", "));
    println!();

    let pool = db::connect(config).await?;
    let limit = limit.unwrap_or(config.answer.row_limit);
    let earmarks = query::query_with_fallback(&pool, &filters, limit).await?;
    pool.close().await;

    if earmarks.is_empty() {
        println!("No matching earmarks.");
        return Ok(());
    }

    let total: f64 = earmarks.iter().map(|e| e.amount).sum();
    println!("matched {} earmarks worth {}", earmarks.len(), fmt_usd(total));
    println!();

    for (i, e) in earmarks.iter().enumerate() {
        println!(
            "{}. {} — {} ({})",
            i + 1,
            e.recipient,
            fmt_usd(e.amount),
            e.year
        );
        println!("    member: {}", e.member);
        if let Some(ref agency) = e.agency {
            println!("    agency: {}", agency);
        }
        if let Some(ref location) = e.location {
            println!("    location: {}", location);
        }
        println!("    id: {}", e.id);
        println!();
    }

    Ok(())
}
