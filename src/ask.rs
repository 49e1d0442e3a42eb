//! The question-answering pipeline.
//!
//! One straight-line sequence: extract entities from the question, query the
//! earmarks table with fallback, build the context and prompt, call the LLM,
//! and attach follow-up suggestions. Used by both the `ema ask` CLI command
//! and the `POST /ask` HTTP endpoint.

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::extract::Extractor;
use crate::llm;
use crate::prompt;
use crate::query;
use crate::suggest;

/// Everything a caller needs to render an answer.
#[derive(Debug)]
pub struct AskOutcome {
    pub answer: String,
    pub count: usize,
    pub suggestions: Vec<String>,
}

/// Core pipeline returning structured data (used by CLI and server).
///
/// The extractor is passed in so the server can compile its regexes once
/// and share them across requests.
pub async fn answer_question(
    config: &Config,
    pool: &SqlitePool,
    extractor: &Extractor,
    history: &str,
    question: &str,
) -> Result<AskOutcome> {
    let question = question.trim();
    if question.is_empty() {
        bail!("question must not be empty");
    }

    let filters = extractor.extract(question);

    let earmarks = query::query_with_fallback(pool, &filters, config.answer.row_limit).await?;

    let context = prompt::build_context(&earmarks, config.answer.table_rows);
    let full_prompt = prompt::build_prompt(history, &context, question);

    let answer = llm::complete(&config.llm, &full_prompt).await?;
    let suggestions = suggest::follow_ups(&filters, earmarks.len());

    Ok(AskOutcome {
        answer,
        count: earmarks.len(),
        suggestions,
    })
}

/// CLI entry point — runs the pipeline once and prints the answer.
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let extractor = Extractor::new()?;
    let pool = db::connect(config).await?;
    let outcome = match answer_question(config, &pool, &extractor, "", question).await {
        Ok(o) => o,
        Err(e) => {
            pool.close().await;
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    pool.close().await;

    println!("{}", outcome.answer);
    println!();
    println!("matched earmarks: {}", outcome.count);
    if !outcome.suggestions.is_empty() {
        println!("follow-ups:");
        for s in &outcome.suggestions {
            println!("  - {}", s);
        }
    }

    Ok(())
}
