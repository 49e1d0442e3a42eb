//! Hosted document search over an OpenAI vector store.
//!
//! Asks the Responses API to answer a question using the `file_search` tool
//! against the configured vector store, and returns the answer text together
//! with file citations. The vector store itself is a black box: documents are
//! uploaded out of band and this crate only queries it.

use anyhow::{bail, Result};
use serde::Serialize;
use std::time::Duration;

use crate::config::Config;

const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

/// One cited source document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Citation {
    pub file_id: String,
    pub filename: String,
}

/// Answer grounded in uploaded documents.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Runs a file-search-grounded question against the configured vector store.
///
/// Fails with a configuration error when `documents.vector_store_id` is
/// unset, before any network call is made.
pub async fn search_documents(config: &Config, question: &str) -> Result<DocumentAnswer> {
    let vector_store_id = match config.documents.vector_store_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => bail!("document search is disabled: documents.vector_store_id is not set"),
    };

    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.llm.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": config.llm.model,
        "input": question,
        "tools": [{
            "type": "file_search",
            "vector_store_ids": [vector_store_id],
            "max_num_results": config.documents.max_results,
        }],
    });

    let mut last_err = None;

    for attempt in 0..=config.llm.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(RESPONSES_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_response(&json);
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "document search API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                let body_text = response.text().await.unwrap_or_default();
                bail!("document search API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("document search failed after retries")))
}

/// Extracts the output text and file citations from a Responses API payload.
///
/// The `output` array mixes `file_search_call` and `message` items; the
/// answer lives in the message's `output_text` content, with citations
/// attached as annotations.
fn parse_response(json: &serde_json::Value) -> Result<DocumentAnswer> {
    let empty = Vec::new();
    let output = json
        .get("output")
        .and_then(|o| o.as_array())
        .unwrap_or(&empty);

    let mut answer = String::new();
    let mut citations: Vec<Citation> = Vec::new();

    for item in output {
        if item.get("type").and_then(|t| t.as_str()) != Some("message") {
            continue;
        }
        let contents = item
            .get("content")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default();

        for content in contents {
            if content.get("type").and_then(|t| t.as_str()) != Some("output_text") {
                continue;
            }
            if let Some(text) = content.get("text").and_then(|t| t.as_str()) {
                if !answer.is_empty() {
                    answer.push('\n');
                }
                answer.push_str(text);
            }
            let annotations = content
                .get("annotations")
                .and_then(|a| a.as_array())
                .cloned()
                .unwrap_or_default();
            for ann in annotations {
                if ann.get("type").and_then(|t| t.as_str()) != Some("file_citation") {
                    continue;
                }
                let file_id = ann
                    .get("file_id")
                    .and_then(|f| f.as_str())
                    .unwrap_or_default()
                    .to_string();
                let filename = ann
                    .get("filename")
                    .and_then(|f| f.as_str())
                    .unwrap_or_default()
                    .to_string();
                let citation = Citation { file_id, filename };
                if !citations.contains(&citation) {
                    citations.push(citation);
                }
            }
        }
    }

    if answer.is_empty() {
        bail!("document search response contained no output text");
    }

    Ok(DocumentAnswer { answer, citations })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_citations() {
        let json = serde_json::json!({
            "output": [
                { "type": "file_search_call", "status": "completed" },
                {
                    "type": "message",
                    "content": [{
                        "type": "output_text",
                        "text": "CPF guidance says requests are capped per member.",
                        "annotations": [
                            { "type": "file_citation", "file_id": "file-1", "filename": "cpf-guidance.pdf" },
                            { "type": "file_citation", "file_id": "file-1", "filename": "cpf-guidance.pdf" }
                        ]
                    }]
                }
            ]
        });

        let parsed = parse_response(&json).unwrap();
        assert!(parsed.answer.contains("capped per member"));
        // Duplicate annotations collapse to one citation
        assert_eq!(parsed.citations.len(), 1);
        assert_eq!(parsed.citations[0].filename, "cpf-guidance.pdf");
    }

    #[test]
    fn test_parse_response_no_text_errors() {
        let json = serde_json::json!({ "output": [] });
        assert!(parse_response(&json).is_err());
    }
}
