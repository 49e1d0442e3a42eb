use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_temperature() -> f64 {
    0.2
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    /// Maximum rows fetched from the earmarks table per question.
    #[serde(default = "default_row_limit")]
    pub row_limit: i64,
    /// Rows rendered into the markdown context table.
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,
    /// Conversation messages included in the prompt.
    #[serde(default = "default_history_messages")]
    pub history_messages: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            row_limit: default_row_limit(),
            table_rows: default_table_rows(),
            history_messages: default_history_messages(),
        }
    }
}

fn default_row_limit() -> i64 {
    1000
}
fn default_table_rows() -> usize {
    10
}
fn default_history_messages() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    /// Hosted vector store id for document search. Unset disables `/documents/ask`.
    #[serde(default)]
    pub vector_store_id: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            vector_store_id: None,
            max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    8
}

impl DocumentsConfig {
    pub fn is_enabled(&self) -> bool {
        self.vector_store_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.answer.row_limit < 1 {
        anyhow::bail!("answer.row_limit must be >= 1");
    }

    if config.answer.table_rows == 0 {
        anyhow::bail!("answer.table_rows must be > 0");
    }

    if config.llm.model.is_empty() {
        anyhow::bail!("llm.model must not be empty");
    }

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        anyhow::bail!("llm.temperature must be in [0.0, 2.0]");
    }

    if config.documents.max_results == 0 {
        anyhow::bail!("documents.max_results must be > 0");
    }

    Ok(config)
}
