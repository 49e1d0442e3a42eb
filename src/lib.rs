//! # Earmark Assistant
//!
//! Ask natural-language questions about U.S. federal earmark (Community
//! Project Funding) records and get AI-generated answers backed by a local
//! SQLite copy of the earmark table, with optional document search over a
//! hosted vector store.
//!
//! The crate is a thin orchestration layer. Each question flows through one
//! straight-line pipeline:
//!
//! ```text
//! question ──▶ extract entities ──▶ filtered query ──▶ context + prompt ──▶ LLM ──▶ answer
//!   (regex)      (member, year,       (SQLite, with       (markdown table)
//!                 agency, $, kw)       relax fallback)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ema init                          # create database
//! ema import data/earmarks.csv      # load records
//! ema search "Labor earmarks 2022"  # offline filter check
//! ema ask "What did Sen. Collins request in FY 2022?"
//! ema serve                         # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Earmark record and filter types |
//! | [`extract`] | Regex entity extraction |
//! | [`query`] | Filtered queries and fallback |
//! | [`prompt`] | Context and prompt assembly |
//! | [`llm`] | OpenAI chat-completion client |
//! | [`docsearch`] | Hosted vector-store document search |
//! | [`conversation`] | In-memory session history |
//! | [`suggest`] | Follow-up suggestions |
//! | [`import`] | CSV import |
//! | [`server`] | JSON HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod ask;
pub mod config;
pub mod conversation;
pub mod db;
pub mod docsearch;
pub mod extract;
pub mod import;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod prompt;
pub mod query;
pub mod search;
pub mod server;
pub mod suggest;
