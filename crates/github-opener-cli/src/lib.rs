//! GitHub organization repository search for launcher plugins.
//!
//! - `config`: environment parsing.
//! - `credentials`: bearer token value threaded into API calls.
//! - `github_api`: REST client for organizations and their repositories.
//! - `cache`: in-memory URL list and the paginated refresh.
//! - `matcher`: fuzzy ranking, delegated to fzf or done in-process.
//! - `action`: selection payloads carried by rendered rows.
//! - `opener`: fire-and-forget browser launch.
//! - `feedback`: result list assembly.
//! - `orchestrator`: lifecycle event handling.
//! - `host`: line-delimited JSON event loop.

pub mod action;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod feedback;
pub mod github_api;
pub mod host;
pub mod matcher;
pub mod opener;
pub mod orchestrator;
