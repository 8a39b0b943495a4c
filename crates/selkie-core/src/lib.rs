//! Selkie Core
//!
//! Core types, errors, constants, and configuration for the Selkie tiered
//! memory system.
//!
//! # Overview
//!
//! Selkie gives AI agents durable, namespaced memory across three tiers:
//! a working buffer with budgeted compaction, an episodic log with
//! importance-weighted eviction, and a deduplicated semantic index.
//! This crate carries everything shared across the workspace.
//!
//! # TigerStyle
//!
//! This crate follows [TigerStyle](https://github.com/tigerbeetle/tigerbeetle/blob/main/docs/TIGER_STYLE.md)
//! engineering principles:
//! - Safety > Performance > Developer Experience
//! - Explicit limits with big-endian naming (e.g., `AGENT_ID_LENGTH_BYTES_MAX`)
//! - Validation at construction boundaries

pub mod agent;
pub mod config;
pub mod constants;
pub mod error;
pub mod telemetry;

pub use agent::AgentId;
pub use config::{EpisodicConfig, SelkieConfig, SemanticConfig, WorkingConfig};
pub use constants::*;
pub use error::{Error, Result};
pub use telemetry::{init_telemetry, TelemetryConfig};
