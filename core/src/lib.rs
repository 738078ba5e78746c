//! Section-aware rule engine that reviews merge requests against a
//! conventions-driven configuration repository and emits `approve` /
//! `manual_review` verdicts.
//!
//! This crate has no knowledge of HTTP, webhooks, or any specific forge —
//! it is a pure function of `(MRContext, file-rule configs, rule registry,
//! fetched file contents)`. The CLI crate wires it to a real (or mock)
//! forge client.

pub mod api;
pub mod config;
pub mod diff;
pub mod line_range;
pub mod pattern;
pub mod registry;
pub mod reporter;
pub mod rules;
pub mod section_manager;
pub mod section_parser;
pub mod yaml_doc;

pub use api::traits::{Reporter, Rule, RuleFactory};
pub use api::types::{CoreError, Decision, DecisionKind, FileChange, MrContext, RuleEvaluation};
pub use registry::RuleRegistry;
pub use section_manager::{finalize, SectionManager};
