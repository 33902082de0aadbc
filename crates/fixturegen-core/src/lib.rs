//! Core contracts for the fixturegen engine.
//!
//! This crate defines the normalized model graph, field constraint
//! records, validation helpers, and graph analysis shared by the
//! generation engine and external collaborators (discoverers and
//! emitters).

pub mod constraints;
pub mod error;
pub mod graph;
pub mod schema;
pub mod validation;

pub use constraints::FieldConstraints;
pub use error::{Error, Result};
pub use graph::{ModelGraphReport, ModelGraphSummary, build_model_graph_report};
pub use schema::{FieldDecl, FieldType, ModelDecl, ModelGraph};
pub use validation::validate_graph;

/// Current contract version for model graph artifacts.
pub const SCHEMA_VERSION: &str = "0.1";
