//! Deterministic fixture generation engine.
//!
//! Takes a normalized model graph from `fixturegen-core` and
//! produces constraint-respecting instances that are byte-identical
//! for a fixed `(schema, seed, config)` triple. Randomness flows
//! through keyed substreams derived from the master seed, so
//! instances can be generated out of order or in parallel without
//! affecting each other.

pub mod audit;
pub mod config;
pub mod cycle;
pub mod errors;
pub mod generator;
pub mod hooks;
pub mod providers;
pub mod rng;
pub mod strategy;
pub mod value;

pub use audit::{GenerationAudit, GenerationIssue, TruncationRecord};
pub use config::{
    CyclePolicy, EnumPolicy, FieldOverride, GenerationConfig, OverrideAction, UnionPolicy,
};
pub use errors::GenerationError;
pub use generator::{GeneratedInstance, InstanceGenerator, InstanceValidator};
pub use hooks::{EngineHook, HookSet};
pub use providers::{Provider, ProviderContext, ProviderRef, ProviderRegistry};
pub use rng::{RngMode, SeedCascade};
pub use strategy::{PolicyResolver, Strategy, StrategyKind};
pub use value::Value;
