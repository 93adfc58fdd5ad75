//! # Morph Core
//!
//! Core implementation of the codemorph variant generator, including:
//! - The syntax-tree collaborator (mini class language parser, structural
//!   edits, fragment resolution, source reconstruction)
//! - The mutation-engine contract and constraint-gated random selection
//! - The mutation catalog (branch wrapping, neutral elements, identity
//!   indirection, renaming, dead insertions, comment handling)
//! - The registry used by drivers to pick what to run next
//!
//! This crate provides the foundational components that can be used to
//! build variant-generation drivers (CLI, batch pipelines, test harnesses).

#![warn(clippy::all)]

pub mod transform;
pub mod tree;

// Re-export commonly used types
pub use transform::{
    catalog, Category, Constraint, DebugArtifacts, MutationError, MutationRecord, Outcome,
    Snapshot, Transformer, TransformerCore, TransformerRegistry,
};
pub use tree::{
    parse_unit, BinaryOp, LiteralValue, Node, NodeId, NodeKind, SyntaxTree, ToSource, TreeError,
    Type,
};

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for morph core components
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("morph_core=info".parse().unwrap()),
        )
        .init();
}

/// Core engine configuration shared by drivers
#[derive(Debug, Clone)]
pub struct MorphConfig {
    /// Seed for every unit's RNG stream
    pub seed: u64,
    /// Run fragment recompilation after each edit
    pub attempt_recompile: bool,
    /// Resolve synthesized references against the enclosing scope
    pub resolve_references: bool,
    /// Attach debug artifacts (diff + post snapshot) to results
    pub debug: bool,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            attempt_recompile: true,
            resolve_references: true,
            debug: false,
        }
    }
}

impl MorphConfig {
    /// Build the full catalog under this configuration
    pub fn catalog(&self) -> TransformerRegistry {
        let mut registry = catalog::full_catalog(self.seed);
        for index in 0..registry.len() {
            if let Some(unit) = registry.get_mut(index) {
                unit.set_debug(self.debug);
                unit.set_attempt_recompile(self.attempt_recompile);
                unit.set_resolve_references(self.resolve_references);
            }
        }
        registry
    }
}
