// The mutation catalog: each entry instantiates the transformer contract
// with a distinct semantics-preserving edit. Entries are independent; the
// only shared machinery is `TransformerCore` and the constraint helpers
// below.

mod branch;
mod comments;
mod deadcode;
mod indirection;
mod neutral;
mod rename;
mod synthetic;

pub use branch::TrivialBranchWrapper;
pub use comments::CommentRemover;
pub use deadcode::{InlineCommentInserter, UnusedVariableInserter};
pub use indirection::IdentityIndirectionWrapper;
pub use neutral::NeutralElementInserter;
pub use rename::{LocalVariableRenamer, ParameterRenamer};
pub use synthetic::SyntheticMethodInserter;

use super::values::has_identity_element;
use super::TransformerRegistry;
use crate::tree::{LiteralValue, NodeId, NodeKind, SyntaxTree};

/// Names never chosen for renaming: the conventional entry-point parameter
/// and the receiver.
pub const RENAME_DENYLIST: &[&str] = &["args", "this"];

/// Build the full catalog, explicitly constructed and registered. Each
/// entry gets its own seed derived from `seed` so their draw streams stay
/// independent; callers wanting different seeding construct their own
/// registry.
pub fn full_catalog(seed: u64) -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    registry.register_transformer(Box::new(TrivialBranchWrapper::new(seed)));
    registry.register_transformer(Box::new(NeutralElementInserter::new(seed.wrapping_add(1))));
    registry.register_transformer(Box::new(IdentityIndirectionWrapper::new(
        seed.wrapping_add(2),
    )));
    registry.register_transformer(Box::new(ParameterRenamer::new(seed.wrapping_add(3))));
    registry.register_transformer(Box::new(LocalVariableRenamer::new(seed.wrapping_add(4))));
    registry.register_transformer(Box::new(SyntheticMethodInserter::new(seed.wrapping_add(5))));
    registry.register_transformer(Box::new(UnusedVariableInserter::new(seed.wrapping_add(6))));
    registry.register_transformer(Box::new(InlineCommentInserter::new(seed.wrapping_add(7))));
    registry.register_transformer(Box::new(CommentRemover::new(seed.wrapping_add(8))));
    registry
}

// ---- constraint predicates (cheap, side-effect free) ----

pub(crate) fn has_any_method(tree: &SyntaxTree) -> bool {
    !tree
        .find(|t, id| matches!(t.kind(id), Some(NodeKind::Method { .. })))
        .is_empty()
}

pub(crate) fn has_method_with_body(tree: &SyntaxTree) -> bool {
    !tree.find(is_method_with_body).is_empty()
}

pub(crate) fn has_neutral_candidate(tree: &SyntaxTree) -> bool {
    !tree.find(is_neutral_candidate).is_empty()
}

pub(crate) fn has_wrappable_literal(tree: &SyntaxTree) -> bool {
    !tree.find(is_wrappable_literal).is_empty()
}

pub(crate) fn has_renameable_param(tree: &SyntaxTree) -> bool {
    !tree.find(is_renameable_param).is_empty()
}

pub(crate) fn has_renameable_local(tree: &SyntaxTree) -> bool {
    !tree.find(is_renameable_local).is_empty()
}

pub(crate) fn has_comment(tree: &SyntaxTree) -> bool {
    !tree.comments().is_empty()
}

// ---- target predicates shared between constraints and selection ----

pub(crate) fn is_method(tree: &SyntaxTree, id: NodeId) -> bool {
    matches!(tree.kind(id), Some(NodeKind::Method { .. }))
}

pub(crate) fn is_method_with_body(tree: &SyntaxTree, id: NodeId) -> bool {
    is_method(tree, id)
        && tree
            .method_body(id)
            .map(|block| !tree.children(block).is_empty())
            .unwrap_or(false)
}

/// Numeric or string literal, or a read of a variable of such a type,
/// inside a method
pub(crate) fn is_neutral_candidate(tree: &SyntaxTree, id: NodeId) -> bool {
    let eligible_kind = matches!(
        tree.kind(id),
        Some(NodeKind::Literal { .. } | NodeKind::VarRead { .. })
    );
    eligible_kind
        && tree.enclosing_method(id).is_some()
        && tree
            .expr_type(id)
            .map(|ty| has_identity_element(&ty))
            .unwrap_or(false)
}

/// Any literal with a castable type (everything but `null`), inside a
/// method
pub(crate) fn is_wrappable_literal(tree: &SyntaxTree, id: NodeId) -> bool {
    matches!(
        tree.kind(id),
        Some(NodeKind::Literal { value }) if !matches!(value, LiteralValue::Null)
    ) && tree.enclosing_method(id).is_some()
}

pub(crate) fn is_renameable_param(tree: &SyntaxTree, id: NodeId) -> bool {
    match tree.kind(id) {
        Some(NodeKind::Param { name, .. }) => !RENAME_DENYLIST.contains(&name.as_str()),
        _ => false,
    }
}

pub(crate) fn is_renameable_local(tree: &SyntaxTree, id: NodeId) -> bool {
    match tree.kind(id) {
        Some(NodeKind::VarDecl { name, .. }) => !RENAME_DENYLIST.contains(&name.as_str()),
        _ => false,
    }
}

/// The scope of a node for ledger purposes: its enclosing method
pub(crate) fn method_scope(tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    tree.enclosing_method(id)
}

/// Methods are their own scope
pub(crate) fn self_scope(_tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    Some(id)
}

// Forwards the policy setters of the `Transformer` trait to the embedded
// `TransformerCore`; every catalog entry uses this verbatim.
macro_rules! forward_policy_to_core {
    () => {
        fn set_seed(&mut self, seed: u64) {
            self.core.reseed(seed);
        }

        fn set_debug(&mut self, debug: bool) {
            self.core.set_debug(debug);
        }

        fn set_attempt_recompile(&mut self, attempt: bool) {
            self.core.set_attempt_recompile(attempt);
        }

        fn set_resolve_references(&mut self, resolve: bool) {
            self.core.set_resolve_references(resolve);
        }
    };
}

// Unit equality is configuration equality: history never participates.
macro_rules! impl_config_eq {
    ($entry:ty) => {
        impl PartialEq for $entry {
            fn eq(&self, other: &Self) -> bool {
                self.core.config() == other.core.config()
            }
        }
    };
}

pub(crate) use forward_policy_to_core;
pub(crate) use impl_config_eq;
