// Identity-indirection wrap: a literal becomes a zero-argument thunk,
// invoked on the spot and cast back to the literal's type. The thunk
// helper import is added to the unit's import table, deduplicated so
// repeated application never duplicates it.

use std::collections::BTreeSet;

use super::{
    forward_policy_to_core, has_wrappable_literal, impl_config_eq, is_wrappable_literal,
    method_scope,
};
use crate::transform::{
    constraints_hold, Category, Constraint, MutationError, Outcome, Snapshot, Transformer,
    TransformerCore,
};
use crate::tree::{NodeKind, SyntaxTree};

/// Dependency the synthesized thunk relies on
pub const THUNK_IMPORT: &str = "lang.functional.Thunk";

#[derive(Debug)]
pub struct IdentityIndirectionWrapper {
    core: TransformerCore,
}

impl IdentityIndirectionWrapper {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(IdentityIndirectionWrapper);

impl Transformer for IdentityIndirectionWrapper {
    fn name(&self) -> &'static str {
        "identity-indirection"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-literal", has_wrappable_literal)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Indirection])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let Some((target, scope)) =
            self.core
                .select_target(tree, is_wrappable_literal, method_scope)
        else {
            return Ok(Outcome::Empty);
        };
        let pre = Snapshot::of(tree, scope);

        // The cast preserves the expression's type through the indirection
        let ty = tree
            .expr_type(target)
            .ok_or_else(|| MutationError::MalformedTree {
                mutation: self.name(),
                message: format!("literal {target} has no type"),
            })?;

        let thunk = tree.add_node(NodeKind::Thunk);
        let cast = tree.add_node(NodeKind::Cast { ty });
        tree.replace_in_parent(target, cast)?;
        tree.set_children(thunk, vec![target]);
        tree.set_children(cast, vec![thunk]);

        let root = tree.root();
        tree.add_import(root, THUNK_IMPORT);

        self.core.recompile(tree, cast)?;
        Ok(self.core.commit(
            tree,
            scope,
            vec![target],
            self.name(),
            self.categories(),
            pre,
        ))
    }

    forward_policy_to_core!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{parse_unit, ToSource};

    #[test]
    fn wraps_literal_in_invoked_thunk_with_cast() {
        let mut tree = parse_unit("unit U; class C { int f() { return 7; } }").unwrap();
        let mut unit = IdentityIndirectionWrapper::new(5);
        unit.apply_at_random(&mut tree).unwrap();
        let text = tree.to_source();
        assert!(text.contains("return ((int) (() -> 7).call());"), "{text}");
        assert!(text.contains("import lang.functional.Thunk;"), "{text}");
    }

    #[test]
    fn repeated_application_never_duplicates_the_import() {
        let mut tree = parse_unit(
            "unit U; class C { int f() { int a = 1; return 2; } }",
        )
        .unwrap();
        let mut unit = IdentityIndirectionWrapper::new(5);
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        let root = tree.root();
        assert_eq!(tree.imports(root), &[THUNK_IMPORT.to_string()]);
    }

    #[test]
    fn null_literals_are_excluded() {
        let mut tree =
            parse_unit("unit U; class C { Widget f() { return null; } }").unwrap();
        let mut unit = IdentityIndirectionWrapper::new(5);
        assert!(unit.apply_at_random(&mut tree).unwrap().is_empty());
    }

    #[test]
    fn already_wrapped_literal_is_not_rewrapped() {
        let mut tree = parse_unit("unit U; class C { int f() { return 7; } }").unwrap();
        let mut unit = IdentityIndirectionWrapper::new(5);
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(unit.apply_at_random(&mut tree).unwrap().is_empty());
    }
}
