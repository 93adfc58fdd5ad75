// Dead insertions: an unused local with a synthesized default value, or an
// inline comment. Either lands at the block head when the body is empty,
// or at a random index that never trails a return.

use std::collections::BTreeSet;

use super::{forward_policy_to_core, has_any_method, impl_config_eq, is_method, self_scope};
use crate::transform::values::{default_value, SUPPORTED_DECL_TYPES};
use crate::transform::{
    constraints_hold, Category, Constraint, MutationError, Outcome, Snapshot, Transformer,
    TransformerCore,
};
use crate::tree::{NodeKind, SyntaxTree};

#[derive(Debug)]
pub struct UnusedVariableInserter {
    core: TransformerCore,
}

impl UnusedVariableInserter {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(UnusedVariableInserter);

impl Transformer for UnusedVariableInserter {
    fn name(&self) -> &'static str {
        "unused-variable"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-method", has_any_method)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::DeadCode])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let Some((method, scope)) = self.core.select_target(tree, is_method, self_scope) else {
            return Ok(Outcome::Empty);
        };
        let pre = Snapshot::of(tree, scope);

        let block = tree
            .method_body(method)
            .ok_or_else(|| MutationError::MalformedTree {
                mutation: self.name(),
                message: format!("method {method} has no body block"),
            })?;

        let ty = self.core.pick_from(SUPPORTED_DECL_TYPES).clone();
        let value = default_value(&ty).ok_or(MutationError::UnsupportedType {
            mutation: "unused-variable",
            ty: ty.clone(),
        })?;
        let taken = tree.identifiers();
        let name = self.core.fresh_name(self.name(), "unused", &taken)?;

        let init = tree.add_node(NodeKind::Literal { value });
        let decl = tree.add_with_children(NodeKind::VarDecl { name, ty }, vec![init]);
        let len = tree.children(block).len();
        let limit = tree.first_terminal_index(block);
        let index = self.core.pick_insertion_index(len, limit);
        tree.insert_child(block, index, decl)?;

        self.core.recompile(tree, decl)?;
        Ok(self.core.commit(
            tree,
            scope,
            vec![method],
            self.name(),
            self.categories(),
            pre,
        ))
    }

    forward_policy_to_core!();
}

#[derive(Debug)]
pub struct InlineCommentInserter {
    core: TransformerCore,
}

impl InlineCommentInserter {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(InlineCommentInserter);

impl Transformer for InlineCommentInserter {
    fn name(&self) -> &'static str {
        "inline-comment"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-method", has_any_method)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Comments, Category::DeadCode])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let Some((method, scope)) = self.core.select_target(tree, is_method, self_scope) else {
            return Ok(Outcome::Empty);
        };
        let pre = Snapshot::of(tree, scope);

        let block = tree
            .method_body(method)
            .ok_or_else(|| MutationError::MalformedTree {
                mutation: self.name(),
                message: format!("method {method} has no body block"),
            })?;

        let text = format!("note {:08x}", self.core.marker());
        let comment = tree.add_node(NodeKind::Comment { text });
        // Comments are legal anywhere in the statement list
        let len = tree.children(block).len();
        let index = self.core.pick_insertion_index(len, len);
        tree.insert_child(block, index, comment)?;

        Ok(self.core.commit(
            tree,
            scope,
            vec![method],
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
    fn inserted_variable_precedes_the_return() {
        for seed in 0..16 {
            let mut tree =
                parse_unit("unit U; class C { int f() { int a = 1; return a; } }").unwrap();
            let mut unit = UnusedVariableInserter::new(seed);
            unit.apply_at_random(&mut tree).unwrap();
            let method =
                tree.find(|t, id| matches!(t.kind(id), Some(NodeKind::Method { .. })))[0];
            let block = tree.method_body(method).unwrap();
            let children = tree.children(block);
            assert!(
                matches!(tree.kind(*children.last().unwrap()), Some(NodeKind::Return)),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn empty_method_gets_declaration_at_block_head() {
        let mut tree = parse_unit("unit U; class C { void f() { } }").unwrap();
        let mut unit = UnusedVariableInserter::new(3);
        let outcome = unit.apply_at_random(&mut tree).unwrap();
        assert!(!outcome.is_empty());
        assert!(tree.to_source().contains("unused_"));
    }

    #[test]
    fn one_insertion_per_method_then_exhaustion() {
        let mut tree = parse_unit("unit U; class C { void f() { } void g() { } }").unwrap();
        let mut unit = UnusedVariableInserter::new(3);
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(unit.apply_at_random(&mut tree).unwrap().is_empty());
    }

    #[test]
    fn comment_inserter_adds_a_statement_comment() {
        let mut tree =
            parse_unit("unit U; class C { int f() { return 1; } }").unwrap();
        let mut unit = InlineCommentInserter::new(3);
        unit.apply_at_random(&mut tree).unwrap();
        assert_eq!(tree.comments().len(), 1);
        assert!(tree.to_source().contains("// note "));
    }
}
