// Synthetic-method insertion: add an empty private method to the class and
// call it from a random legal position in the target method. The call
// never lands after a return, so no unreachable code is created.

use std::collections::BTreeSet;

use super::{
    forward_policy_to_core, has_method_with_body, impl_config_eq, is_method_with_body, self_scope,
};
use crate::transform::{
    constraints_hold, Category, Constraint, MutationError, Outcome, Snapshot, Transformer,
    TransformerCore,
};
use crate::tree::{NodeKind, SyntaxTree, Type};

#[derive(Debug)]
pub struct SyntheticMethodInserter {
    core: TransformerCore,
}

impl SyntheticMethodInserter {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(SyntheticMethodInserter);

impl Transformer for SyntheticMethodInserter {
    fn name(&self) -> &'static str {
        "synthetic-method"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-method-with-body", has_method_with_body)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Structure])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let Some((method, scope)) =
            self.core
                .select_target(tree, is_method_with_body, self_scope)
        else {
            return Ok(Outcome::Empty);
        };
        let pre = Snapshot::of(tree, scope);

        let class = tree
            .parent(method)
            .ok_or_else(|| MutationError::MalformedTree {
                mutation: self.name(),
                message: format!("method {method} has no enclosing class"),
            })?;
        let block = tree
            .method_body(method)
            .ok_or_else(|| MutationError::MalformedTree {
                mutation: self.name(),
                message: format!("method {method} has no body block"),
            })?;

        let taken = tree.identifiers();
        let fresh = self.core.fresh_name(self.name(), "helper", &taken)?;

        let empty_body = tree.add_node(NodeKind::Block);
        let synthetic = tree.add_with_children(
            NodeKind::Method {
                name: fresh.clone(),
                return_type: Type::Void,
                private: true,
            },
            vec![empty_body],
        );
        let class_len = tree.children(class).len();
        tree.insert_child(class, class_len, synthetic)?;

        let call = tree.add_node(NodeKind::Call { name: fresh });
        let stmt = tree.add_with_children(NodeKind::ExprStmt, vec![call]);
        let len = tree.children(block).len();
        let limit = tree.first_terminal_index(block);
        let index = self.core.pick_insertion_index(len, limit);
        tree.insert_child(block, index, stmt)?;

        self.core.recompile(tree, stmt)?;
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
    fn inserts_private_method_and_invocation() {
        let mut tree =
            parse_unit("unit U; class C { int f() { int x = 1; return x; } }").unwrap();
        let mut unit = SyntheticMethodInserter::new(41);
        let outcome = unit.apply_at_random(&mut tree).unwrap();
        assert!(!outcome.is_empty());

        let text = tree.to_source();
        assert!(text.contains("private void helper_"), "{text}");
        assert!(text.contains("helper_"), "{text}");

        // The invocation precedes the return
        let call_pos = text.find("();").unwrap();
        let return_pos = text.find("return x;").unwrap();
        assert!(call_pos < return_pos, "{text}");
    }

    #[test]
    fn call_never_lands_after_the_return() {
        for seed in 0..16 {
            let mut tree =
                parse_unit("unit U; class C { int f() { int a = 1; int b = 2; return a; } }")
                    .unwrap();
            let mut unit = SyntheticMethodInserter::new(seed);
            unit.apply_at_random(&mut tree).unwrap();
            let method = tree.find(|t, id| {
                matches!(t.kind(id), Some(NodeKind::Method { private: false, .. }))
            })[0];
            let block = tree.method_body(method).unwrap();
            let children = tree.children(block);
            let return_pos = children
                .iter()
                .position(|&c| matches!(tree.kind(c), Some(NodeKind::Return)))
                .unwrap();
            assert_eq!(return_pos, children.len() - 1, "seed {seed}");
        }
    }

    #[test]
    fn synthetic_methods_are_not_themselves_targets() {
        // The synthesized method has an empty body and never qualifies
        let mut tree =
            parse_unit("unit U; class C { int f() { return 1; } }").unwrap();
        let mut unit = SyntheticMethodInserter::new(41);
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(unit.apply_at_random(&mut tree).unwrap().is_empty());
    }
}
