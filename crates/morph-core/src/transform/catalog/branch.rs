// Trivial-branch wrap: the method body becomes the taken branch of an
// `if (true)`. When the body can return, an untaken branch returning the
// method type's default value is synthesized so every path still has a
// return.

use std::collections::BTreeSet;

use super::{forward_policy_to_core, has_any_method, impl_config_eq, is_method, self_scope};
use crate::transform::values::default_value;
use crate::transform::{
    constraints_hold, Category, Constraint, MutationError, Outcome, Snapshot, Transformer,
    TransformerCore,
};
use crate::tree::{LiteralValue, NodeKind, SyntaxTree, Type};

#[derive(Debug)]
pub struct TrivialBranchWrapper {
    core: TransformerCore,
}

impl TrivialBranchWrapper {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(TrivialBranchWrapper);

impl Transformer for TrivialBranchWrapper {
    fn name(&self) -> &'static str {
        "trivial-branch-wrap"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-method", has_any_method)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::ControlFlow])
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
        let return_type = match tree.kind(method) {
            Some(NodeKind::Method { return_type, .. }) => return_type.clone(),
            _ => {
                return Err(MutationError::MalformedTree {
                    mutation: self.name(),
                    message: format!("selected node {method} is not a method"),
                })
            }
        };

        let original = tree.children(block).to_vec();
        let then_block = tree.add_with_children(NodeKind::Block, original);
        let cond = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Bool(true),
        });
        let mut if_children = vec![cond, then_block];

        // An empty body has nothing to return, so no alternate branch is
        // synthesized; likewise for void methods.
        if tree.contains_return(then_block) && return_type != Type::Void {
            let value = default_value(&return_type).ok_or(MutationError::UnsupportedType {
                mutation: "trivial-branch-wrap",
                ty: return_type.clone(),
            })?;
            let default_lit = tree.add_node(NodeKind::Literal { value });
            let ret = tree.add_with_children(NodeKind::Return, vec![default_lit]);
            let else_block = tree.add_with_children(NodeKind::Block, vec![ret]);
            if_children.push(else_block);
        }

        let if_node = tree.add_with_children(NodeKind::If, if_children);
        tree.set_children(block, vec![if_node]);

        self.core.recompile(tree, if_node)?;
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
