// Neutral-element insertion: replace a numeric/string leaf with
// `(leaf + identity)`. Types without an identity element never enter the
// candidate pool; one reaching the edit step is a predicate defect and
// fails fatally.

use std::collections::BTreeSet;

use super::{
    forward_policy_to_core, has_neutral_candidate, impl_config_eq, is_neutral_candidate,
    method_scope,
};
use crate::transform::values::identity_element;
use crate::transform::{
    constraints_hold, Category, Constraint, MutationError, Outcome, Snapshot, Transformer,
    TransformerCore,
};
use crate::tree::{BinaryOp, NodeKind, SyntaxTree};

#[derive(Debug)]
pub struct NeutralElementInserter {
    core: TransformerCore,
}

impl NeutralElementInserter {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(NeutralElementInserter);

impl Transformer for NeutralElementInserter {
    fn name(&self) -> &'static str {
        "neutral-element"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new(
            "has-neutral-candidate",
            has_neutral_candidate,
        )]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Arithmetic])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let Some((target, scope)) =
            self.core
                .select_target(tree, is_neutral_candidate, method_scope)
        else {
            return Ok(Outcome::Empty);
        };
        let pre = Snapshot::of(tree, scope);

        let ty = tree
            .expr_type(target)
            .ok_or_else(|| MutationError::MalformedTree {
                mutation: self.name(),
                message: format!("target {target} has no derivable type"),
            })?;
        let identity = identity_element(&ty).ok_or(MutationError::UnsupportedType {
            mutation: "neutral-element",
            ty,
        })?;

        let identity_lit = tree.add_node(NodeKind::Literal { value: identity });
        let sum = tree.add_node(NodeKind::Binary { op: BinaryOp::Add });
        tree.replace_in_parent(target, sum)?;
        tree.set_children(sum, vec![target, identity_lit]);

        self.core.recompile(tree, sum)?;
        // The synthesized identity literal would itself qualify next time;
        // ledgering it keeps exhaustion counts equal to the initial pool.
        Ok(self.core.commit(
            tree,
            scope,
            vec![target, identity_lit],
            self.name(),
            self.categories(),
            pre,
        ))
    }

    forward_policy_to_core!();
}
