// Global comment removal. Unlike the rest of the catalog this entry is not
// random: when its constraint holds it strips every comment reachable from
// the unit in one step, consuming no RNG draw.

use std::collections::BTreeSet;

use super::{forward_policy_to_core, has_comment, impl_config_eq};
use crate::transform::{
    constraints_hold, Category, Constraint, MutationError, Outcome, Snapshot, Transformer,
    TransformerCore,
};
use crate::tree::SyntaxTree;

#[derive(Debug)]
pub struct CommentRemover {
    core: TransformerCore,
}

impl CommentRemover {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(CommentRemover);

impl Transformer for CommentRemover {
    fn name(&self) -> &'static str {
        "comment-removal"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-comment", has_comment)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Comments])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let scope = tree.root();
        let pre = Snapshot::of(tree, scope);

        for comment in tree.comments() {
            tree.remove_subtree(comment)?;
        }

        Ok(self.core.commit(
            tree,
            scope,
            vec![scope],
            self.name(),
            self.categories(),
            pre,
        ))
    }

    forward_policy_to_core!();
}
