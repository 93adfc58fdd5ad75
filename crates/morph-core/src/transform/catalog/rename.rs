// Identifier renaming for parameters and locals. A declaration is renamed
// at most once per method (the ledger tracks the declaration node, whose
// id survives the rename), the denylist protects conventional names, and
// fresh names come from the bounded redraw loop.

use std::collections::BTreeSet;

use super::{
    forward_policy_to_core, has_renameable_local, has_renameable_param, impl_config_eq,
    is_renameable_local, is_renameable_param, method_scope,
};
use crate::transform::{
    constraints_hold, Category, Constraint, MutationError, Outcome, Snapshot, Transformer,
    TransformerCore,
};
use crate::tree::{NodeId, NodeKind, SyntaxTree};

fn declared_name(tree: &SyntaxTree, decl: NodeId) -> Option<String> {
    match tree.kind(decl) {
        Some(NodeKind::Param { name, .. }) | Some(NodeKind::VarDecl { name, .. }) => {
            Some(name.clone())
        }
        _ => None,
    }
}

/// Rewrite the declaration and every read/write of `old` within the method
fn rewrite_uses(tree: &mut SyntaxTree, method: NodeId, decl: NodeId, old: &str, fresh: &str) {
    for id in tree.descendants(method) {
        match tree.kind_mut(id) {
            Some(NodeKind::Param { name, .. }) | Some(NodeKind::VarDecl { name, .. })
                if id == decl =>
            {
                *name = fresh.to_string();
            }
            Some(NodeKind::VarRead { name }) if name == old => {
                *name = fresh.to_string();
            }
            Some(NodeKind::Assign { target }) if target == old => {
                *target = fresh.to_string();
            }
            _ => {}
        }
    }
}

fn apply_rename(
    core: &mut TransformerCore,
    tree: &mut SyntaxTree,
    mutation: &'static str,
    prefix: &str,
    predicate: fn(&SyntaxTree, NodeId) -> bool,
    categories: BTreeSet<Category>,
) -> Result<Outcome, MutationError> {
    let Some((decl, scope)) = core.select_target(tree, predicate, method_scope) else {
        return Ok(Outcome::Empty);
    };
    let pre = Snapshot::of(tree, scope);

    let old = declared_name(tree, decl).ok_or_else(|| MutationError::MalformedTree {
        mutation,
        message: format!("selected node {decl} is not a declaration"),
    })?;
    let taken = tree.identifiers();
    let fresh = core.fresh_name(mutation, prefix, &taken)?;
    rewrite_uses(tree, scope, decl, &old, &fresh);

    // Resolving the whole method catches any read the rewrite missed
    core.recompile(tree, scope)?;
    Ok(core.commit(tree, scope, vec![decl], mutation, categories, pre))
}

#[derive(Debug)]
pub struct ParameterRenamer {
    core: TransformerCore,
}

impl ParameterRenamer {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(ParameterRenamer);

impl Transformer for ParameterRenamer {
    fn name(&self) -> &'static str {
        "parameter-rename"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-renameable-param", has_renameable_param)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Naming])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let categories = self.categories();
        apply_rename(
            &mut self.core,
            tree,
            "parameter-rename",
            "p",
            is_renameable_param,
            categories,
        )
    }

    forward_policy_to_core!();
}

#[derive(Debug)]
pub struct LocalVariableRenamer {
    core: TransformerCore,
}

impl LocalVariableRenamer {
    pub fn new(seed: u64) -> Self {
        Self {
            core: TransformerCore::new(seed),
        }
    }
}

impl_config_eq!(LocalVariableRenamer);

impl Transformer for LocalVariableRenamer {
    fn name(&self) -> &'static str {
        "local-rename"
    }

    fn requirements(&self) -> Vec<Constraint> {
        vec![Constraint::new("has-renameable-local", has_renameable_local)]
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Naming])
    }

    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError> {
        if !constraints_hold(&self.requirements(), tree) {
            return Ok(Outcome::Empty);
        }
        let categories = self.categories();
        apply_rename(
            &mut self.core,
            tree,
            "local-rename",
            "v",
            is_renameable_local,
            categories,
        )
    }

    forward_policy_to_core!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{parse_unit, ToSource};

    const TWO_PARAMS: &str = "unit U; class C { int f(int a, int b) { return a + b; } }";

    #[test]
    fn renames_declaration_and_all_uses() {
        let mut tree =
            parse_unit("unit U; class C { int f(int a) { a = a + 1; return a; } }").unwrap();
        let mut unit = ParameterRenamer::new(31);
        unit.apply_at_random(&mut tree).unwrap();
        let text = tree.to_source();
        assert!(!text.contains("int a"), "{text}");
        // declaration, assignment target, two reads, one return read
        let fresh = text
            .split("int f(int ")
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .unwrap()
            .to_string();
        assert!(fresh.starts_with("p_"), "{text}");
        assert!(text.contains(&format!("{fresh} = ({fresh} + 1);")), "{text}");
        assert!(text.contains(&format!("return {fresh};")), "{text}");
    }

    #[test]
    fn two_applications_rename_both_params_then_exhaust() {
        let mut tree = parse_unit(TWO_PARAMS).unwrap();
        let mut unit = ParameterRenamer::new(31);
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(!unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(unit.apply_at_random(&mut tree).unwrap().is_empty());

        let text = tree.to_source();
        assert!(!text.contains(" a,"), "{text}");
        assert!(!text.contains(" b)"), "{text}");
    }

    #[test]
    fn denylisted_parameter_is_never_selected() {
        let mut tree =
            parse_unit("unit U; class C { void main(string args) { print(args); } }").unwrap();
        let mut unit = ParameterRenamer::new(31);
        assert!(unit.apply_at_random(&mut tree).unwrap().is_empty());
        assert!(tree.to_source().contains("string args"));
    }

    #[test]
    fn local_renamer_leaves_parameters_alone() {
        let mut tree =
            parse_unit("unit U; class C { int f(int a) { int x = a; return x; } }").unwrap();
        let mut unit = LocalVariableRenamer::new(31);
        unit.apply_at_random(&mut tree).unwrap();
        let text = tree.to_source();
        assert!(text.contains("int f(int a)"), "{text}");
        assert!(!text.contains("int x"), "{text}");
    }

    #[test]
    fn records_carry_the_naming_category() {
        let mut tree =
            parse_unit("unit U; class C { int f(int a) { int x = a; return x; } }").unwrap();
        let mut params = ParameterRenamer::new(31);
        let mut locals = LocalVariableRenamer::new(31);
        for outcome in [
            params.apply_at_random(&mut tree).unwrap(),
            locals.apply_at_random(&mut tree).unwrap(),
        ] {
            let record = outcome.record().unwrap();
            assert!(record.categories.contains(&Category::Naming));
        }
    }

    #[test]
    fn fresh_names_do_not_collide_with_existing_identifiers() {
        let mut tree = parse_unit(TWO_PARAMS).unwrap();
        let before = tree.identifiers();
        let mut unit = ParameterRenamer::new(31);
        unit.apply_at_random(&mut tree).unwrap();
        let after = tree.identifiers();
        let fresh: Vec<_> = after.difference(&before).collect();
        assert_eq!(fresh.len(), 1);
    }
}
