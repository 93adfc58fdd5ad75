// Fragment resolution: the step that turns a freshly synthesized, not-yet
// checked fragment back into a well-typed part of the tree, or fails.
// Mutations call this after every structural edit; a failure here is fatal
// to the mutation and the tree must not be reused.

use tracing::trace;

use super::{BinaryOp, NodeId, NodeKind, SyntaxTree, TreeError, Type};

impl SyntaxTree {
    /// Check a synthesized fragment: every variable read resolves to a
    /// declaration in the enclosing method (when `resolve_references` is
    /// set), every call resolves to a method in the unit, and binary
    /// operands agree with their operator.
    pub fn resolve_fragment(
        &self,
        fragment: NodeId,
        resolve_references: bool,
    ) -> Result<(), TreeError> {
        trace!(%fragment, resolve_references, "resolving fragment");
        for id in self.descendants(fragment) {
            match self.kind(id).ok_or(TreeError::NodeNotFound(id))? {
                NodeKind::VarRead { name } if resolve_references => {
                    let declared = self
                        .enclosing_method(id)
                        .map(|m| self.variable_type(m, name).is_some())
                        .unwrap_or(false);
                    if !declared {
                        return Err(TreeError::UnresolvedReference { name: name.clone() });
                    }
                }
                NodeKind::Call { name } if resolve_references => {
                    let missing = self
                        .find(|tree, n| {
                            matches!(
                                tree.kind(n),
                                Some(NodeKind::Method { name: m, .. }) if m == name
                            )
                        })
                        .is_empty();
                    if missing {
                        return Err(TreeError::UnresolvedReference { name: name.clone() });
                    }
                }
                NodeKind::Binary { op } => self.check_binary(id, *op)?,
                NodeKind::Cast { ty } => {
                    let inner = self.children(id).first().copied();
                    let inner_ty = inner.and_then(|c| self.expr_type(c));
                    if let (Some(inner_ty), false) = (&inner_ty, ty == &Type::Void) {
                        if inner_ty != ty {
                            return Err(TreeError::TypeMismatch {
                                op: "cast".into(),
                                left: ty.to_string(),
                                right: inner_ty.to_string(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_binary(&self, id: NodeId, op: BinaryOp) -> Result<(), TreeError> {
        let children = self.children(id);
        let left = children.first().and_then(|&c| self.expr_type(c));
        let right = children.get(1).and_then(|&c| self.expr_type(c));

        // Unresolvable operands (e.g. references with resolution disabled)
        // are not this check's business
        let (Some(left), Some(right)) = (left, right) else {
            return Ok(());
        };

        let compatible = match op {
            BinaryOp::Add => {
                (left.is_numeric() && right.is_numeric()) || left.is_string() || right.is_string()
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                left.is_numeric() && right.is_numeric()
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                left.is_numeric() && right.is_numeric()
            }
            BinaryOp::Eq | BinaryOp::Ne => true,
            BinaryOp::And | BinaryOp::Or => left == Type::Bool && right == Type::Bool,
        };

        if compatible {
            Ok(())
        } else {
            Err(TreeError::TypeMismatch {
                op: op.to_string(),
                left: left.to_string(),
                right: right.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{parse_unit, LiteralValue};
    use super::*;

    #[test]
    fn accepts_well_typed_fragment() {
        let mut tree =
            parse_unit("unit U; class C { int f(int a) { return a; } }").unwrap();
        let read = tree.find(|t, id| matches!(t.kind(id), Some(NodeKind::VarRead { .. })))[0];
        let zero = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Int(0),
        });
        let sum = tree.add_node(NodeKind::Binary { op: BinaryOp::Add });
        tree.replace_in_parent(read, sum).unwrap();
        tree.set_children(sum, vec![read, zero]);
        assert!(tree.resolve_fragment(sum, true).is_ok());
    }

    #[test]
    fn rejects_unresolved_reference() {
        let mut tree = parse_unit("unit U; class C { int f() { return 1; } }").unwrap();
        let lit = tree.find(|t, id| matches!(t.kind(id), Some(NodeKind::Literal { .. })))[0];
        let ghost = tree.add_node(NodeKind::VarRead {
            name: "ghost".into(),
        });
        tree.replace_in_parent(lit, ghost).unwrap();
        let err = tree.resolve_fragment(ghost, true).unwrap_err();
        assert!(matches!(err, TreeError::UnresolvedReference { .. }));
    }

    #[test]
    fn reference_checks_can_be_disabled() {
        let mut tree = parse_unit("unit U; class C { int f() { return 1; } }").unwrap();
        let lit = tree.find(|t, id| matches!(t.kind(id), Some(NodeKind::Literal { .. })))[0];
        let ghost = tree.add_node(NodeKind::VarRead {
            name: "ghost".into(),
        });
        tree.replace_in_parent(lit, ghost).unwrap();
        assert!(tree.resolve_fragment(ghost, false).is_ok());
    }

    #[test]
    fn rejects_mismatched_operands() {
        let mut tree = parse_unit("unit U; class C { void f() { } }").unwrap();
        let t = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Bool(true),
        });
        let one = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Int(1),
        });
        let bad = tree.add_with_children(NodeKind::Binary { op: BinaryOp::Mul }, vec![t, one]);
        let err = tree.resolve_fragment(bad, true).unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { .. }));
    }
}
