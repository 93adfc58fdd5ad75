// Result model: an immutable record of what a mutation did, comparable
// across runs. Debug artifacts are carried but excluded from equality, so
// verbose and terse runs of the same mutation compare equal.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, SyntaxTree};

/// Classification labels for downstream grouping of results
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    ControlFlow,
    Arithmetic,
    Naming,
    DeadCode,
    Comments,
    Indirection,
    Structure,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::ControlFlow => "control-flow",
            Category::Arithmetic => "arithmetic",
            Category::Naming => "naming",
            Category::DeadCode => "dead-code",
            Category::Comments => "comments",
            Category::Indirection => "indirection",
            Category::Structure => "structure",
        };
        f.write_str(s)
    }
}

/// Immutable, parent-linked deep copy of a scope, taken before any edit.
/// Node ids are preserved, so the snapshot identifies which scope it came
/// from even after the live tree has changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    tree: SyntaxTree,
    root: NodeId,
}

impl Snapshot {
    /// Clone the subtree rooted at `scope` out of the live tree
    pub fn of(tree: &SyntaxTree, scope: NodeId) -> Self {
        Self {
            tree: tree.clone_subtree(scope),
            root: scope,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Render the snapshot to source text
    pub fn render(&self) -> String {
        self.tree.render(self.root)
    }
}

/// Debug-only artifacts attached under the verbose flag. Never part of
/// result equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugArtifacts {
    /// Line-oriented rendering of what changed in the scope
    pub diff: String,
    /// Full clone of the scope after the edit
    pub post_snapshot: Snapshot,
}

/// Structured success payload of one committed mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRecord {
    pub name: String,
    pub categories: BTreeSet<Category>,
    pub pre_snapshot: Snapshot,
    pub debug: Option<DebugArtifacts>,
}

impl MutationRecord {
    /// Serialized form for external persistence/reporting layers, which
    /// only ever see the record as a read-only value.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// What one application attempt produced. `Empty` is the routine
/// "no eligible target" signal, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Outcome {
    Empty,
    Success(MutationRecord),
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn record(&self) -> Option<&MutationRecord> {
        match self {
            Outcome::Empty => None,
            Outcome::Success(record) => Some(record),
        }
    }
}

// Equality contract: all Empty values are equal; Success compares by
// (name, categories, snapshot identity). Debug artifacts are excluded.
impl PartialEq for Outcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Outcome::Empty, Outcome::Empty) => true,
            (Outcome::Success(a), Outcome::Success(b)) => {
                a.name == b.name
                    && a.categories == b.categories
                    && a.pre_snapshot.root_id() == b.pre_snapshot.root_id()
            }
            _ => false,
        }
    }
}

/// Minimal line diff between two renderings, for human inspection only
pub fn render_diff(before: &str, after: &str) -> String {
    let before: Vec<&str> = before.lines().collect();
    let after: Vec<&str> = after.lines().collect();
    let mut out = String::new();
    let max = before.len().max(after.len());
    for i in 0..max {
        match (before.get(i), after.get(i)) {
            (Some(b), Some(a)) if b == a => {}
            (Some(b), Some(a)) => {
                out.push_str(&format!("- {b}\n+ {a}\n"));
            }
            (Some(b), None) => out.push_str(&format!("- {b}\n")),
            (None, Some(a)) => out.push_str(&format!("+ {a}\n")),
            (None, None) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_unit;

    fn snapshot_of_method(source: &str) -> Snapshot {
        let tree = parse_unit(source).unwrap();
        let method = tree.find(|t, id| {
            matches!(t.kind(id), Some(crate::tree::NodeKind::Method { .. }))
        })[0];
        Snapshot::of(&tree, method)
    }

    #[test]
    fn empty_outcomes_are_equal() {
        assert_eq!(Outcome::Empty, Outcome::Empty);
    }

    #[test]
    fn debug_artifacts_do_not_affect_equality() {
        let snapshot = snapshot_of_method("unit U; class C { int f() { return 1; } }");
        let terse = Outcome::Success(MutationRecord {
            name: "neutral-element".into(),
            categories: BTreeSet::from([Category::Arithmetic]),
            pre_snapshot: snapshot.clone(),
            debug: None,
        });
        let verbose = Outcome::Success(MutationRecord {
            name: "neutral-element".into(),
            categories: BTreeSet::from([Category::Arithmetic]),
            pre_snapshot: snapshot.clone(),
            debug: Some(DebugArtifacts {
                diff: "- x\n+ y\n".into(),
                post_snapshot: snapshot,
            }),
        });
        assert_eq!(terse, verbose);
    }

    #[test]
    fn different_names_compare_unequal() {
        let snapshot = snapshot_of_method("unit U; class C { int f() { return 1; } }");
        let a = Outcome::Success(MutationRecord {
            name: "a".into(),
            categories: BTreeSet::new(),
            pre_snapshot: snapshot.clone(),
            debug: None,
        });
        let b = Outcome::Success(MutationRecord {
            name: "b".into(),
            categories: BTreeSet::new(),
            pre_snapshot: snapshot,
            debug: None,
        });
        assert_ne!(a, b);
    }

    #[test]
    fn snapshot_renders_pre_edit_text() {
        let mut tree =
            parse_unit("unit U; class C { int f() { return 1; } }").unwrap();
        let method = tree.find(|t, id| {
            matches!(t.kind(id), Some(crate::tree::NodeKind::Method { .. }))
        })[0];
        let snapshot = Snapshot::of(&tree, method);
        let before = tree.render(method);

        // Mutate the live tree after the snapshot was taken
        let lit = tree.find(|t, id| {
            matches!(t.kind(id), Some(crate::tree::NodeKind::Literal { .. }))
        })[0];
        let zero = tree.add_node(crate::tree::NodeKind::Literal {
            value: crate::tree::LiteralValue::Int(0),
        });
        let sum = tree.add_node(crate::tree::NodeKind::Binary {
            op: crate::tree::BinaryOp::Add,
        });
        tree.replace_in_parent(lit, sum).unwrap();
        tree.set_children(sum, vec![lit, zero]);

        assert_eq!(snapshot.render(), before);
        assert_ne!(tree.render(method), before);
    }

    #[test]
    fn diff_marks_changed_lines() {
        let diff = render_diff("a\nb\n", "a\nc\n");
        assert_eq!(diff, "- b\n+ c\n");
    }

    #[test]
    fn records_serialize_to_json() {
        let record = MutationRecord {
            name: "neutral-element".into(),
            categories: BTreeSet::from([Category::Arithmetic]),
            pre_snapshot: snapshot_of_method("unit U; class C { int f() { return 1; } }"),
            debug: None,
        };
        let json = record.to_json().unwrap();
        assert!(json.contains("\"neutral-element\""));
        assert!(json.contains("Arithmetic"));
    }
}
