// Syntax-tree collaborator for the mutation engine.
// The engine consumes this module only through the boundary operations:
// parse, descendant query, deep clone with parent relinking, in-place
// replacement, statement insertion, fragment resolution, import-table
// add/dedup, comment toggle, and pretty-printing.

pub mod lexer;
pub mod parser;
pub mod print;
pub mod resolve;

pub use parser::parse_unit;
pub use print::ToSource;

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tree-level errors
#[derive(thiserror::Error, Debug)]
pub enum TreeError {
    /// Node id is not present in the arena
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Structural edit referenced a node that is not a child of the
    /// given parent
    #[error("Node {child} is not a child of {parent}")]
    NotAChildOf { child: NodeId, parent: NodeId },

    /// Insertion index outside the statement list
    #[error("Index {index} out of bounds for child list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Source text could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A variable read did not resolve to any declaration in scope
    #[error("Unresolved reference '{name}'")]
    UnresolvedReference { name: String },

    /// Operand types incompatible with an operator during fragment
    /// resolution
    #[error("Type mismatch: cannot apply {op} to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: String,
        right: String,
    },

    /// Generic resolution failure
    #[error("Resolution error: {0}")]
    Resolve(String),
}

/// Stable identity of a node. Assigned once when the node is created and
/// preserved by subtree clones, so it plays the reference-identity role in
/// ledgers and result equality.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value types of the mini class language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Long,
    Float,
    Double,
    Bool,
    Char,
    Str,
    Void,
    /// Reference type named after its class
    Ref(String),
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Long | Type::Float | Type::Double)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::Str)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Long => "long",
            Type::Float => "float",
            Type::Double => "double",
            Type::Bool => "bool",
            Type::Char => "char",
            Type::Str => "string",
            Type::Void => "void",
            Type::Ref(name) => name,
        };
        f.write_str(name)
    }
}

/// Literal values; each carries its own type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int(i64),
    Long(i64),
    Float(f64),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

impl LiteralValue {
    /// Static type of the literal. `Null` has no type of its own.
    pub fn ty(&self) -> Option<Type> {
        match self {
            LiteralValue::Int(_) => Some(Type::Int),
            LiteralValue::Long(_) => Some(Type::Long),
            LiteralValue::Float(_) => Some(Type::Float),
            LiteralValue::Double(_) => Some(Type::Double),
            LiteralValue::Bool(_) => Some(Type::Bool),
            LiteralValue::Char(_) => Some(Type::Char),
            LiteralValue::Str(_) => Some(Type::Str),
            LiteralValue::Null => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        f.write_str(s)
    }
}

/// Closed set of node kinds. Every consumer matches exhaustively, so a new
/// kind fails to compile until each mutation handles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Compilation unit; owns the import table. Children are classes.
    Unit { name: String, imports: Vec<String> },
    /// Class declaration. Children are methods.
    Class { name: String },
    /// Method declaration. Children are the parameters followed by one
    /// body block.
    Method {
        name: String,
        return_type: Type,
        private: bool,
    },
    /// Formal parameter
    Param { name: String, ty: Type },
    /// Statement list. Children are statements.
    Block,
    /// Local declaration with initializer child
    VarDecl { name: String, ty: Type },
    /// Assignment to a named variable; one value child
    Assign { target: String },
    /// Return statement with optional value child
    Return,
    /// Children: condition, then-block, optional else-block
    If,
    /// Expression in statement position; one child
    ExprStmt,
    /// Zero-or-more argument children
    Call { name: String },
    /// Two children: left, right
    Binary { op: BinaryOp },
    Literal { value: LiteralValue },
    VarRead { name: String },
    /// Explicit cast; one expression child
    Cast { ty: Type },
    /// Zero-argument closure wrapping one expression, invoked where it
    /// stands
    Thunk,
    /// Line comment in statement position
    Comment { text: String },
}

/// One parent-linked node in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// Arena of parent-linked nodes with stable ids.
///
/// All structural edits go through this type so parent links stay
/// consistent. Node enumeration is preorder from the root, which makes
/// candidate pools deterministic for a given tree shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: IndexMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    comments_enabled: bool,
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            root: NodeId(0),
            next_id: 0,
            comments_enabled: true,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the pretty-printer emits comment nodes
    pub fn comments_enabled(&self) -> bool {
        self.comments_enabled
    }

    pub fn set_comments_enabled(&mut self, enabled: bool) {
        self.comments_enabled = enabled;
    }

    /// Allocate a leaf node
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                parent: None,
                kind,
                children: Vec::new(),
            },
        );
        id
    }

    /// Allocate a node and attach children in order
    pub fn add_with_children(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let id = self.add_node(kind);
        self.set_children(id, children);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|n| &n.kind)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(&id).map(|n| &mut n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Overwrite a node's child list, reparenting every new child
    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = Some(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
    }

    /// Insert a child at an index, shifting later children right
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        let len = self.children(parent).len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        } else {
            return Err(TreeError::NodeNotFound(child));
        }
        match self.nodes.get_mut(&parent) {
            Some(node) => {
                node.children.insert(index, child);
                Ok(())
            }
            None => Err(TreeError::NodeNotFound(parent)),
        }
    }

    /// Replace `old` with `new` in old's parent slot. `old` is detached but
    /// stays in the arena, so the caller can reattach it (typically as a
    /// child of `new`).
    pub fn replace_in_parent(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        let parent = self
            .parent(old)
            .ok_or(TreeError::NodeNotFound(old))?;
        let pos = self
            .children(parent)
            .iter()
            .position(|&c| c == old)
            .ok_or(TreeError::NotAChildOf { child: old, parent })?;
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children[pos] = new;
        }
        if let Some(node) = self.nodes.get_mut(&new) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&old) {
            node.parent = None;
        }
        Ok(())
    }

    /// Detach a node from its parent's child list
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(id).ok_or(TreeError::NodeNotFound(id))?;
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
        Ok(())
    }

    /// Detach a subtree and drop all of its nodes from the arena
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<(), TreeError> {
        if self.parent(id).is_some() {
            self.detach(id)?;
        }
        for node in self.descendants(id) {
            self.nodes.shift_remove(&node);
        }
        Ok(())
    }

    /// Preorder enumeration of a subtree, including `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.nodes.contains_key(&current) {
                out.push(current);
                for &child in self.children(current).iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// All descendants of the root satisfying a predicate, in preorder
    pub fn find(&self, pred: impl Fn(&SyntaxTree, NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| pred(self, id))
            .collect()
    }

    /// Deep clone of a subtree into a standalone tree. Node ids are
    /// preserved and parent links relinked; the clone's root has no parent.
    pub fn clone_subtree(&self, id: NodeId) -> SyntaxTree {
        let mut nodes = IndexMap::new();
        for node_id in self.descendants(id) {
            if let Some(node) = self.nodes.get(&node_id) {
                let mut node = node.clone();
                if node_id == id {
                    node.parent = None;
                }
                nodes.insert(node_id, node);
            }
        }
        SyntaxTree {
            nodes,
            root: id,
            next_id: self.next_id,
            comments_enabled: self.comments_enabled,
        }
    }

    /// Nearest enclosing method of a node, if any (a method encloses
    /// itself)
    pub fn enclosing_method(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if matches!(self.kind(node_id), Some(NodeKind::Method { .. })) {
                return Some(node_id);
            }
            current = self.parent(node_id);
        }
        None
    }

    /// Body block of a method
    pub fn method_body(&self, method: NodeId) -> Option<NodeId> {
        self.children(method)
            .iter()
            .copied()
            .find(|&c| matches!(self.kind(c), Some(NodeKind::Block)))
    }

    /// Parameter nodes of a method, in declaration order
    pub fn method_params(&self, method: NodeId) -> Vec<NodeId> {
        self.children(method)
            .iter()
            .copied()
            .filter(|&c| matches!(self.kind(c), Some(NodeKind::Param { .. })))
            .collect()
    }

    /// Index of the first `return` in a block's statement list, or the
    /// list length when there is none. Insertions at or before this index
    /// never create unreachable code.
    pub fn first_terminal_index(&self, block: NodeId) -> usize {
        let children = self.children(block);
        children
            .iter()
            .position(|&c| matches!(self.kind(c), Some(NodeKind::Return)))
            .unwrap_or(children.len())
    }

    /// Whether the subtree contains a return statement
    pub fn contains_return(&self, id: NodeId) -> bool {
        self.descendants(id)
            .iter()
            .any(|&n| matches!(self.kind(n), Some(NodeKind::Return)))
    }

    /// All comment nodes in the tree
    pub fn comments(&self) -> Vec<NodeId> {
        self.find(|tree, id| matches!(tree.kind(id), Some(NodeKind::Comment { .. })))
    }

    /// Import table of the unit node
    pub fn imports(&self, unit: NodeId) -> &[String] {
        match self.kind(unit) {
            Some(NodeKind::Unit { imports, .. }) => imports,
            _ => &[],
        }
    }

    /// Add an import to the unit, deduplicated. Repeated application never
    /// duplicates the entry.
    pub fn add_import(&mut self, unit: NodeId, path: &str) {
        if let Some(NodeKind::Unit { imports, .. }) = self.kind_mut(unit) {
            if !imports.iter().any(|existing| existing == path) {
                imports.push(path.to_string());
            }
        }
    }

    /// Every identifier declared or referenced anywhere in the tree; used
    /// for collision checks when generating fresh names.
    pub fn identifiers(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        for id in self.descendants(self.root) {
            match self.kind(id) {
                Some(NodeKind::Unit { name, .. })
                | Some(NodeKind::Class { name })
                | Some(NodeKind::Method { name, .. })
                | Some(NodeKind::Param { name, .. })
                | Some(NodeKind::VarDecl { name, .. })
                | Some(NodeKind::VarRead { name })
                | Some(NodeKind::Call { name }) => {
                    names.insert(name.clone());
                }
                Some(NodeKind::Assign { target }) => {
                    names.insert(target.clone());
                }
                _ => {}
            }
        }
        names
    }

    /// Declared type of a named variable within a method (parameters and
    /// locals)
    pub fn variable_type(&self, method: NodeId, name: &str) -> Option<Type> {
        for id in self.descendants(method) {
            match self.kind(id) {
                Some(NodeKind::Param { name: n, ty }) if n == name => return Some(ty.clone()),
                Some(NodeKind::VarDecl { name: n, ty }) if n == name => return Some(ty.clone()),
                _ => {}
            }
        }
        None
    }

    /// Static type of an expression node, where one can be derived
    pub fn expr_type(&self, id: NodeId) -> Option<Type> {
        match self.kind(id)? {
            NodeKind::Literal { value } => value.ty(),
            NodeKind::VarRead { name } => {
                let method = self.enclosing_method(id)?;
                self.variable_type(method, name)
            }
            NodeKind::Binary { op } => {
                if op.is_comparison() || op.is_logical() {
                    return Some(Type::Bool);
                }
                let children = self.children(id);
                let left = self.expr_type(*children.first()?);
                let right = children.get(1).and_then(|&r| self.expr_type(r));
                promote(left, right)
            }
            NodeKind::Cast { ty } => Some(ty.clone()),
            NodeKind::Thunk => self.children(id).first().and_then(|&c| self.expr_type(c)),
            NodeKind::Call { name } => {
                let target = self.find(|tree, n| {
                    matches!(tree.kind(n), Some(NodeKind::Method { name: m, .. }) if m == name)
                });
                match self.kind(*target.first()?) {
                    Some(NodeKind::Method { return_type, .. }) => Some(return_type.clone()),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Usual numeric promotion; string concatenation absorbs the other side,
/// same-rank operands keep their type
fn promote(left: Option<Type>, right: Option<Type>) -> Option<Type> {
    match (left, right) {
        (Some(Type::Str), _) | (_, Some(Type::Str)) => Some(Type::Str),
        (Some(Type::Double), _) | (_, Some(Type::Double)) => Some(Type::Double),
        (Some(Type::Float), _) | (_, Some(Type::Float)) => Some(Type::Float),
        (Some(Type::Long), _) | (_, Some(Type::Long)) => Some(Type::Long),
        (Some(left), Some(_)) => Some(left),
        (left, None) => left,
        (None, right) => right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (SyntaxTree, NodeId, NodeId) {
        let mut tree = SyntaxTree::new();
        let lit = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Int(1),
        });
        let ret = tree.add_with_children(NodeKind::Return, vec![lit]);
        let block = tree.add_with_children(NodeKind::Block, vec![ret]);
        let method = tree.add_with_children(
            NodeKind::Method {
                name: "f".into(),
                return_type: Type::Int,
                private: false,
            },
            vec![block],
        );
        let class = tree.add_with_children(NodeKind::Class { name: "C".into() }, vec![method]);
        let unit = tree.add_with_children(
            NodeKind::Unit {
                name: "U".into(),
                imports: Vec::new(),
            },
            vec![class],
        );
        tree.set_root(unit);
        (tree, method, lit)
    }

    #[test]
    fn descendants_are_preorder() {
        let (tree, method, _) = small_tree();
        let order = tree.descendants(tree.root());
        assert_eq!(order[0], tree.root());
        let method_pos = order.iter().position(|&n| n == method).unwrap();
        let body_pos = order
            .iter()
            .position(|&n| Some(n) == tree.method_body(method))
            .unwrap();
        assert!(method_pos < body_pos);
    }

    #[test]
    fn replace_in_parent_relinks_both_sides() {
        let (mut tree, _, lit) = small_tree();
        let parent = tree.parent(lit).unwrap();
        let zero = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Int(0),
        });
        let wrapped = tree.add_node(NodeKind::Binary { op: BinaryOp::Add });
        tree.replace_in_parent(lit, wrapped).unwrap();
        tree.set_children(wrapped, vec![lit, zero]);

        assert_eq!(tree.parent(wrapped), Some(parent));
        assert_eq!(tree.parent(lit), Some(wrapped));
        assert_eq!(tree.children(wrapped), &[lit, zero]);
    }

    #[test]
    fn clone_subtree_preserves_ids_and_detaches_root() {
        let (tree, method, lit) = small_tree();
        let clone = tree.clone_subtree(method);
        assert_eq!(clone.root(), method);
        assert_eq!(clone.parent(method), None);
        assert!(clone.node(lit).is_some());
        // The live tree is untouched
        assert!(tree.parent(method).is_some());
    }

    #[test]
    fn add_import_deduplicates() {
        let (mut tree, _, _) = small_tree();
        let unit = tree.root();
        tree.add_import(unit, "lang.functional.Thunk");
        tree.add_import(unit, "lang.functional.Thunk");
        assert_eq!(tree.imports(unit).len(), 1);
    }

    #[test]
    fn first_terminal_index_stops_at_return() {
        let (tree, method, _) = small_tree();
        let block = tree.method_body(method).unwrap();
        assert_eq!(tree.first_terminal_index(block), 0);
    }

    #[test]
    fn expr_type_covers_same_rank_sums() {
        let mut tree = SyntaxTree::new();
        let one = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Int(1),
        });
        let two = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Int(2),
        });
        let inner = tree.add_with_children(NodeKind::Binary { op: BinaryOp::Add }, vec![one, two]);
        let three = tree.add_node(NodeKind::Literal {
            value: LiteralValue::Int(3),
        });
        let outer =
            tree.add_with_children(NodeKind::Binary { op: BinaryOp::Add }, vec![inner, three]);
        tree.set_root(outer);
        assert_eq!(tree.expr_type(inner), Some(Type::Int));
        assert_eq!(tree.expr_type(outer), Some(Type::Int));
        // Widening still wins over same-rank
        assert_eq!(
            promote(Some(Type::Int), Some(Type::Double)),
            Some(Type::Double)
        );
    }

    #[test]
    fn expr_type_resolves_variable_reads() {
        let mut tree = SyntaxTree::new();
        let read = tree.add_node(NodeKind::VarRead { name: "a".into() });
        let ret = tree.add_with_children(NodeKind::Return, vec![read]);
        let block = tree.add_with_children(NodeKind::Block, vec![ret]);
        let param = tree.add_node(NodeKind::Param {
            name: "a".into(),
            ty: Type::Double,
        });
        let method = tree.add_with_children(
            NodeKind::Method {
                name: "f".into(),
                return_type: Type::Double,
                private: false,
            },
            vec![param, block],
        );
        tree.set_root(method);
        assert_eq!(tree.expr_type(read), Some(Type::Double));
    }
}
