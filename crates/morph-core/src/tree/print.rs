// Source reconstruction from the tree, in the spirit of generating source
// back out of a compiled representation. Rendering is deterministic, so
// snapshots taken before an edit compare textually against live subtrees.

use super::{LiteralValue, NodeId, NodeKind, SyntaxTree, Type};

/// Types that can render themselves back to source text
pub trait ToSource {
    fn to_source(&self) -> String;
}

impl ToSource for SyntaxTree {
    fn to_source(&self) -> String {
        self.render(self.root())
    }
}

impl SyntaxTree {
    /// Render a subtree to source text. Statement-level nodes get their own
    /// lines; expressions render inline.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_node(id, 0, &mut out);
        out
    }

    fn render_node(&self, id: NodeId, indent: usize, out: &mut String) {
        let Some(kind) = self.kind(id) else {
            return;
        };
        match kind {
            NodeKind::Unit { name, imports } => {
                out.push_str(&format!("unit {name};\n"));
                for import in imports {
                    out.push_str(&format!("import {import};\n"));
                }
                for &class in self.children(id) {
                    out.push('\n');
                    self.render_node(class, indent, out);
                }
            }
            NodeKind::Class { name } => {
                out.push_str(&format!("class {name} {{\n"));
                let methods = self.children(id);
                for (i, &method) in methods.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    self.render_node(method, indent + 1, out);
                }
                out.push_str("}\n");
            }
            NodeKind::Method {
                name,
                return_type,
                private,
            } => {
                let pad = pad(indent);
                let qualifier = if *private { "private " } else { "" };
                let params = self
                    .method_params(id)
                    .iter()
                    .map(|&p| self.render_expr(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!(
                    "{pad}{qualifier}{} {name}({params}) {{\n",
                    type_name(return_type)
                ));
                if let Some(body) = self.method_body(id) {
                    for &stmt in self.children(body) {
                        self.render_node(stmt, indent + 1, out);
                    }
                }
                out.push_str(&format!("{pad}}}\n"));
            }
            NodeKind::Block => {
                for &stmt in self.children(id) {
                    self.render_node(stmt, indent, out);
                }
            }
            NodeKind::VarDecl { name, ty } => {
                let init = self
                    .children(id)
                    .first()
                    .map(|&e| self.render_expr(e))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "{}{} {name} = {init};\n",
                    pad(indent),
                    type_name(ty)
                ));
            }
            NodeKind::Assign { target } => {
                let value = self
                    .children(id)
                    .first()
                    .map(|&e| self.render_expr(e))
                    .unwrap_or_default();
                out.push_str(&format!("{}{target} = {value};\n", pad(indent)));
            }
            NodeKind::Return => match self.children(id).first() {
                Some(&value) => {
                    out.push_str(&format!("{}return {};\n", pad(indent), self.render_expr(value)))
                }
                None => out.push_str(&format!("{}return;\n", pad(indent))),
            },
            NodeKind::If => {
                let children = self.children(id);
                let pad = pad(indent);
                let cond = children
                    .first()
                    .map(|&c| self.render_expr(c))
                    .unwrap_or_default();
                out.push_str(&format!("{pad}if ({cond}) {{\n"));
                if let Some(&then_block) = children.get(1) {
                    self.render_node(then_block, indent + 1, out);
                }
                if let Some(&else_block) = children.get(2) {
                    out.push_str(&format!("{pad}}} else {{\n"));
                    self.render_node(else_block, indent + 1, out);
                }
                out.push_str(&format!("{pad}}}\n"));
            }
            NodeKind::ExprStmt => {
                let expr = self
                    .children(id)
                    .first()
                    .map(|&e| self.render_expr(e))
                    .unwrap_or_default();
                out.push_str(&format!("{}{expr};\n", pad(indent)));
            }
            NodeKind::Comment { text } => {
                if self.comments_enabled() {
                    out.push_str(&format!("{}// {text}\n", pad(indent)));
                }
            }
            // Expression kinds reached directly (e.g. rendering a snapshot
            // of a bare expression scope)
            NodeKind::Param { .. }
            | NodeKind::Call { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Literal { .. }
            | NodeKind::VarRead { .. }
            | NodeKind::Cast { .. }
            | NodeKind::Thunk => {
                out.push_str(&self.render_expr(id));
            }
        }
    }

    fn render_expr(&self, id: NodeId) -> String {
        let Some(kind) = self.kind(id) else {
            return String::new();
        };
        match kind {
            NodeKind::Param { name, ty } => format!("{} {name}", type_name(ty)),
            NodeKind::Literal { value } => literal_text(value),
            NodeKind::VarRead { name } => name.clone(),
            NodeKind::Binary { op } => {
                let children = self.children(id);
                let left = children
                    .first()
                    .map(|&c| self.render_expr(c))
                    .unwrap_or_default();
                let right = children
                    .get(1)
                    .map(|&c| self.render_expr(c))
                    .unwrap_or_default();
                format!("({left} {op} {right})")
            }
            NodeKind::Call { name } => {
                let args = self
                    .children(id)
                    .iter()
                    .map(|&a| self.render_expr(a))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name}({args})")
            }
            NodeKind::Cast { ty } => {
                let inner = self
                    .children(id)
                    .first()
                    .map(|&c| self.render_expr(c))
                    .unwrap_or_default();
                format!("(({}) {inner})", type_name(ty))
            }
            NodeKind::Thunk => {
                let inner = self
                    .children(id)
                    .first()
                    .map(|&c| self.render_expr(c))
                    .unwrap_or_default();
                format!("(() -> {inner}).call()")
            }
            // Statement-level kinds have no inline rendering
            _ => String::new(),
        }
    }
}

fn pad(indent: usize) -> String {
    "    ".repeat(indent)
}

fn type_name(ty: &Type) -> String {
    ty.to_string()
}

fn literal_text(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Int(v) => v.to_string(),
        LiteralValue::Long(v) => format!("{v}L"),
        LiteralValue::Float(v) => format!("{}f", float_text(*v)),
        LiteralValue::Double(v) => float_text(*v),
        LiteralValue::Bool(v) => v.to_string(),
        LiteralValue::Char(v) => format!("'{v}'"),
        LiteralValue::Str(v) => format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
        LiteralValue::Null => "null".to_string(),
    }
}

// Always keep a decimal point so the literal round-trips as floating
fn float_text(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}
