// Recursive-descent parser for the mini class language.
//
// Grammar, roughly:
//   unit   := "unit" IDENT ";" import* class* EOF
//   import := "import" dotted ";"
//   class  := "class" IDENT "{" method* "}"
//   method := "private"? type IDENT "(" (param ("," param)*)? ")" block
//   block  := "{" stmt* "}"
//   stmt   := comment | vardecl | return | if | assign | exprstmt
//
// Node ids are allocated in parse order, so parsing the same text twice
// yields identical ids. Reproducible selection depends on this.

use super::lexer::{tokenize, Keyword, Punct, Spanned, Token};
use super::{BinaryOp, LiteralValue, NodeId, NodeKind, SyntaxTree, TreeError, Type};

/// Parse a full compilation unit into a tree
pub fn parse_unit(source: &str) -> Result<SyntaxTree, TreeError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        tree: SyntaxTree::new(),
    };
    let root = parser.unit()?;
    parser.expect_eof()?;
    parser.tree.set_root(root);
    Ok(parser.tree)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    tree: SyntaxTree,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek2(&self) -> &Token {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].token
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].line
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].token.clone();
        self.pos += 1;
        token
    }

    // Errors point at the offending token, so its line must be captured
    // before advance() moves past it.
    fn error(&self, message: impl Into<String>) -> TreeError {
        self.error_at(self.line(), message)
    }

    fn error_at(&self, line: usize, message: impl Into<String>) -> TreeError {
        TreeError::Parse {
            line,
            message: message.into(),
        }
    }

    fn expect_punct(&mut self, expected: Punct) -> Result<(), TreeError> {
        let line = self.line();
        match self.advance() {
            Token::Punct(p) if p == expected => Ok(()),
            other => Err(self.error_at(line, format!("expected {expected:?}, found {other:?}"))),
        }
    }

    fn expect_keyword(&mut self, expected: Keyword) -> Result<(), TreeError> {
        let line = self.line();
        match self.advance() {
            Token::Keyword(kw) if kw == expected => Ok(()),
            other => Err(self.error_at(line, format!("expected {expected:?}, found {other:?}"))),
        }
    }

    fn expect_ident(&mut self) -> Result<String, TreeError> {
        let line = self.line();
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => Err(self.error_at(line, format!("expected identifier, found {other:?}"))),
        }
    }

    fn expect_eof(&mut self) -> Result<(), TreeError> {
        match self.peek() {
            Token::Eof => Ok(()),
            other => Err(self.error(format!("trailing input: {other:?}"))),
        }
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.peek() == &Token::Punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unit(&mut self) -> Result<NodeId, TreeError> {
        self.expect_keyword(Keyword::Unit)?;
        let name = self.expect_ident()?;
        self.expect_punct(Punct::Semi)?;

        let mut imports = Vec::new();
        while self.peek() == &Token::Keyword(Keyword::Import) {
            self.advance();
            imports.push(self.dotted_path()?);
            self.expect_punct(Punct::Semi)?;
        }

        let mut classes = Vec::new();
        while self.peek() == &Token::Keyword(Keyword::Class) {
            classes.push(self.class()?);
        }

        Ok(self
            .tree
            .add_with_children(NodeKind::Unit { name, imports }, classes))
    }

    fn dotted_path(&mut self) -> Result<String, TreeError> {
        let mut path = self.segment()?;
        while self.eat_punct(Punct::Dot) {
            path.push('.');
            path.push_str(&self.segment()?);
        }
        Ok(path)
    }

    // Import segments may collide with type keywords ("string" etc.)
    fn segment(&mut self) -> Result<String, TreeError> {
        let line = self.line();
        match self.advance() {
            Token::Ident(name) => Ok(name),
            Token::Keyword(kw) => Ok(format!("{kw:?}").to_lowercase()),
            other => Err(self.error_at(line, format!("expected path segment, found {other:?}"))),
        }
    }

    fn class(&mut self) -> Result<NodeId, TreeError> {
        self.expect_keyword(Keyword::Class)?;
        let name = self.expect_ident()?;
        self.expect_punct(Punct::LBrace)?;
        let mut methods = Vec::new();
        while self.peek() != &Token::Punct(Punct::RBrace) {
            methods.push(self.method()?);
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(self.tree.add_with_children(NodeKind::Class { name }, methods))
    }

    fn method(&mut self) -> Result<NodeId, TreeError> {
        let private = if self.peek() == &Token::Keyword(Keyword::Private) {
            self.advance();
            true
        } else {
            false
        };
        let return_type = self.type_name()?;
        let name = self.expect_ident()?;
        self.expect_punct(Punct::LParen)?;

        let mut children = Vec::new();
        if self.peek() != &Token::Punct(Punct::RParen) {
            loop {
                let ty = self.type_name()?;
                let param_name = self.expect_ident()?;
                children.push(self.tree.add_node(NodeKind::Param {
                    name: param_name,
                    ty,
                }));
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen)?;
        children.push(self.block()?);

        Ok(self.tree.add_with_children(
            NodeKind::Method {
                name,
                return_type,
                private,
            },
            children,
        ))
    }

    fn type_name(&mut self) -> Result<Type, TreeError> {
        let line = self.line();
        match self.advance() {
            Token::Keyword(Keyword::Int) => Ok(Type::Int),
            Token::Keyword(Keyword::Long) => Ok(Type::Long),
            Token::Keyword(Keyword::Float) => Ok(Type::Float),
            Token::Keyword(Keyword::Double) => Ok(Type::Double),
            Token::Keyword(Keyword::Bool) => Ok(Type::Bool),
            Token::Keyword(Keyword::Char) => Ok(Type::Char),
            Token::Keyword(Keyword::Str) => Ok(Type::Str),
            Token::Keyword(Keyword::Void) => Ok(Type::Void),
            Token::Ident(name) => Ok(Type::Ref(name)),
            other => Err(self.error_at(line, format!("expected type, found {other:?}"))),
        }
    }

    fn is_type_token(token: &Token) -> bool {
        matches!(
            token,
            Token::Keyword(
                Keyword::Int
                    | Keyword::Long
                    | Keyword::Float
                    | Keyword::Double
                    | Keyword::Bool
                    | Keyword::Char
                    | Keyword::Str
                    | Keyword::Void
            )
        )
    }

    fn block(&mut self) -> Result<NodeId, TreeError> {
        self.expect_punct(Punct::LBrace)?;
        let mut stmts = Vec::new();
        while self.peek() != &Token::Punct(Punct::RBrace) {
            stmts.push(self.statement()?);
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(self.tree.add_with_children(NodeKind::Block, stmts))
    }

    fn statement(&mut self) -> Result<NodeId, TreeError> {
        match self.peek().clone() {
            Token::Comment(text) => {
                self.advance();
                Ok(self.tree.add_node(NodeKind::Comment { text }))
            }
            Token::Keyword(Keyword::Return) => {
                self.advance();
                let children = if self.peek() == &Token::Punct(Punct::Semi) {
                    Vec::new()
                } else {
                    vec![self.expression()?]
                };
                self.expect_punct(Punct::Semi)?;
                Ok(self.tree.add_with_children(NodeKind::Return, children))
            }
            Token::Keyword(Keyword::If) => {
                self.advance();
                self.expect_punct(Punct::LParen)?;
                let cond = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                let then_block = self.block()?;
                let mut children = vec![cond, then_block];
                if self.peek() == &Token::Keyword(Keyword::Else) {
                    self.advance();
                    children.push(self.block()?);
                }
                Ok(self.tree.add_with_children(NodeKind::If, children))
            }
            token if Self::is_type_token(&token) => {
                let ty = self.type_name()?;
                let name = self.expect_ident()?;
                self.expect_punct(Punct::Assign)?;
                let init = self.expression()?;
                self.expect_punct(Punct::Semi)?;
                Ok(self
                    .tree
                    .add_with_children(NodeKind::VarDecl { name, ty }, vec![init]))
            }
            Token::Ident(name) if self.peek2() == &Token::Punct(Punct::Assign) => {
                self.advance();
                self.advance();
                let value = self.expression()?;
                self.expect_punct(Punct::Semi)?;
                Ok(self
                    .tree
                    .add_with_children(NodeKind::Assign { target: name }, vec![value]))
            }
            _ => {
                let expr = self.expression()?;
                self.expect_punct(Punct::Semi)?;
                Ok(self.tree.add_with_children(NodeKind::ExprStmt, vec![expr]))
            }
        }
    }

    fn expression(&mut self) -> Result<NodeId, TreeError> {
        self.binary_expr(0)
    }

    // Precedence-climbing over the binary operator table
    fn binary_expr(&mut self, min_prec: u8) -> Result<NodeId, TreeError> {
        let mut left = self.primary()?;
        while let Some((op, prec)) = self.peek_binary_op() {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.binary_expr(prec + 1)?;
            left = self
                .tree
                .add_with_children(NodeKind::Binary { op }, vec![left, right]);
        }
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, u8)> {
        let op = match self.peek() {
            Token::Punct(Punct::OrOr) => (BinaryOp::Or, 1),
            Token::Punct(Punct::AndAnd) => (BinaryOp::And, 2),
            Token::Punct(Punct::EqEq) => (BinaryOp::Eq, 3),
            Token::Punct(Punct::NotEq) => (BinaryOp::Ne, 3),
            Token::Punct(Punct::Lt) => (BinaryOp::Lt, 3),
            Token::Punct(Punct::Gt) => (BinaryOp::Gt, 3),
            Token::Punct(Punct::Le) => (BinaryOp::Le, 3),
            Token::Punct(Punct::Ge) => (BinaryOp::Ge, 3),
            Token::Punct(Punct::Plus) => (BinaryOp::Add, 4),
            Token::Punct(Punct::Minus) => (BinaryOp::Sub, 4),
            Token::Punct(Punct::Star) => (BinaryOp::Mul, 5),
            Token::Punct(Punct::Slash) => (BinaryOp::Div, 5),
            Token::Punct(Punct::Percent) => (BinaryOp::Mod, 5),
            _ => return None,
        };
        Some(op)
    }

    fn primary(&mut self) -> Result<NodeId, TreeError> {
        let line = self.line();
        match self.advance() {
            Token::Int(v) => Ok(self.literal(LiteralValue::Int(v))),
            Token::Long(v) => Ok(self.literal(LiteralValue::Long(v))),
            Token::Float(v) => Ok(self.literal(LiteralValue::Float(v))),
            Token::Double(v) => Ok(self.literal(LiteralValue::Double(v))),
            Token::Str(v) => Ok(self.literal(LiteralValue::Str(v))),
            Token::Char(v) => Ok(self.literal(LiteralValue::Char(v))),
            Token::Keyword(Keyword::True) => Ok(self.literal(LiteralValue::Bool(true))),
            Token::Keyword(Keyword::False) => Ok(self.literal(LiteralValue::Bool(false))),
            Token::Keyword(Keyword::Null) => Ok(self.literal(LiteralValue::Null)),
            Token::Punct(Punct::LParen) => {
                // `(() -> expr).call()` is an invoked thunk, `((type) expr)`
                // a cast; anything else is plain grouping.
                if self.peek() == &Token::Punct(Punct::LParen)
                    && self.peek2() == &Token::Punct(Punct::RParen)
                    && self.peek_at(2) == &Token::Punct(Punct::Arrow)
                {
                    self.advance();
                    self.advance();
                    self.advance();
                    let inner = self.expression()?;
                    self.expect_punct(Punct::RParen)?;
                    self.expect_punct(Punct::Dot)?;
                    let call_line = self.line();
                    let call = self.expect_ident()?;
                    if call != "call" {
                        return Err(
                            self.error_at(call_line, format!("expected 'call', found '{call}'"))
                        );
                    }
                    self.expect_punct(Punct::LParen)?;
                    self.expect_punct(Punct::RParen)?;
                    return Ok(self.tree.add_with_children(NodeKind::Thunk, vec![inner]));
                }
                if self.peek() == &Token::Punct(Punct::LParen)
                    && Self::is_type_token(self.peek2())
                    && self.peek_at(2) == &Token::Punct(Punct::RParen)
                {
                    self.advance();
                    let ty = self.type_name()?;
                    self.expect_punct(Punct::RParen)?;
                    let inner = self.expression()?;
                    self.expect_punct(Punct::RParen)?;
                    return Ok(self.tree.add_with_children(NodeKind::Cast { ty }, vec![inner]));
                }
                let inner = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.eat_punct(Punct::LParen) {
                    let mut args = Vec::new();
                    if self.peek() != &Token::Punct(Punct::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.eat_punct(Punct::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_punct(Punct::RParen)?;
                    Ok(self.tree.add_with_children(NodeKind::Call { name }, args))
                } else {
                    Ok(self.tree.add_node(NodeKind::VarRead { name }))
                }
            }
            other => Err(self.error_at(line, format!("expected expression, found {other:?}"))),
        }
    }

    fn literal(&mut self, value: LiteralValue) -> NodeId {
        self.tree.add_node(NodeKind::Literal { value })
    }
}
