// Hand-rolled lexer for the mini class language. Line comments are kept as
// tokens so the parser can place them in statement position.

use super::TreeError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Keyword(Keyword),
    Int(i64),
    Long(i64),
    Float(f64),
    Double(f64),
    Str(String),
    Char(char),
    Comment(String),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Unit,
    Import,
    Class,
    Private,
    If,
    Else,
    Return,
    True,
    False,
    Null,
    Int,
    Long,
    Float,
    Double,
    Bool,
    Char,
    Str,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
    Dot,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Arrow,
}

/// Token plus the 1-based source line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

fn keyword(word: &str) -> Option<Keyword> {
    let kw = match word {
        "unit" => Keyword::Unit,
        "import" => Keyword::Import,
        "class" => Keyword::Class,
        "private" => Keyword::Private,
        "if" => Keyword::If,
        "else" => Keyword::Else,
        "return" => Keyword::Return,
        "true" => Keyword::True,
        "false" => Keyword::False,
        "null" => Keyword::Null,
        "int" => Keyword::Int,
        "long" => Keyword::Long,
        "float" => Keyword::Float,
        "double" => Keyword::Double,
        "bool" => Keyword::Bool,
        "char" => Keyword::Char,
        "string" => Keyword::Str,
        "void" => Keyword::Void,
        _ => return None,
    };
    Some(kw)
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, TreeError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0;
    let mut line = 1;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            '\n' => {
                line += 1;
                pos += 1;
            }
            c if c.is_whitespace() => pos += 1,
            '/' if chars.get(pos + 1) == Some(&'/') => {
                let start = pos + 2;
                let mut end = start;
                while end < chars.len() && chars[end] != '\n' {
                    end += 1;
                }
                let text: String = chars[start..end].iter().collect();
                tokens.push(Spanned {
                    token: Token::Comment(text.trim().to_string()),
                    line,
                });
                pos = end;
            }
            c if c.is_ascii_digit() => {
                let start = pos;
                let mut end = pos;
                let mut is_float = false;
                while end < chars.len()
                    && (chars[end].is_ascii_digit()
                        || (chars[end] == '.'
                            && !is_float
                            && chars.get(end + 1).is_some_and(|d| d.is_ascii_digit())))
                {
                    if chars[end] == '.' {
                        is_float = true;
                    }
                    end += 1;
                }
                let text: String = chars[start..end].iter().collect();
                let suffix = chars.get(end).copied();
                let token = match (is_float, suffix) {
                    (true, Some('f')) | (true, Some('F')) => {
                        end += 1;
                        Token::Float(parse_num(&text, line)?)
                    }
                    (true, _) => Token::Double(parse_num(&text, line)?),
                    (false, Some('L')) | (false, Some('l')) => {
                        end += 1;
                        Token::Long(parse_num(&text, line)?)
                    }
                    (false, Some('f')) | (false, Some('F')) => {
                        end += 1;
                        Token::Float(parse_num(&text, line)?)
                    }
                    (false, _) => Token::Int(parse_num(&text, line)?),
                };
                tokens.push(Spanned { token, line });
                pos = end;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                let mut end = pos;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let word: String = chars[start..end].iter().collect();
                let token = match keyword(&word) {
                    Some(kw) => Token::Keyword(kw),
                    None => Token::Ident(word),
                };
                tokens.push(Spanned { token, line });
                pos = end;
            }
            '"' => {
                let mut end = pos + 1;
                let mut text = String::new();
                while end < chars.len() && chars[end] != '"' {
                    if chars[end] == '\\' && end + 1 < chars.len() {
                        text.push(unescape(chars[end + 1]));
                        end += 2;
                    } else {
                        text.push(chars[end]);
                        end += 1;
                    }
                }
                if end >= chars.len() {
                    return Err(TreeError::Parse {
                        line,
                        message: "unterminated string literal".into(),
                    });
                }
                tokens.push(Spanned {
                    token: Token::Str(text),
                    line,
                });
                pos = end + 1;
            }
            '\'' => {
                let (ch, consumed) = match (chars.get(pos + 1), chars.get(pos + 2)) {
                    (Some('\\'), Some(&escaped)) => (unescape(escaped), 4),
                    (Some(&ch), _) => (ch, 3),
                    _ => {
                        return Err(TreeError::Parse {
                            line,
                            message: "unterminated char literal".into(),
                        })
                    }
                };
                if chars.get(pos + consumed - 1) != Some(&'\'') {
                    return Err(TreeError::Parse {
                        line,
                        message: "unterminated char literal".into(),
                    });
                }
                tokens.push(Spanned {
                    token: Token::Char(ch),
                    line,
                });
                pos += consumed;
            }
            _ => {
                let (punct, consumed) = match (c, chars.get(pos + 1)) {
                    ('=', Some('=')) => (Punct::EqEq, 2),
                    ('!', Some('=')) => (Punct::NotEq, 2),
                    ('<', Some('=')) => (Punct::Le, 2),
                    ('>', Some('=')) => (Punct::Ge, 2),
                    ('&', Some('&')) => (Punct::AndAnd, 2),
                    ('|', Some('|')) => (Punct::OrOr, 2),
                    ('-', Some('>')) => (Punct::Arrow, 2),
                    ('(', _) => (Punct::LParen, 1),
                    (')', _) => (Punct::RParen, 1),
                    ('{', _) => (Punct::LBrace, 1),
                    ('}', _) => (Punct::RBrace, 1),
                    (';', _) => (Punct::Semi, 1),
                    (',', _) => (Punct::Comma, 1),
                    ('.', _) => (Punct::Dot, 1),
                    ('=', _) => (Punct::Assign, 1),
                    ('+', _) => (Punct::Plus, 1),
                    ('-', _) => (Punct::Minus, 1),
                    ('*', _) => (Punct::Star, 1),
                    ('/', _) => (Punct::Slash, 1),
                    ('%', _) => (Punct::Percent, 1),
                    ('<', _) => (Punct::Lt, 1),
                    ('>', _) => (Punct::Gt, 1),
                    _ => {
                        return Err(TreeError::Parse {
                            line,
                            message: format!("unexpected character '{c}'"),
                        })
                    }
                };
                tokens.push(Spanned {
                    token: Token::Punct(punct),
                    line,
                });
                pos += consumed;
            }
        }
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
    });
    Ok(tokens)
}

fn parse_num<T: std::str::FromStr>(text: &str, line: usize) -> Result<T, TreeError> {
    text.parse().map_err(|_| TreeError::Parse {
        line,
        message: format!("malformed numeric literal '{text}'"),
    })
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}
