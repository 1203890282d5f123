//! Text form of predicates.
//!
//! Grammar (lowercase keywords, `and` binds tighter than `or`):
//!
//! ```text
//! expr       := and_expr ( "or" and_expr )*
//! and_expr   := unary ( "and" unary )*
//! unary      := "not" unary | primary
//! primary    := "(" expr ")" | comparison
//! comparison := field ( "==" | "!=" | "contains" | "<" | "<=" | ">" | ">=" ) literal
//! literal    := "\"" text "\"" | integer
//! ```
//!
//! Exactly one top-level expression is accepted: leftover tokens after the
//! first expression fail with [`QueryError::TrailingInput`], so procedural
//! multi-expression filter bodies are rejected at construction time.
//! A doubled quote inside a string literal encodes one literal quote.

use crate::model::schema::RecordSchema;
use crate::query::expr::{field, int, not, text, Expr};
use crate::query::{Predicate, QueryError};

const KEYWORDS: &[&str] = &["and", "or", "not", "contains"];

/// Parses predicate text and validates it against `schema`.
pub fn parse_predicate(
    schema: &'static RecordSchema,
    input: &str,
) -> Result<Predicate, QueryError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let expr = parser.parse_expr()?;
    if let Some(token) = parser.peek() {
        return Err(QueryError::TrailingInput {
            position: token.position,
        });
    }
    Predicate::new(schema, expr)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Text(String),
    Integer(i64),
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, ch) = chars[i];
        match ch {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push(Token {
                    kind: TokenKind::LParen,
                    position,
                });
                i += 1;
            }
            ')' => {
                tokens.push(Token {
                    kind: TokenKind::RParen,
                    position,
                });
                i += 1;
            }
            '=' => {
                if chars.get(i + 1).map(|(_, c)| *c) == Some('=') {
                    tokens.push(Token {
                        kind: TokenKind::EqEq,
                        position,
                    });
                    i += 2;
                } else {
                    return Err(QueryError::Syntax {
                        position,
                        message: "expected `==`".to_string(),
                    });
                }
            }
            '!' => {
                if chars.get(i + 1).map(|(_, c)| *c) == Some('=') {
                    tokens.push(Token {
                        kind: TokenKind::NotEq,
                        position,
                    });
                    i += 2;
                } else {
                    return Err(QueryError::Syntax {
                        position,
                        message: "expected `!=`".to_string(),
                    });
                }
            }
            '<' => {
                if chars.get(i + 1).map(|(_, c)| *c) == Some('=') {
                    tokens.push(Token {
                        kind: TokenKind::Le,
                        position,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Lt,
                        position,
                    });
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1).map(|(_, c)| *c) == Some('=') {
                    tokens.push(Token {
                        kind: TokenKind::Ge,
                        position,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Gt,
                        position,
                    });
                    i += 1;
                }
            }
            '"' => {
                let mut value = String::new();
                let mut j = i + 1;
                loop {
                    let Some((_, c)) = chars.get(j).copied() else {
                        return Err(QueryError::Syntax {
                            position,
                            message: "unterminated string literal".to_string(),
                        });
                    };
                    if c == '"' {
                        if chars.get(j + 1).map(|(_, next)| *next) == Some('"') {
                            value.push('"');
                            j += 2;
                            continue;
                        }
                        break;
                    }
                    value.push(c);
                    j += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Text(value),
                    position,
                });
                i = j + 1;
            }
            '-' | '0'..='9' => {
                let mut j = i;
                if ch == '-' {
                    j += 1;
                    if !matches!(chars.get(j), Some((_, c)) if c.is_ascii_digit()) {
                        return Err(QueryError::Syntax {
                            position,
                            message: "expected digits after `-`".to_string(),
                        });
                    }
                }
                while matches!(chars.get(j), Some((_, c)) if c.is_ascii_digit()) {
                    j += 1;
                }
                let raw: String = chars[i..j].iter().map(|(_, c)| *c).collect();
                let value = raw.parse::<i64>().map_err(|_| QueryError::Syntax {
                    position,
                    message: format!("integer literal `{raw}` out of range"),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Integer(value),
                    position,
                });
                i = j;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut j = i;
                while matches!(
                    chars.get(j),
                    Some((_, c)) if c.is_ascii_alphanumeric() || *c == '_'
                ) {
                    j += 1;
                }
                let name: String = chars[i..j].iter().map(|(_, c)| *c).collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(name),
                    position,
                });
                i = j;
            }
            other => {
                return Err(QueryError::Syntax {
                    position,
                    message: format!("unexpected character `{other}`"),
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token { kind: TokenKind::Ident(name), .. }) if name == keyword)
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn parse_expr(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            lhs = lhs.or(rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.parse_unary()?;
        while self.eat_keyword("and") {
            let rhs = self.parse_unary()?;
            lhs = lhs.and(rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, QueryError> {
        if self.eat_keyword("not") {
            return Ok(not(self.parse_unary()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, QueryError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => {
                let expr = self.parse_expr()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(expr),
                    Some(token) => Err(QueryError::Syntax {
                        position: token.position,
                        message: "expected `)`".to_string(),
                    }),
                    None => Err(QueryError::Syntax {
                        position: self.end,
                        message: "expected `)` before end of predicate".to_string(),
                    }),
                }
            }
            Some(Token {
                kind: TokenKind::Ident(name),
                position,
            }) if !KEYWORDS.contains(&name.as_str()) => self.parse_comparison(name, position),
            Some(token) => Err(QueryError::Syntax {
                position: token.position,
                message: "expected a field reference or `(`".to_string(),
            }),
            None => Err(QueryError::Syntax {
                position: self.end,
                message: "unexpected end of predicate".to_string(),
            }),
        }
    }

    fn parse_comparison(&mut self, name: String, position: usize) -> Result<Expr, QueryError> {
        let lhs = field(name);
        let operator = match self.advance() {
            Some(token) => token,
            None => {
                return Err(QueryError::Syntax {
                    position: self.end,
                    message: "expected a comparison operator".to_string(),
                });
            }
        };

        let literal = self.parse_literal(&operator)?;
        match operator.kind {
            TokenKind::EqEq => Ok(lhs.equals(literal)),
            TokenKind::NotEq => Ok(lhs.not_equals(literal)),
            TokenKind::Lt => Ok(lhs.lt(literal)),
            TokenKind::Le => Ok(lhs.le(literal)),
            TokenKind::Gt => Ok(lhs.gt(literal)),
            TokenKind::Ge => Ok(lhs.ge(literal)),
            TokenKind::Ident(ref keyword) if keyword == "contains" => Ok(lhs.contains(literal)),
            _ => Err(QueryError::Syntax {
                position,
                message: "expected a comparison operator after field reference".to_string(),
            }),
        }
    }

    fn parse_literal(&mut self, operator: &Token) -> Result<Expr, QueryError> {
        let valid_operator = matches!(
            operator.kind,
            TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
        ) || matches!(&operator.kind, TokenKind::Ident(keyword) if keyword == "contains");
        if !valid_operator {
            return Err(QueryError::Syntax {
                position: operator.position,
                message: "expected a comparison operator after field reference".to_string(),
            });
        }

        match self.advance() {
            Some(Token {
                kind: TokenKind::Text(value),
                ..
            }) => Ok(text(value)),
            Some(Token {
                kind: TokenKind::Integer(value),
                ..
            }) => Ok(int(value)),
            Some(token) => Err(QueryError::Syntax {
                position: token.position,
                message: "expected a string or integer literal".to_string(),
            }),
            None => Err(QueryError::Syntax {
                position: self.end,
                message: "expected a literal before end of predicate".to_string(),
            }),
        }
    }
}
