//! Recursive descent parser producing `serde_json::Value`.

use super::lexer::{tokenize, Token};
use super::LiteralError;
use serde_json::{Map, Number, Value};
use std::ops::Range;

/// Deepest list/dict nesting accepted before giving up.
pub const MAX_DEPTH: usize = 128;

/// Parser over a pre-lexed token stream.
pub struct Parser {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    len: usize,
    depth: usize,
}

impl Parser {
    /// Lex the source and prepare to parse it.
    pub fn new(source: &str) -> Result<Self, LiteralError> {
        let tokens = tokenize(source)
            .map_err(|span| LiteralError::new("unrecognized token", span.start))?;
        Ok(Self {
            tokens,
            pos: 0,
            len: source.len(),
            depth: 0,
        })
    }

    /// Parse exactly one literal spanning the whole input.
    pub fn parse_document(&mut self) -> Result<Value, LiteralError> {
        let value = self.parse_value()?;
        if let Some((tok, span)) = self.tokens.get(self.pos) {
            return Err(LiteralError::new(
                format!("trailing input starting with {:?}", tok),
                span.start,
            ));
        }
        Ok(value)
    }

    fn next(&mut self) -> Result<(Token, usize), LiteralError> {
        match self.tokens.get(self.pos) {
            Some((tok, span)) => {
                self.pos += 1;
                Ok((tok.clone(), span.start))
            }
            None => Err(LiteralError::new("unexpected end of input", self.len)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        let (tok, at) = self.next()?;
        match tok {
            Token::Null => Ok(Value::Null),
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::Int(i) => Ok(Value::Number(i.into())),
            Token::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| LiteralError::new("non-finite number", at)),
            Token::Str(s) => Ok(Value::String(s)),
            Token::LBracket => self.nested(at, |p| p.parse_sequence(Token::RBracket)),
            Token::LParen => self.nested(at, |p| p.parse_sequence(Token::RParen)),
            Token::LBrace => self.nested(at, Self::parse_mapping),
            other => Err(LiteralError::new(
                format!("expected a value, found {:?}", other),
                at,
            )),
        }
    }

    fn nested(
        &mut self,
        at: usize,
        parse: impl FnOnce(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::new("nesting too deep", at));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    /// Items up to `close`, allowing a trailing comma.
    fn parse_sequence(&mut self, close: Token) -> Result<Value, LiteralError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.next()?;
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            let (tok, at) = self.next()?;
            match tok {
                Token::Comma => continue,
                t if t == close => return Ok(Value::Array(items)),
                other => {
                    return Err(LiteralError::new(
                        format!("expected ',' or {:?}, found {:?}", close, other),
                        at,
                    ))
                }
            }
        }
    }

    fn parse_mapping(&mut self) -> Result<Value, LiteralError> {
        let mut map = Map::new();
        loop {
            if self.peek() == Some(&Token::RBrace) {
                self.next()?;
                return Ok(Value::Object(map));
            }
            let (key_tok, at) = self.next()?;
            let key = match key_tok {
                Token::Str(s) => s,
                Token::Int(i) => i.to_string(),
                Token::Float(f) => f.to_string(),
                other => {
                    return Err(LiteralError::new(
                        format!("expected a key, found {:?}", other),
                        at,
                    ))
                }
            };
            let (colon, at) = self.next()?;
            if colon != Token::Colon {
                return Err(LiteralError::new("expected ':' after key", at));
            }
            let value = self.parse_value()?;
            map.insert(key, value);

            let (tok, at) = self.next()?;
            match tok {
                Token::Comma => continue,
                Token::RBrace => return Ok(Value::Object(map)),
                other => {
                    return Err(LiteralError::new(
                        format!("expected ',' or '}}', found {:?}", other),
                        at,
                    ))
                }
            }
        }
    }
}
