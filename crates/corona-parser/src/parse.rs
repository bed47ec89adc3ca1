//! Recursive-descent parser producing an unfolded [`Ast`].
//!
//! Precedence, lowest first: comparison, `+ -`, `* /`, unary sign,
//! `^`/`**` (right-associative). So `-x^2` is `-(x^2)` and `2^-1` is
//! `0.5`. Comparisons do not chain.
//!
//! Both the parser and tree evaluation recurse, so the nesting of
//! parentheses and unary signs and the height of the finished tree are
//! capped at [`MAX_DEPTH`].

use corona_core::{ParseError, Real};
use indexmap::IndexMap;

use crate::ast::{Ast, AstBuilder, BinOp, Func1, Func2, Node, NodeId};
use crate::lexer::{tokenize, Token, TokenKind};

/// Deepest nesting accepted, counted both as grammar recursion and as
/// tree height.
pub(crate) const MAX_DEPTH: usize = 256;

pub(crate) fn parse(input: &str, constants: &IndexMap<String, Real>) -> Result<Ast, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens = tokenize(input)?;
    let mut p = Parser {
        input,
        tokens: &tokens,
        pos: 0,
        constants,
        out: AstBuilder::default(),
        heights: Vec::new(),
        depth: 0,
    };
    let root = p.parse_cmp()?;
    if let Some(t) = p.peek() {
        return Err(p.unexpected(t));
    }
    Ok(p.out.finish(root))
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
    constants: &'a IndexMap<String, Real>,
    out: AstBuilder,
    /// Height of every node pushed to `out`, by node id.
    heights: Vec<usize>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn unexpected(&self, t: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            offset: t.start,
            found: self.input[t.start..t.end].to_string(),
        }
    }

    fn too_deep(&self) -> ParseError {
        ParseError::TooDeep {
            offset: self.peek().map_or(self.input.len(), |t| t.start),
            limit: MAX_DEPTH,
        }
    }

    /// Push `node`, rejecting it if the tree would grow past [`MAX_DEPTH`].
    fn push(&mut self, node: Node) -> Result<NodeId, ParseError> {
        let height = 1 + node
            .children()
            .iter()
            .flatten()
            .map(|&c| self.heights[c as usize])
            .max()
            .unwrap_or(0);
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.heights.push(height);
        Ok(self.out.push(node))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        match self.advance() {
            Some(t) if t.kind == kind => Ok(()),
            Some(t) => Err(self.unexpected(t)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    // ── Grammar rules ──────────────────────────────────────────

    fn parse_cmp(&mut self) -> Result<NodeId, ParseError> {
        let lhs = self.parse_add()?;
        let op = match self.peek_kind() {
            Some(TokenKind::Lt) => BinOp::Lt,
            Some(TokenKind::Gt) => BinOp::Gt,
            Some(TokenKind::Le) => BinOp::Le,
            Some(TokenKind::Ge) => BinOp::Ge,
            Some(TokenKind::EqEq) => BinOp::Eq,
            Some(TokenKind::Ne) => BinOp::Ne,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_add()?;
        self.push(Node::Binary(op, lhs, rhs))
    }

    fn parse_add(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = self.push(Node::Binary(op, lhs, rhs))?;
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.push(Node::Binary(op, lhs, rhs))?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        if self.depth == MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let node = self.parse_signed();
        self.depth -= 1;
        node
    }

    fn parse_signed(&mut self) -> Result<NodeId, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.advance();
                let e = self.parse_unary()?;
                self.push(Node::Neg(e))
            }
            Some(TokenKind::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<NodeId, ParseError> {
        let base = self.parse_atom()?;
        if matches!(self.peek_kind(), Some(TokenKind::Caret)) {
            self.advance();
            let exp = self.parse_unary()?;
            return self.push(Node::Binary(BinOp::Pow, base, exp));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<NodeId, ParseError> {
        let Some(t) = self.advance() else {
            return Err(ParseError::UnexpectedEnd);
        };
        match &t.kind {
            TokenKind::Num(v) => self.push(Node::Const(*v)),
            TokenKind::LParen => {
                let e = self.parse_cmp()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::Ident(name) => {
                if matches!(self.peek_kind(), Some(TokenKind::LParen)) {
                    self.advance();
                    self.parse_call(name, t.start)
                } else {
                    self.resolve_ident(name, t.start)
                }
            }
            _ => Err(self.unexpected(t)),
        }
    }

    fn resolve_ident(&mut self, name: &str, offset: usize) -> Result<NodeId, ParseError> {
        let node = match name {
            "x" => Node::Var(0),
            "y" => Node::Var(1),
            "z" => Node::Var(2),
            _ => match self.constants.get(name) {
                Some(&v) => Node::Const(v),
                None if name == "pi" => Node::Const(std::f64::consts::PI),
                None => {
                    return Err(ParseError::UnknownIdentifier {
                        offset,
                        name: name.to_string(),
                    })
                }
            },
        };
        self.push(node)
    }

    /// Parse `args )` after `name (` has been consumed.
    fn parse_call(&mut self, name: &str, offset: usize) -> Result<NodeId, ParseError> {
        let mut args: Vec<NodeId> = Vec::with_capacity(2);
        if !matches!(self.peek_kind(), Some(TokenKind::RParen)) {
            args.push(self.parse_cmp()?);
            while matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                self.advance();
                args.push(self.parse_cmp()?);
            }
        }
        self.expect(TokenKind::RParen)?;

        let arity_err = |expected: usize, found: usize| ParseError::WrongArity {
            offset,
            name: name.to_string(),
            expected,
            found,
        };
        if let Some(f) = Func1::lookup(name) {
            return match args[..] {
                [a] => self.push(Node::Call1(f, a)),
                _ => Err(arity_err(1, args.len())),
            };
        }
        if let Some(f) = Func2::lookup(name) {
            return match args[..] {
                [a, b] => self.push(Node::Call2(f, a, b)),
                _ => Err(arity_err(2, args.len())),
            };
        }
        Err(ParseError::UnknownFunction {
            offset,
            name: name.to_string(),
        })
    }
}
