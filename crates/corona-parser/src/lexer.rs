//! Tokenizer.

use corona_core::{ParseError, Real};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Num(Real),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let two = bytes.get(i..i + 2);
        let kind = match two {
            Some(b"**") => Some(TokenKind::Caret),
            Some(b"<=") => Some(TokenKind::Le),
            Some(b">=") => Some(TokenKind::Ge),
            Some(b"==") => Some(TokenKind::EqEq),
            Some(b"!=") => Some(TokenKind::Ne),
            _ => None,
        };
        if let Some(kind) = kind {
            i += 2;
            tokens.push(Token { kind, start, end: i });
            continue;
        }

        let kind = match b {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'^' => TokenKind::Caret,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let text = &input[start..i];
                let value = text.parse::<Real>().map_err(|_| ParseError::InvalidNumber {
                    offset: start,
                    text: text.to_string(),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Num(value),
                    start,
                    end: i,
                });
                continue;
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(input[start..i].to_string()),
                    start,
                    end: i,
                });
                continue;
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::UnexpectedChar { offset: start, ch });
            }
        };
        i += 1;
        tokens.push(Token {
            kind,
            start,
            end: i,
        });
    }

    Ok(tokens)
}

/// Scan a numeric literal starting at `i`; returns the end offset.
/// Accepts digits and dots greedily (malformed runs such as `1.2.3` are
/// rejected by the caller), then an optional exponent.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(s: &str) -> Vec<TokenKind> {
        tokenize(s).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn operators_and_numbers() {
        assert_eq!(
            kinds("1.5e-3*x**2 <= y"),
            vec![
                TokenKind::Num(1.5e-3),
                TokenKind::Star,
                TokenKind::Ident("x".into()),
                TokenKind::Caret,
                TokenKind::Num(2.0),
                TokenKind::Le,
                TokenKind::Ident("y".into()),
            ]
        );
    }

    #[test]
    fn exponent_without_digits_is_not_consumed() {
        // `2e` lexes as the number 2 followed by the identifier `e`.
        assert_eq!(
            kinds("2e"),
            vec![TokenKind::Num(2.0), TokenKind::Ident("e".into())]
        );
    }

    #[test]
    fn malformed_number() {
        assert_eq!(
            tokenize("x + 1.2.3"),
            Err(ParseError::InvalidNumber {
                offset: 4,
                text: "1.2.3".into()
            })
        );
    }

    #[test]
    fn unexpected_character_reports_offset() {
        assert_eq!(
            tokenize("x $ y"),
            Err(ParseError::UnexpectedChar { offset: 2, ch: '$' })
        );
        assert!(matches!(
            tokenize("x + é"),
            Err(ParseError::UnexpectedChar { offset: 4, ch: 'é' })
        ));
    }
}
