//! Text syntax for CTL formulas
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! formula := or ( "->" formula )?
//! or      := and ( "|" and )*
//! and     := unary ( "&" unary )*
//! unary   := "!" unary
//!          | ("EX" | "AX" | "EF" | "AF" | "EG" | "AG") unary
//!          | ("E" | "A") "[" formula "U" formula "]"
//!          | "(" formula ")" | "true" | "false" | ident
//! ```
//!
//! This is the same syntax [`Formula`]'s `Display` produces. Nesting is
//! capped at [`MAX_DEPTH`] levels so hostile input cannot exhaust the stack.

use crate::Formula;
use std::str::FromStr;

/// Deepest nesting of prefix operators, parentheses and sub-formulas
pub const MAX_DEPTH: usize = 256;

/// Errors from [`parse`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("Expected {expected} at offset {offset}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Formula nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Bang,
    Amp,
    Pipe,
    Arrow,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{}'", name),
            Token::Bang => "'!'".to_string(),
            Token::Amp => "'&'".to_string(),
            Token::Pipe => "'|'".to_string(),
            Token::Arrow => "'->'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut name = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((Token::Ident(name), offset));
            continue;
        }

        chars.next();
        let token = match ch {
            '!' => Token::Bang,
            '&' => Token::Amp,
            '|' => Token::Pipe,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '-' => match chars.next() {
                Some((_, '>')) => Token::Arrow,
                _ => return Err(ParseError::UnexpectedChar { found: '-', offset }),
            },
            other => return Err(ParseError::UnexpectedChar { found: other, offset }),
        };
        tokens.push((token, offset));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, offset)| *offset)
    }

    /// Run `parse` one nesting level deeper
    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Formula, ParseError>,
    ) -> Result<Formula, ParseError> {
        if self.depth == MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                offset: self.offset(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn expect(&mut self, want: Token, expected: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some((token, _)) if token == want => Ok(()),
            Some((token, offset)) => Err(ParseError::UnexpectedToken {
                expected,
                found: token.describe(),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    fn formula(&mut self) -> Result<Formula, ParseError> {
        self.nested(Self::implication)
    }

    fn implication(&mut self) -> Result<Formula, ParseError> {
        let lhs = self.or()?;
        if self.peek() == Some(&Token::Arrow) {
            self.advance();
            let rhs = self.formula()?;
            return Ok(Formula::implies(lhs, rhs));
        }
        Ok(lhs)
    }

    fn or(&mut self) -> Result<Formula, ParseError> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::Pipe) {
            self.advance();
            lhs = Formula::or(lhs, self.and()?);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Formula, ParseError> {
        let mut lhs = self.unary()?;
        while self.peek() == Some(&Token::Amp) {
            self.advance();
            lhs = Formula::and(lhs, self.unary()?);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Formula, ParseError> {
        self.nested(Self::prefixed)
    }

    fn prefixed(&mut self) -> Result<Formula, ParseError> {
        const EXPECTED: &str = "a formula";

        let (token, offset) = self
            .advance()
            .ok_or(ParseError::UnexpectedEnd { expected: EXPECTED })?;

        match token {
            Token::Bang => Ok(self.unary()?.not()),
            Token::LParen => {
                let inner = self.formula()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => self.keyword_or_atom(name),
            other => Err(ParseError::UnexpectedToken {
                expected: EXPECTED,
                found: other.describe(),
                offset,
            }),
        }
    }

    fn keyword_or_atom(&mut self, name: String) -> Result<Formula, ParseError> {
        match name.as_str() {
            "true" => Ok(Formula::True),
            "false" => Ok(Formula::False),
            "EX" => Ok(self.unary()?.ex()),
            "AX" => Ok(self.unary()?.ax()),
            "EF" => Ok(self.unary()?.ef()),
            "AF" => Ok(self.unary()?.af()),
            "EG" => Ok(self.unary()?.eg()),
            "AG" => Ok(self.unary()?.ag()),
            "E" | "A" if self.peek() == Some(&Token::LBracket) => {
                self.advance();
                let hold = self.formula()?;
                match self.advance() {
                    Some((Token::Ident(u), _)) if u == "U" => {}
                    Some((token, offset)) => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "'U'",
                            found: token.describe(),
                            offset,
                        })
                    }
                    None => return Err(ParseError::UnexpectedEnd { expected: "'U'" }),
                }
                let until = self.formula()?;
                self.expect(Token::RBracket, "']'")?;
                if name == "E" {
                    Ok(Formula::eu(hold, until))
                } else {
                    Ok(Formula::au(hold, until))
                }
            }
            _ => Ok(Formula::Atom(name)),
        }
    }
}

/// Parse a CTL formula from text
pub fn parse(input: &str) -> Result<Formula, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
        depth: 0,
        end: input.len(),
    };
    let formula = parser.formula()?;
    if let Some((token, offset)) = parser.advance() {
        return Err(ParseError::UnexpectedToken {
            expected: "end of input",
            found: token.describe(),
            offset,
        });
    }
    Ok(formula)
}

impl FromStr for Formula {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_atoms_and_constants() {
        assert_eq!(parse("ready").unwrap(), Formula::atom("ready"));
        assert_eq!(parse("true").unwrap(), Formula::True);
        assert_eq!(parse(" false ").unwrap(), Formula::False);
    }

    #[test]
    fn test_precedence() {
        let f = parse("a | b & !c").unwrap();
        assert_eq!(
            f,
            Formula::or(
                Formula::atom("a"),
                Formula::and(Formula::atom("b"), Formula::atom("c").not())
            )
        );

        let g = parse("a -> b -> c").unwrap();
        assert_eq!(
            g,
            Formula::implies(
                Formula::atom("a"),
                Formula::implies(Formula::atom("b"), Formula::atom("c"))
            )
        );
    }

    #[test]
    fn test_temporal_operators() {
        assert_eq!(
            parse("AG EF buffer_empty").unwrap(),
            Formula::atom("buffer_empty").ef().ag()
        );
        assert_eq!(
            parse("E[p U q]").unwrap(),
            Formula::eu(Formula::atom("p"), Formula::atom("q"))
        );
        assert_eq!(
            parse("A[!p U (q | r)]").unwrap(),
            Formula::au(
                Formula::atom("p").not(),
                Formula::or(Formula::atom("q"), Formula::atom("r"))
            )
        );
        // E without a bracket is an ordinary proposition
        assert_eq!(parse("E").unwrap(), Formula::atom("E"));
    }

    #[test]
    fn test_display_round_trip() {
        let formulas = [
            Formula::or(Formula::atom("producer_ready"), Formula::atom("consumer_ready")).ag(),
            Formula::au(Formula::True, Formula::and(Formula::atom("a"), Formula::atom("b")).not()),
            Formula::eu(Formula::atom("x").ex(), Formula::atom("y").eg()).af(),
            Formula::atom("z").not().not().ax(),
        ];
        for f in formulas {
            let text = f.to_string();
            assert_eq!(text.parse::<Formula>().unwrap(), f, "round trip of {}", text);
        }
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse("a & "),
            Err(ParseError::UnexpectedEnd {
                expected: "a formula"
            })
        );
        assert_eq!(
            parse("a $ b"),
            Err(ParseError::UnexpectedChar {
                found: '$',
                offset: 2
            })
        );
        assert!(matches!(
            parse("E[p q]"),
            Err(ParseError::UnexpectedToken { expected: "'U'", .. })
        ));
        assert!(matches!(
            parse("(a"),
            Err(ParseError::UnexpectedEnd { expected: "')'" })
        ));
        assert!(matches!(
            parse("a b"),
            Err(ParseError::UnexpectedToken {
                expected: "end of input",
                offset: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let negations = format!("{}p", "!".repeat(100_000));
        assert_eq!(
            parse(&negations),
            Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                offset: MAX_DEPTH - 1,
            })
        );

        let parens = format!("{}p", "(".repeat(100_000));
        assert!(matches!(parse(&parens), Err(ParseError::TooDeep { .. })));

        let temporal = format!("{}p", "AG ".repeat(100_000));
        assert!(matches!(parse(&temporal), Err(ParseError::TooDeep { .. })));

        // Moderate nesting is unaffected
        let mut expected = Formula::atom("p");
        for _ in 0..100 {
            expected = expected.not();
        }
        assert_eq!(parse(&format!("{}p", "!".repeat(100))).unwrap(), expected);
        assert!(parse(&format!("{}p{}", "(".repeat(60), ")".repeat(60))).is_ok());
    }
}
