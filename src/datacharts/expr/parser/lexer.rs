/*!
Tokenization for mathematical expressions.

First phase of parsing: converts expression text into tokens. The token
vocabulary is small - numbers, identifiers, arithmetic operators, and
parentheses. Anything else is a lexical error, which keeps the downstream
grammar closed.
*/

use crate::datacharts::expr::error::ExprError;

/// Token types recognized by the expression lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Numeric literals (42, 3.14, 1e-3)
    Number,
    /// Variable, constant, or function names
    Identifier,

    // Punctuation
    LeftParen,  // (
    RightParen, // )
    Comma,      // ,

    // Arithmetic operators
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    /// Exponentiation, written `^` or `**`
    Power,

    /// End of input
    Eof,
}

/// A token with its type, original text, and position.
///
/// Position information is the character offset in the source text and is
/// carried through to parse errors.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
}

/// Tokenize expression text into a vector of tokens.
///
/// Scans character by character, recognizing numbers (including scientific
/// notation), identifiers, operators, and parentheses. Whitespace separates
/// tokens and is otherwise ignored.
///
/// # Returns
/// * `Ok(Vec<Token>)` - tokens terminated by a single `Eof` token
/// * `Err(ExprError)` - lexical error with the offending position
pub fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut position = 0;

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
                position += 1;
            }
            '(' => {
                tokens.push(Token {
                    token_type: TokenType::LeftParen,
                    value: "(".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            ')' => {
                tokens.push(Token {
                    token_type: TokenType::RightParen,
                    value: ")".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            ',' => {
                tokens.push(Token {
                    token_type: TokenType::Comma,
                    value: ",".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            '+' => {
                tokens.push(Token {
                    token_type: TokenType::Plus,
                    value: "+".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            '-' => {
                tokens.push(Token {
                    token_type: TokenType::Minus,
                    value: "-".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            '*' => {
                chars.next();
                position += 1;
                if let Some(&'*') = chars.peek() {
                    tokens.push(Token {
                        token_type: TokenType::Power,
                        value: "**".to_string(),
                        position: position - 1,
                    });
                    chars.next();
                    position += 1;
                } else {
                    tokens.push(Token {
                        token_type: TokenType::Star,
                        value: "*".to_string(),
                        position: position - 1,
                    });
                }
            }
            '/' => {
                tokens.push(Token {
                    token_type: TokenType::Slash,
                    value: "/".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            '%' => {
                tokens.push(Token {
                    token_type: TokenType::Percent,
                    value: "%".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            '^' => {
                tokens.push(Token {
                    token_type: TokenType::Power,
                    value: "^".to_string(),
                    position,
                });
                chars.next();
                position += 1;
            }
            '0'..='9' | '.' => {
                let start = position;
                let mut value = String::new();
                let mut has_decimal = false;
                let mut has_exponent = false;

                while let Some(&next_ch) = chars.peek() {
                    if next_ch.is_ascii_digit() {
                        value.push(next_ch);
                        chars.next();
                        position += 1;
                    } else if next_ch == '.' && !has_decimal && !has_exponent {
                        has_decimal = true;
                        value.push(next_ch);
                        chars.next();
                        position += 1;
                    } else if (next_ch == 'e' || next_ch == 'E') && !has_exponent && !value.is_empty()
                    {
                        // Scientific notation; only treat e/E as an exponent
                        // marker when followed by a digit or a signed digit,
                        // otherwise it starts an identifier (e.g. `2e` is
                        // `2 * e` worth of trouble we reject at parse time).
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        let marks_exponent = match lookahead.peek() {
                            Some(&c) if c.is_ascii_digit() => true,
                            Some(&('+' | '-')) => {
                                lookahead.next();
                                matches!(lookahead.peek(), Some(c) if c.is_ascii_digit())
                            }
                            _ => false,
                        };
                        if !marks_exponent {
                            break;
                        }
                        has_exponent = true;
                        value.push(next_ch);
                        chars.next();
                        position += 1;
                        if let Some(&sign_ch) = chars.peek() {
                            if sign_ch == '+' || sign_ch == '-' {
                                value.push(sign_ch);
                                chars.next();
                                position += 1;
                            }
                        }
                    } else {
                        break;
                    }
                }

                if value == "." {
                    return Err(ExprError::syntax(
                        "expected digits around decimal point",
                        Some(start),
                    ));
                }

                tokens.push(Token {
                    token_type: TokenType::Number,
                    value,
                    position: start,
                });
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let start = position;
                let mut value = String::new();
                while let Some(&next_ch) = chars.peek() {
                    if next_ch.is_alphanumeric() || next_ch == '_' {
                        value.push(next_ch);
                        chars.next();
                        position += 1;
                    } else {
                        break;
                    }
                }

                tokens.push(Token {
                    token_type: TokenType::Identifier,
                    value,
                    position: start,
                });
            }
            _ => {
                return Err(ExprError::syntax(
                    format!("unexpected character '{}'", ch),
                    Some(position),
                ));
            }
        }
    }

    tokens.push(Token {
        token_type: TokenType::Eof,
        value: String::new(),
        position,
    });

    Ok(tokens)
}
