/*!
# Expression Grammar

Recursive-descent parser for mathematical expressions, implementing the
operator precedence ladder:

```text
Level 1 (lowest):  Addition / Subtraction      (parse_additive)
Level 2:           Multiplication / Division / Modulo (parse_multiplicative)
Level 3:           Unary plus / minus          (parse_unary)
Level 4:           Exponentiation, right-assoc (parse_power)
Level 5 (highest): Primary expressions         (parse_primary)
```

Each level calls the next higher level, ensuring proper precedence during
parsing. Exponentiation is right-associative and binds tighter than unary
minus, so `-x ** 2` parses as `-(x ** 2)` and `2 ** 3 ** 2` as `2 ** (3 ** 2)`.

Primary expressions are numeric literals, identifiers, function calls, and
parenthesized sub-expressions - nothing else. All parsing methods return
`Result<ExprNode, ExprError>` with position information on failure.
*/

use super::lexer::{Token, TokenType};
use crate::datacharts::expr::ast::{BinaryOperator, ExprNode, UnaryOperator};
use crate::datacharts::expr::error::ExprError;

/// Token-stream cursor used by the grammar methods.
pub(super) struct TokenParser {
    tokens: Vec<Token>,
    current: usize,
}

impl TokenParser {
    pub(super) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    fn current_token(&self) -> &Token {
        // The token vector always ends with Eof, so current is in range.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<Token, ExprError> {
        let token = self.current_token().clone();
        if token.token_type == expected {
            self.advance();
            Ok(token)
        } else {
            Err(ExprError::syntax(
                format!("expected {:?}, found {:?}", expected, token.token_type),
                Some(token.position),
            ))
        }
    }

    /// Parse a complete expression and require that all input is consumed.
    pub(super) fn parse_complete(&mut self) -> Result<ExprNode, ExprError> {
        let expr = self.parse_expression()?;
        let trailing = self.current_token().clone();
        if trailing.token_type != TokenType::Eof {
            return Err(ExprError::syntax(
                format!("unexpected trailing input '{}'", trailing.value),
                Some(trailing.position),
            ));
        }
        Ok(expr)
    }

    /// Entry point for expression parsing; delegates to the lowest
    /// precedence level.
    fn parse_expression(&mut self) -> Result<ExprNode, ExprError> {
        self.parse_additive()
    }

    /// Grammar: `multiplicative ((+ | -) multiplicative)*`
    fn parse_additive(&mut self) -> Result<ExprNode, ExprError> {
        let mut left = self.parse_multiplicative()?;

        while matches!(
            self.current_token().token_type,
            TokenType::Plus | TokenType::Minus
        ) {
            let op_token = self.current_token().clone();
            self.advance();
            let right = self.parse_multiplicative()?;

            let op = match op_token.token_type {
                TokenType::Plus => BinaryOperator::Add,
                TokenType::Minus => BinaryOperator::Subtract,
                _ => unreachable!(),
            };

            left = ExprNode::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Grammar: `unary ((* | / | %) unary)*`
    fn parse_multiplicative(&mut self) -> Result<ExprNode, ExprError> {
        let mut left = self.parse_unary()?;

        while matches!(
            self.current_token().token_type,
            TokenType::Star | TokenType::Slash | TokenType::Percent
        ) {
            let op_token = self.current_token().clone();
            self.advance();
            let right = self.parse_unary()?;

            let op = match op_token.token_type {
                TokenType::Star => BinaryOperator::Multiply,
                TokenType::Slash => BinaryOperator::Divide,
                TokenType::Percent => BinaryOperator::Modulo,
                _ => unreachable!(),
            };

            left = ExprNode::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Grammar: `(+ | -) unary | power`
    fn parse_unary(&mut self) -> Result<ExprNode, ExprError> {
        match self.current_token().token_type {
            TokenType::Plus => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(ExprNode::UnaryOp {
                    op: UnaryOperator::Plus,
                    expr: Box::new(expr),
                })
            }
            TokenType::Minus => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(ExprNode::UnaryOp {
                    op: UnaryOperator::Minus,
                    expr: Box::new(expr),
                })
            }
            _ => self.parse_power(),
        }
    }

    /// Grammar: `primary (^ unary)?` - right-associative, and the exponent
    /// re-enters at the unary level so `x ** -2` parses.
    fn parse_power(&mut self) -> Result<ExprNode, ExprError> {
        let base = self.parse_primary()?;

        if self.current_token().token_type == TokenType::Power {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(ExprNode::BinaryOp {
                left: Box::new(base),
                op: BinaryOperator::Power,
                right: Box::new(exponent),
            });
        }

        Ok(base)
    }

    /// Grammar: `number | identifier | identifier '(' args ')' | '(' expression ')'`
    fn parse_primary(&mut self) -> Result<ExprNode, ExprError> {
        let token = self.current_token().clone();
        match token.token_type {
            TokenType::Number => {
                self.advance();
                match token.value.parse::<f64>() {
                    Ok(n) => Ok(ExprNode::Number(n)),
                    Err(_) => Err(ExprError::syntax(
                        format!("invalid number '{}'", token.value),
                        Some(token.position),
                    )),
                }
            }
            TokenType::Identifier => {
                self.advance();
                if self.current_token().token_type == TokenType::LeftParen {
                    self.parse_call_args(token)
                } else {
                    Ok(ExprNode::Identifier(token.value))
                }
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenType::RightParen)?;
                Ok(expr)
            }
            _ => Err(ExprError::syntax(
                format!("unexpected token '{}'", token.value),
                Some(token.position),
            )),
        }
    }

    /// Parse the argument list of a function call. The callee token has
    /// already been consumed and the cursor sits on `(`.
    fn parse_call_args(&mut self, callee: Token) -> Result<ExprNode, ExprError> {
        self.advance(); // consume '('
        let mut args = Vec::new();

        if self.current_token().token_type != TokenType::RightParen {
            loop {
                args.push(self.parse_expression()?);

                match self.current_token().token_type {
                    TokenType::Comma => self.advance(),
                    TokenType::RightParen => break,
                    _ => {
                        return Err(ExprError::syntax(
                            "expected ',' or ')' in argument list",
                            Some(self.current_token().position),
                        ));
                    }
                }
            }
        }

        self.expect(TokenType::RightParen)?;
        Ok(ExprNode::Call {
            name: callee.value,
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datacharts::expr::parser::lexer::tokenize;

    fn parse(text: &str) -> Result<ExprNode, ExprError> {
        TokenParser::new(tokenize(text)?).parse_complete()
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let tree = parse("1 + 2 * 3").unwrap();
        match tree {
            ExprNode::BinaryOp { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Add);
                assert!(matches!(
                    *right,
                    ExprNode::BinaryOp {
                        op: BinaryOperator::Multiply,
                        ..
                    }
                ));
            }
            _ => panic!("expected binary op at root"),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let tree = parse("2 ** 3 ** 2").unwrap();
        match tree {
            ExprNode::BinaryOp { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Power);
                assert!(matches!(
                    *right,
                    ExprNode::BinaryOp {
                        op: BinaryOperator::Power,
                        ..
                    }
                ));
            }
            _ => panic!("expected power at root"),
        }
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        // -x ** 2 parses as -(x ** 2)
        let tree = parse("-x ** 2").unwrap();
        match tree {
            ExprNode::UnaryOp { op, expr } => {
                assert_eq!(op, UnaryOperator::Minus);
                assert!(matches!(
                    *expr,
                    ExprNode::BinaryOp {
                        op: BinaryOperator::Power,
                        ..
                    }
                ));
            }
            _ => panic!("expected unary at root"),
        }
    }

    #[test]
    fn test_nested_call() {
        let tree = parse("sqrt(x**2 + y**2)").unwrap();
        match tree {
            ExprNode::Call { name, args } => {
                assert_eq!(name, "sqrt");
                assert_eq!(args.len(), 1);
            }
            _ => panic!("expected call at root"),
        }
    }

    #[test]
    fn test_call_with_parameters() {
        let tree = parse("quantile(y, 0.75)").unwrap();
        match tree {
            ExprNode::Call { name, args } => {
                assert_eq!(name, "quantile");
                assert_eq!(args.len(), 2);
                assert_eq!(args[1], ExprNode::Number(0.75));
            }
            _ => panic!("expected call at root"),
        }
    }

    #[test]
    fn test_trailing_operator_rejected() {
        assert!(parse("x + y +").is_err());
    }

    #[test]
    fn test_unbalanced_parens_rejected() {
        assert!(parse("sin(x").is_err());
        assert!(parse("sin x)").is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }
}
