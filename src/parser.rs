// ABOUTME: Recursive-descent parser turning the token stream into an AST

use crate::ast::{AssignTarget, BinOp, Block, Expr, Param, Program, Stmt, UnOp};
use crate::error::SyntaxError;
use crate::scanner::{Token, TokenKind};

/// Top-down parser over the scanner's token sequence. Fails on the first
/// unexpected token; there is no recovery.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    lenient: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            lenient: false,
        }
    }

    pub fn lenient(tokens: Vec<Token>) -> Self {
        Parser {
            lenient: true,
            ..Parser::new(tokens)
        }
    }

    pub fn parse(mut self) -> Result<Program, SyntaxError> {
        let mut stmts = Vec::new();
        self.skip_semis();
        while !self.check(TokenKind::End) {
            stmts.push(self.statement()?);
            self.skip_semis();
        }
        Ok(Program { stmts })
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        // The scanner guarantees a trailing END token
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream always ends with END")
        })
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::End {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_keyword(&self, word: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Keyword && token.lexeme == word
    }

    fn check_op(&self, op: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Op && token.lexeme == op
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.check_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume and return a token of `kind`, or fail.
    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        if token.kind == TokenKind::End {
            SyntaxError::UnexpectedEnd {
                expected: expected.to_string(),
                line: token.line,
            }
        } else {
            SyntaxError::UnexpectedToken {
                found: token.lexeme.clone(),
                expected: expected.to_string(),
                line: token.line,
            }
        }
    }

    fn skip_semis(&mut self) {
        while self.check(TokenKind::Semi) {
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        if self.check_keyword("var") || self.check_keyword("let") {
            return self.var_decl();
        }
        if self.check_keyword("proc") {
            return self.func_def();
        }
        if self.check_keyword("if") {
            return self.if_stmt();
        }
        if self.check_keyword("while") {
            return self.while_stmt();
        }
        if self.check_keyword("for") {
            return self.for_stmt();
        }
        if self.check_keyword("try") {
            return self.try_stmt();
        }
        if self.check_keyword("switch") {
            return self.switch_stmt();
        }
        if self.check_keyword("print") || self.check_keyword("println") {
            return self.print_stmt();
        }
        if self.eat_keyword("return") {
            let expr = if self.return_value_follows() {
                Some(self.expression()?)
            } else {
                None
            };
            return Ok(Stmt::Return(expr));
        }
        if self.eat_keyword("break") {
            return Ok(Stmt::Break);
        }
        if self.eat_keyword("continue") {
            return Ok(Stmt::Continue);
        }
        self.expr_or_assignment()
    }

    fn return_value_follows(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Semi | TokenKind::RBrace | TokenKind::End => false,
            // Only these keywords can begin an expression
            TokenKind::Keyword => matches!(token.lexeme.as_str(), "true" | "false" | "input"),
            _ => true,
        }
    }

    /// `var NAME ':' TYPE ('=' expr)?` — the type is recorded but never
    /// enforced at runtime.
    fn var_decl(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance(); // var | let
        let name = self.expect(TokenKind::Ident, "variable name")?.lexeme;
        self.expect(TokenKind::Colon, "':' before type")?;
        let declared_type = self.type_name()?;
        let init = if self.check(TokenKind::Eq) {
            self.advance();
            Some(self.expression()?)
        } else {
            None
        };
        Ok(Stmt::VarDecl {
            name,
            declared_type,
            init,
        })
    }

    /// A type is an identifier or `'[' TYPE? ']'`; the element type of an
    /// array is accepted and folded into the stored name.
    fn type_name(&mut self) -> Result<String, SyntaxError> {
        if self.check(TokenKind::LBracket) {
            self.advance();
            let inner = if self.check(TokenKind::RBracket) {
                String::new()
            } else {
                self.type_name()?
            };
            self.expect(TokenKind::RBracket, "']' after array type")?;
            Ok(format!("[{}]", inner))
        } else {
            Ok(self.expect(TokenKind::Ident, "type name")?.lexeme)
        }
    }

    /// `proc NAME '(' params ')' ('->' TYPE)? block`
    fn func_def(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance(); // proc
        let name = self.expect(TokenKind::Ident, "function name")?.lexeme;
        self.expect(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Ident, "parameter name")?.lexeme;
                let declared_type = if self.check(TokenKind::Colon) {
                    self.advance();
                    Some(self.type_name()?)
                } else {
                    None
                };
                params.push(Param {
                    name: param,
                    declared_type,
                });
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;
        let return_type = if self.eat_op("->") {
            Some(self.type_name()?)
        } else {
            None
        };
        let body = self.block()?;
        Ok(Stmt::FuncDef {
            name,
            params,
            return_type,
            body,
        })
    }

    fn block(&mut self) -> Result<Block, SyntaxError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        self.skip_semis();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::End) {
                return Err(self.unexpected("'}'"));
            }
            stmts.push(self.statement()?);
            self.skip_semis();
        }
        self.advance(); // }
        Ok(stmts)
    }

    fn if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance(); // if
        let cond = self.expression()?;
        let then_block = self.block()?;
        let else_block = if self.eat_keyword("else") {
            Some(self.block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn while_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance(); // while
        let cond = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::While { cond, body })
    }

    fn for_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance(); // for
        let var = self.expect(TokenKind::Ident, "loop variable")?.lexeme;
        if !self.eat_keyword("in") {
            return Err(self.unexpected("'in'"));
        }
        let iterable = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::For {
            var,
            iterable,
            body,
        })
    }

    fn try_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance(); // try
        let body = self.block()?;
        if !self.eat_keyword("catch") {
            return Err(self.unexpected("'catch'"));
        }
        let catch_var = if self.check(TokenKind::LParen) {
            self.advance();
            let name = self.expect(TokenKind::Ident, "catch variable")?.lexeme;
            self.expect(TokenKind::RParen, "')' after catch variable")?;
            Some(name)
        } else {
            None
        };
        let catch_block = self.block()?;
        Ok(Stmt::Try {
            body,
            catch_var,
            catch_block,
        })
    }

    /// `switch expr '{' ('case' expr ':' stmt*)* ('default' ':' stmt*)? '}'`
    fn switch_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance(); // switch
        let scrutinee = self.expression()?;
        self.expect(TokenKind::LBrace, "'{' after switch expression")?;
        let mut cases = Vec::new();
        let mut default = None;
        loop {
            self.skip_semis();
            if self.eat_keyword("case") {
                let label = self.expression()?;
                self.expect(TokenKind::Colon, "':' after case label")?;
                cases.push((label, self.case_body()?));
            } else if self.eat_keyword("default") {
                self.expect(TokenKind::Colon, "':' after default")?;
                default = Some(self.case_body()?);
            } else if self.check(TokenKind::RBrace) {
                self.advance();
                break;
            } else {
                return Err(self.unexpected("'case', 'default', or '}'"));
            }
        }
        Ok(Stmt::Switch {
            scrutinee,
            cases,
            default,
        })
    }

    /// Statements of one case group: up to the next case, default, or `}`.
    fn case_body(&mut self) -> Result<Block, SyntaxError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_semis();
            if self.check_keyword("case")
                || self.check_keyword("default")
                || self.check(TokenKind::RBrace)
                || self.check(TokenKind::End)
            {
                return Ok(stmts);
            }
            stmts.push(self.statement()?);
        }
    }

    fn print_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let name = self.advance().lexeme; // print | println
        self.expect(TokenKind::LParen, "'(' after print")?;
        let args = self.call_args()?;
        Ok(Stmt::Expr(Expr::Call { name, args }))
    }

    /// An expression statement, or an assignment if `=` (or a compound
    /// assignment operator) follows the parsed expression. Only names and
    /// indexed elements are assignable.
    fn expr_or_assignment(&mut self) -> Result<Stmt, SyntaxError> {
        let expr = self.expression()?;
        let compound = ["+=", "-=", "*=", "/="]
            .into_iter()
            .find(|op| self.check_op(op));
        if self.check(TokenKind::Eq) {
            self.advance();
            let value = self.expression()?;
            let target = self.assign_target(expr)?;
            return Ok(Stmt::Assign { target, value });
        }
        if let Some(op) = compound {
            self.advance();
            let rhs = self.expression()?;
            let binop = match op {
                "+=" => BinOp::Add,
                "-=" => BinOp::Sub,
                "*=" => BinOp::Mul,
                _ => BinOp::Div,
            };
            let value = Expr::Binary {
                lhs: Box::new(expr.clone()),
                op: binop,
                rhs: Box::new(rhs),
            };
            let target = self.assign_target(expr)?;
            return Ok(Stmt::Assign { target, value });
        }
        Ok(Stmt::Expr(expr))
    }

    fn assign_target(&self, expr: Expr) -> Result<AssignTarget, SyntaxError> {
        match expr {
            Expr::Ident(name) => Ok(AssignTarget::Name(name)),
            Expr::Index { array, index } => Ok(AssignTarget::Index {
                array: *array,
                index: *index,
            }),
            _ => Err(self.unexpected("assignable target")),
        }
    }

    // ------------------------------------------------------------------
    // Expressions, lowest precedence first
    // ------------------------------------------------------------------

    pub fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.and_expr()?;
        while self.eat_op("||") {
            let rhs = self.and_expr()?;
            lhs = binary(lhs, BinOp::Or, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.comparison()?;
        while self.eat_op("&&") {
            let rhs = self.comparison()?;
            lhs = binary(lhs, BinOp::And, rhs);
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.additive()?;
        loop {
            let op = if self.eat_op("==") {
                BinOp::Eq
            } else if self.eat_op("!=") {
                BinOp::Ne
            } else if self.eat_op("<=") {
                BinOp::Le
            } else if self.eat_op(">=") {
                BinOp::Ge
            } else if self.eat_op("<") {
                BinOp::Lt
            } else if self.eat_op(">") {
                BinOp::Gt
            } else {
                return Ok(lhs);
            };
            let rhs = self.additive()?;
            lhs = binary(lhs, op, rhs);
        }
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.range()?;
        loop {
            let op = if self.eat_op("+") {
                BinOp::Add
            } else if self.eat_op("-") {
                BinOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.range()?;
            lhs = binary(lhs, op, rhs);
        }
    }

    /// `..` sits between additive and multiplicative: `0..n*2` is
    /// `0..(n*2)` while `0..n+1` is `(0..n)+1`.
    fn range(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.multiplicative()?;
        while self.eat_op("..") {
            let rhs = self.multiplicative()?;
            lhs = binary(lhs, BinOp::Range, rhs);
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat_op("*") {
                BinOp::Mul
            } else if self.eat_op("/") {
                BinOp::Div
            } else if self.eat_op("%") {
                BinOp::Mod
            } else {
                return Ok(lhs);
            };
            let rhs = self.unary()?;
            lhs = binary(lhs, op, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = if self.eat_op("!") {
            Some(UnOp::Not)
        } else if self.eat_op("-") {
            Some(UnOp::Neg)
        } else {
            None
        };
        match op {
            Some(op) => Ok(Expr::Unary {
                op,
                operand: Box::new(self.unary()?),
            }),
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.primary()?;
        loop {
            if self.check(TokenKind::LBracket) {
                self.advance();
                let index = self.expression()?;
                self.expect(TokenKind::RBracket, "']' after index")?;
                expr = Expr::Index {
                    array: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.check(TokenKind::Dot) {
                self.advance();
                let name = self.expect(TokenKind::Ident, "member name")?.lexeme;
                expr = Expr::Member {
                    object: Box::new(expr),
                    name,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(TokenKind::Number) {
            let token = self.advance();
            return self.number_literal(&token);
        }
        if self.check(TokenKind::String) {
            return Ok(Expr::Str(self.advance().lexeme));
        }
        if self.check(TokenKind::LBracket) {
            self.advance();
            let mut elements = Vec::new();
            if !self.check(TokenKind::RBracket) {
                loop {
                    elements.push(self.expression()?);
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
            }
            self.expect(TokenKind::RBracket, "']' after array literal")?;
            return Ok(Expr::Array(elements));
        }
        if self.check(TokenKind::Ident) {
            let name = self.advance().lexeme;
            if self.check(TokenKind::LParen) {
                self.advance();
                let args = self.call_args()?;
                return Ok(Expr::Call { name, args });
            }
            return Ok(Expr::Ident(name));
        }
        if self.eat_keyword("true") {
            return Ok(Expr::Number(1.0));
        }
        if self.eat_keyword("false") {
            return Ok(Expr::Number(0.0));
        }
        if self.eat_keyword("input") {
            self.expect(TokenKind::LParen, "'(' after input")?;
            let args = self.call_args()?;
            return Ok(Expr::Call {
                name: "input".to_string(),
                args,
            });
        }
        if self.check(TokenKind::LParen) {
            self.advance();
            let expr = self.expression()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(expr);
        }
        Err(self.unexpected("expression"))
    }

    /// Comma-separated arguments up to the closing parenthesis.
    fn call_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "')' after arguments")?;
        Ok(args)
    }

    /// Convert a numeric lexeme. The scanner tokenizes malformed runs like
    /// `1.2.3` as-is; the fault surfaces here, or reads as 0 in lenient
    /// mode.
    fn number_literal(&self, token: &Token) -> Result<Expr, SyntaxError> {
        match token.lexeme.parse::<f64>() {
            Ok(n) => Ok(Expr::Number(n)),
            Err(_) if self.lenient => Ok(Expr::Number(0.0)),
            Err(_) => Err(SyntaxError::MalformedNumber {
                lexeme: token.lexeme.clone(),
                line: token.line,
            }),
        }
    }
}

fn binary(lhs: Expr, op: BinOp, rhs: Expr) -> Expr {
    Expr::Binary {
        lhs: Box::new(lhs),
        op,
        rhs: Box::new(rhs),
    }
}
