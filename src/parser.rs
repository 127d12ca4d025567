// File: src/parser.rs
//
// Recursive descent parser for the Brewin language.
// Transforms a sequence of tokens into an Abstract Syntax Tree (AST).
//
// The parser implements a traditional recursive descent strategy with
// operator precedence for expressions. It supports:
// - Function definitions with value and `ref` parameters
// - Assignment to variables and object fields
// - Control flow (if/else, while, return)
// - Lambdas, object creation (`@`), field access and method calls
//
// The parser uses a single-token lookahead and advances through the token
// stream as it builds the AST.

use crate::ast::{
    AssignTarget, BinaryOp, Call, Callee, Expr, FuncDef, Param, Program, Stmt, UnaryOp,
    LAMBDA_NAME,
};
use crate::errors::{BrewinError, BrewinResult};
use crate::lexer::{tokenize, Token, TokenKind};
use std::rc::Rc;

static EOF: TokenKind = TokenKind::Eof;

/// Tokenizes and parses a complete program
pub fn parse_program(source: &str) -> BrewinResult<Program> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}

/// Parser maintains position in token stream and provides methods to parse
/// definitions, statements and expressions
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a new parser from a vector of tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&EOF)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    /// Consume and return the current token, then advance to the next
    fn advance(&mut self) -> TokenKind {
        let tok = self.peek().clone();
        self.pos += 1;
        tok
    }

    fn error<T>(&self, message: impl Into<String>) -> BrewinResult<T> {
        let location = self.current().map(Token::location).unwrap_or_else(
            crate::errors::SourceLocation::unknown,
        );
        Err(Box::new(BrewinError::parse_error(message, location)))
    }

    fn at_punct(&self, c: char) -> bool {
        matches!(self.peek(), TokenKind::Punctuation(p) if *p == c)
    }

    fn at_operator(&self, op: &str) -> bool {
        matches!(self.peek(), TokenKind::Operator(o) if o == op)
    }

    fn at_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if k == kw)
    }

    fn expect_punct(&mut self, c: char) -> BrewinResult<()> {
        if self.at_punct(c) {
            self.advance();
            Ok(())
        } else {
            self.error(format!("expected '{}', found {}", c, describe(self.peek())))
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> BrewinResult<()> {
        if self.at_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            self.error(format!("expected '{}', found {}", kw, describe(self.peek())))
        }
    }

    fn expect_identifier(&mut self) -> BrewinResult<String> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => self.error(format!("expected identifier, found {}", describe(other))),
        }
    }

    /// Parse the entire token stream into a program of function definitions
    pub fn parse(&mut self) -> BrewinResult<Program> {
        let mut functions = Vec::new();
        while !matches!(self.peek(), TokenKind::Eof) {
            if self.at_keyword("func") {
                functions.push(Rc::new(self.parse_func()?));
            } else {
                return self.error(format!(
                    "expected function definition, found {}",
                    describe(self.peek())
                ));
            }
        }
        Ok(Program { functions })
    }

    fn parse_func(&mut self) -> BrewinResult<FuncDef> {
        self.expect_keyword("func")?;
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(FuncDef { name, params, body })
    }

    fn parse_params(&mut self) -> BrewinResult<Vec<Param>> {
        self.expect_punct('(')?;
        let mut params = Vec::new();
        while !self.at_punct(')') {
            let by_ref = if self.at_keyword("ref") {
                self.advance();
                true
            } else {
                false
            };
            let name = self.expect_identifier()?;
            params.push(Param { name, by_ref });
            if self.at_punct(',') {
                self.advance();
            } else if !self.at_punct(')') {
                return self.error(format!(
                    "expected ',' or ')' in parameter list, found {}",
                    describe(self.peek())
                ));
            }
        }
        self.advance(); // )
        Ok(params)
    }

    fn parse_block(&mut self) -> BrewinResult<Vec<Stmt>> {
        self.expect_punct('{')?;
        let mut stmts = Vec::new();
        while !self.at_punct('}') {
            if matches!(self.peek(), TokenKind::Eof) {
                return self.error("unexpected end of input, expected '}'");
            }
            stmts.push(self.parse_stmt()?);
        }
        self.advance(); // }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> BrewinResult<Stmt> {
        match self.peek() {
            TokenKind::Keyword(k) if k == "return" => {
                self.advance();
                let expr = if self.at_punct(';') { None } else { Some(self.parse_expr()?) };
                self.expect_punct(';')?;
                Ok(Stmt::Return(expr))
            }
            TokenKind::Keyword(k) if k == "if" => self.parse_if(),
            TokenKind::Keyword(k) if k == "while" => {
                self.advance();
                let condition = self.parse_condition()?;
                let body = self.parse_block()?;
                Ok(Stmt::While { condition, body })
            }
            _ => {
                // Either `target = expr;` or a call statement
                let expr = self.parse_expr()?;
                if self.at_operator("=") {
                    self.advance();
                    let target = match expr {
                        Expr::Var(name) => AssignTarget::Var(name),
                        Expr::Field { object, field } => AssignTarget::Field { object: *object, field },
                        _ => return self.error("invalid assignment target"),
                    };
                    let value = self.parse_expr()?;
                    self.expect_punct(';')?;
                    Ok(Stmt::Assign { target, value })
                } else if let Expr::Call(call) = expr {
                    self.expect_punct(';')?;
                    Ok(Stmt::Call(call))
                } else {
                    self.error("expected assignment or function call statement")
                }
            }
        }
    }

    fn parse_if(&mut self) -> BrewinResult<Stmt> {
        self.advance(); // if
        let condition = self.parse_condition()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.at_keyword("else") {
            self.advance();
            if self.at_keyword("if") {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn parse_condition(&mut self) -> BrewinResult<Expr> {
        self.expect_punct('(')?;
        let condition = self.parse_expr()?;
        self.expect_punct(')')?;
        Ok(condition)
    }

    /// Parse an expression with operator precedence, loosest binding first
    pub fn parse_expr(&mut self) -> BrewinResult<Expr> {
        self.parse_or()
    }

    fn parse_binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> BrewinResult<Expr>,
    ) -> BrewinResult<Expr> {
        let mut left = next(self)?;
        loop {
            let op = match self.peek() {
                TokenKind::Operator(o) if ops.contains(&o.as_str()) => o.clone(),
                _ => break,
            };
            self.advance();
            let right = next(self)?;
            let Some(op) = BinaryOp::from_symbol(&op) else {
                return self.error(format!("unknown operator '{}'", op));
            };
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> BrewinResult<Expr> {
        self.parse_binary_level(&["||"], Self::parse_and)
    }

    fn parse_and(&mut self) -> BrewinResult<Expr> {
        self.parse_binary_level(&["&&"], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> BrewinResult<Expr> {
        self.parse_binary_level(&["==", "!=", "<", "<=", ">", ">="], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> BrewinResult<Expr> {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> BrewinResult<Expr> {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> BrewinResult<Expr> {
        let op = if self.at_operator("-") {
            Some(UnaryOp::Neg)
        } else if self.at_operator("!") {
            Some(UnaryOp::Not)
        } else {
            None
        };
        match op {
            Some(op) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op, operand: Box::new(operand) })
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> BrewinResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.at_punct('.') {
            self.advance();
            let field = self.expect_identifier()?;
            if self.at_punct('(') {
                let args = self.parse_args()?;
                expr = Expr::Call(Call {
                    callee: Callee::Method { object: Box::new(expr), method: field },
                    args,
                });
            } else {
                expr = Expr::Field { object: Box::new(expr), field };
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> BrewinResult<Vec<Expr>> {
        self.expect_punct('(')?;
        let mut args = Vec::new();
        while !self.at_punct(')') {
            args.push(self.parse_expr()?);
            if self.at_punct(',') {
                self.advance();
            } else if !self.at_punct(')') {
                return self.error(format!(
                    "expected ',' or ')' in argument list, found {}",
                    describe(self.peek())
                ));
            }
        }
        self.advance(); // )
        Ok(args)
    }

    fn parse_primary(&mut self) -> BrewinResult<Expr> {
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::Bool(b))
            }
            TokenKind::Keyword(k) if k == "nil" => {
                self.advance();
                Ok(Expr::Nil)
            }
            TokenKind::Keyword(k) if k == "lambda" => {
                self.advance();
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                Ok(Expr::Lambda(Rc::new(FuncDef { name: LAMBDA_NAME.to_string(), params, body })))
            }
            TokenKind::Operator(op) if op == "@" => {
                self.advance();
                Ok(Expr::NewObject)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.at_punct('(') {
                    let args = self.parse_args()?;
                    Ok(Expr::Call(Call { callee: Callee::Name(name), args }))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            TokenKind::Punctuation('(') => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_punct(')')?;
                Ok(expr)
            }
            other => self.error(format!("expected expression, found {}", describe(&other))),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) => format!("identifier '{}'", name),
        TokenKind::Int(n) => format!("integer {}", n),
        TokenKind::String(s) => format!("string \"{}\"", s),
        TokenKind::Bool(b) => format!("'{}'", b),
        TokenKind::Operator(op) => format!("'{}'", op),
        TokenKind::Punctuation(c) => format!("'{}'", c),
        TokenKind::Keyword(k) => format!("keyword '{}'", k),
        TokenKind::Eof => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use pretty_assertions::assert_eq;

    fn parse_main_body(body: &str) -> Vec<Stmt> {
        let program = parse_program(&format!("func main() {{ {} }}", body)).unwrap();
        program.functions[0].body.clone()
    }

    #[test]
    fn parses_functions_and_ref_params() {
        let program = parse_program("func f(a, ref b) { return a; } func main() { f(1, x); }")
            .unwrap();
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions[0].params, vec![Param::value("a"), Param::reference("b")]);
        assert_eq!(program.functions[1].name, "main");
    }

    #[test]
    fn respects_operator_precedence() {
        let body = parse_main_body("x = 1 + 2 * 3 == 7 && !false;");
        let expected = Expr::binary(
            BinaryOp::And,
            Expr::binary(
                BinaryOp::Eq,
                Expr::binary(
                    BinaryOp::Add,
                    Expr::Int(1),
                    Expr::binary(BinaryOp::Mul, Expr::Int(2), Expr::Int(3)),
                ),
                Expr::Int(7),
            ),
            Expr::Unary { op: UnaryOp::Not, operand: Box::new(Expr::Bool(false)) },
        );
        assert_eq!(body, vec![Stmt::Assign { target: AssignTarget::Var("x".into()), value: expected }]);
    }

    #[test]
    fn parses_objects_fields_and_methods() {
        let body = parse_main_body("o = @; o.x = 5; o.inc(1); print(o.x);");
        assert_eq!(body.len(), 4);
        assert_eq!(
            body[1],
            Stmt::Assign {
                target: AssignTarget::Field { object: Expr::var("o"), field: "x".into() },
                value: Expr::Int(5),
            }
        );
        assert!(matches!(
            &body[2],
            Stmt::Call(Call { callee: Callee::Method { method, .. }, args }) if method == "inc" && args.len() == 1
        ));
    }

    #[test]
    fn parses_else_if_chains_and_lambdas() {
        let body = parse_main_body(
            "if (x) { return 1; } else if (y) { return; } f = lambda(ref a) { a = 1; };",
        );
        let Stmt::If { else_branch: Some(else_branch), .. } = &body[0] else {
            panic!("expected if statement");
        };
        assert!(matches!(else_branch[0], Stmt::If { .. }));
        let Stmt::Assign { value: Expr::Lambda(def), .. } = &body[1] else {
            panic!("expected lambda assignment");
        };
        assert_eq!(def.params, vec![Param::reference("a")]);
    }

    #[test]
    fn reports_errors_with_locations() {
        let err = parse_program("func main() {\n  x = ;\n}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert_eq!(err.location.line, 2);

        let err = parse_program("func main() { 1 + 2; }").unwrap_err();
        assert!(err.message.contains("assignment or function call"));

        let err = parse_program("x = 1;").unwrap_err();
        assert!(err.message.contains("expected function definition"));
    }
}
