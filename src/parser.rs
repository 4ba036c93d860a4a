use crate::ast::{Operator, Statement, VariableValue};
use crate::lexer::Lexer;
use crate::object::{Class, Method};
use crate::token::{Token, TokenType};
use custom_error::custom_error;
use std::collections::HashMap;
use std::rc::Rc;

custom_error! {
    pub ParseError
    UnexpectedToken{expected: String, got: String} = "expected {expected}, got {got}",
    UnknownClass{name: String} = "\"{name}\" is not a defined class",
}

/// Recursive-descent parser over the lexer cursor.
///
/// Class definitions are resolved while parsing: the parser keeps a table of
/// classes declared so far, so `Name(args)` can be bound to its class
/// definition immediately and an unknown class name (including a forward
/// reference) is a parse error.
pub struct Parser {
    lexer: Lexer,
    classes: HashMap<String, Rc<Class>>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            classes: HashMap::new(),
        }
    }

    /// Parses the whole program into a compound of top-level statements.
    pub fn parse_program(mut self) -> Result<Statement, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenType::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Statement::Compound(statements))
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.lexer.current().is(token_type)
    }

    fn accept(&mut self, token: &Token) -> bool {
        if self.lexer.current() == token {
            self.lexer.advance();
            true
        } else {
            false
        }
    }

    fn accept_char(&mut self, c: u8) -> bool {
        self.accept(&Token::Char(c))
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ParseError> {
        if *self.lexer.current() == token {
            self.lexer.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_char(&mut self, c: u8) -> Result<(), ParseError> {
        let expected = format!("\"{}\"", c as char);
        self.expect(Token::Char(c), &expected)
    }

    fn expect_id(&mut self) -> Result<String, ParseError> {
        match self.lexer.current() {
            Token::Id(name) => {
                let name = name.clone();
                self.lexer.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_owned(),
            got: format!("{:?}", self.lexer.current()),
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.lexer.current() {
            Token::Class => self.parse_class_definition(),
            Token::If => self.parse_if(),
            _ => {
                let stmt = self.parse_simple_statement()?;
                self.expect(Token::Newline, "end of line")?;
                Ok(stmt)
            }
        }
    }

    fn parse_class_definition(&mut self) -> Result<Statement, ParseError> {
        self.lexer.advance();
        let name = self.expect_id()?;
        let parent = if self.accept_char(b'(') {
            let parent_name = self.expect_id()?;
            self.expect_char(b')')?;
            match self.classes.get(&parent_name) {
                Some(class) => Some(Rc::clone(class)),
                None => return Err(ParseError::UnknownClass { name: parent_name }),
            }
        } else {
            None
        };
        self.expect_char(b':')?;
        self.expect(Token::Newline, "end of line")?;
        self.expect(Token::Indent, "an indented class body")?;
        let mut methods = Vec::new();
        while !self.check(TokenType::Dedent) {
            methods.push(self.parse_method_def()?);
        }
        self.lexer.advance();
        let class = Class::new(name.clone(), methods, parent);
        self.classes.insert(name, Rc::clone(&class));
        Ok(Statement::ClassDefinition(class))
    }

    fn parse_method_def(&mut self) -> Result<Method, ParseError> {
        self.expect(Token::Def, "\"def\"")?;
        let name = self.expect_id()?;
        self.expect_char(b'(')?;
        let mut formal_params = Vec::new();
        if !self.accept_char(b')') {
            loop {
                formal_params.push(self.expect_id()?);
                if !self.accept_char(b',') {
                    break;
                }
            }
            self.expect_char(b')')?;
        }
        self.expect_char(b':')?;
        let body = self.parse_suite()?;
        Ok(Method {
            name,
            formal_params,
            body: Statement::MethodBody(Box::new(body)),
        })
    }

    /// An indented block of at least one statement.
    fn parse_suite(&mut self) -> Result<Statement, ParseError> {
        self.expect(Token::Newline, "end of line")?;
        self.expect(Token::Indent, "an indented block")?;
        let mut statements = Vec::new();
        while !self.check(TokenType::Dedent) {
            statements.push(self.parse_statement()?);
        }
        self.lexer.advance();
        Ok(Statement::Compound(statements))
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.lexer.advance();
        let condition = self.parse_expression()?;
        self.expect_char(b':')?;
        let then_body = self.parse_suite()?;
        let else_body = if self.check(TokenType::Else) {
            self.lexer.advance();
            self.expect_char(b':')?;
            Some(Box::new(self.parse_suite()?))
        } else {
            None
        };
        Ok(Statement::IfElse {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_body,
        })
    }

    fn parse_simple_statement(&mut self) -> Result<Statement, ParseError> {
        match self.lexer.current() {
            Token::Return => {
                self.lexer.advance();
                let value = if self.check(TokenType::Newline) {
                    Statement::NoneConst
                } else {
                    self.parse_expression()?
                };
                Ok(Statement::Return(Box::new(value)))
            }
            Token::Print => {
                self.lexer.advance();
                let mut args = Vec::new();
                if !self.check(TokenType::Newline) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.accept_char(b',') {
                            break;
                        }
                    }
                }
                Ok(Statement::Print(args))
            }
            _ => match self.parse_expression()? {
                Statement::Variable(mut var) => {
                    if self.accept_char(b'=') {
                        let value = Box::new(self.parse_expression()?);
                        return Ok(match var.tail.pop() {
                            Some(field) => Statement::FieldAssignment {
                                object: var,
                                field,
                                value,
                            },
                            None => Statement::Assignment {
                                name: var.head,
                                value,
                            },
                        });
                    }
                    Ok(Statement::Variable(var))
                }
                expr => Ok(expr),
            },
        }
    }

    fn binary(op: Operator, lhs: Statement, rhs: Statement) -> Statement {
        Statement::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_expression(&mut self) -> Result<Statement, ParseError> {
        let mut lhs = self.parse_and_expression()?;
        while self.accept(&Token::Or) {
            let rhs = self.parse_and_expression()?;
            lhs = Self::binary(Operator::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and_expression(&mut self) -> Result<Statement, ParseError> {
        let mut lhs = self.parse_not_expression()?;
        while self.accept(&Token::And) {
            let rhs = self.parse_not_expression()?;
            lhs = Self::binary(Operator::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not_expression(&mut self) -> Result<Statement, ParseError> {
        if self.accept(&Token::Not) {
            let arg = self.parse_not_expression()?;
            Ok(Statement::Not(Box::new(arg)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Statement, ParseError> {
        let lhs = self.parse_sum()?;
        let op = match self.lexer.current() {
            Token::Eq => Operator::Eq,
            Token::NotEq => Operator::NotEq,
            Token::LessOrEq => Operator::LessOrEq,
            Token::GreaterOrEq => Operator::GreaterOrEq,
            Token::Char(b'<') => Operator::Less,
            Token::Char(b'>') => Operator::Greater,
            _ => return Ok(lhs),
        };
        self.lexer.advance();
        let rhs = self.parse_sum()?;
        Ok(Self::binary(op, lhs, rhs))
    }

    fn parse_sum(&mut self) -> Result<Statement, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.lexer.current() {
                Token::Char(b'+') => Operator::Add,
                Token::Char(b'-') => Operator::Sub,
                _ => return Ok(lhs),
            };
            self.lexer.advance();
            let rhs = self.parse_term()?;
            lhs = Self::binary(op, lhs, rhs);
        }
    }

    fn parse_term(&mut self) -> Result<Statement, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.lexer.current() {
                Token::Char(b'*') => Operator::Mult,
                Token::Char(b'/') => Operator::Div,
                _ => return Ok(lhs),
            };
            self.lexer.advance();
            let rhs = self.parse_unary()?;
            lhs = Self::binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Statement, ParseError> {
        if self.accept_char(b'-') {
            // Negation is subtraction from zero; there is no unary node.
            let arg = self.parse_unary()?;
            Ok(Self::binary(
                Operator::Sub,
                Statement::NumericConst(0),
                arg,
            ))
        } else if self.accept_char(b'+') {
            self.parse_unary()
        } else {
            self.parse_postfix()
        }
    }

    /// Further method calls chained onto a call result: `a.b().c()`.
    fn parse_postfix(&mut self) -> Result<Statement, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.accept_char(b'.') {
            let method = self.expect_id()?;
            self.expect_char(b'(')?;
            let args = self.parse_args()?;
            expr = Statement::MethodCall {
                object: Box::new(expr),
                method,
                args,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Statement, ParseError> {
        match self.lexer.current().clone() {
            Token::Number(n) => {
                self.lexer.advance();
                Ok(Statement::NumericConst(n))
            }
            Token::String(s) => {
                self.lexer.advance();
                Ok(Statement::StringConst(s))
            }
            Token::True => {
                self.lexer.advance();
                Ok(Statement::BoolConst(true))
            }
            Token::False => {
                self.lexer.advance();
                Ok(Statement::BoolConst(false))
            }
            Token::None => {
                self.lexer.advance();
                Ok(Statement::NoneConst)
            }
            Token::Char(b'(') => {
                self.lexer.advance();
                let expr = self.parse_expression()?;
                self.expect_char(b')')?;
                Ok(expr)
            }
            Token::Id(name) => {
                self.lexer.advance();
                self.parse_name(name)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// An identifier-rooted expression: `str(...)`, class instantiation, a
    /// dotted variable value, or a method call on a dotted prefix.
    fn parse_name(&mut self, name: String) -> Result<Statement, ParseError> {
        if self.accept_char(b'(') {
            if name == "str" {
                let arg = self.parse_expression()?;
                self.expect_char(b')')?;
                return Ok(Statement::Stringify(Box::new(arg)));
            }
            let args = self.parse_args()?;
            return match self.classes.get(&name) {
                Some(class) => Ok(Statement::NewInstance {
                    class: Rc::clone(class),
                    args,
                }),
                None => Err(ParseError::UnknownClass { name }),
            };
        }
        let mut var = VariableValue::new(&name);
        while self.accept_char(b'.') {
            let id = self.expect_id()?;
            if self.accept_char(b'(') {
                let args = self.parse_args()?;
                return Ok(Statement::MethodCall {
                    object: Box::new(Statement::Variable(var)),
                    method: id,
                    args,
                });
            }
            var.tail.push(id);
        }
        Ok(Statement::Variable(var))
    }

    /// Argument list with the opening parenthesis already consumed.
    fn parse_args(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut args = Vec::new();
        if self.accept_char(b')') {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.accept_char(b',') {
                break;
            }
        }
        self.expect_char(b')')?;
        Ok(args)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(input: &str) -> Vec<Statement> {
        let lexer = Lexer::new(input.as_bytes()).expect("lex error");
        match Parser::new(lexer).parse_program().expect("parse error") {
            Statement::Compound(statements) => statements,
            other => panic!("expected a compound program, got {:?}", other),
        }
    }

    fn parse_err(input: &str) -> ParseError {
        let lexer = Lexer::new(input.as_bytes()).expect("lex error");
        match Parser::new(lexer).parse_program() {
            Ok(program) => panic!("expected a parse error, got {:?}", program),
            Err(e) => e,
        }
    }

    #[test]
    fn test_assignment_forms() {
        let stmts = parse("x = 1\nx.f = 2\na.b.c = 3\n");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0], Statement::Assignment { name, .. } if name == "x"));
        assert!(matches!(
            &stmts[1],
            Statement::FieldAssignment { object, field, .. }
                if object.head == "x" && object.tail.is_empty() && field == "f"
        ));
        assert!(matches!(
            &stmts[2],
            Statement::FieldAssignment { object, field, .. }
                if object.head == "a" && object.tail == vec!["b".to_owned()] && field == "c"
        ));
    }

    #[test]
    fn test_precedence() {
        let stmts = parse("x = 1 + 2 * 3\n");
        match &stmts[0] {
            Statement::Assignment { value, .. } => match value.as_ref() {
                Statement::Binary { op, lhs, rhs } => {
                    assert_eq!(*op, Operator::Add);
                    assert!(matches!(lhs.as_ref(), Statement::NumericConst(1)));
                    assert!(
                        matches!(rhs.as_ref(), Statement::Binary { op, .. } if *op == Operator::Mult)
                    );
                }
                other => panic!("expected a binary node, got {:?}", other),
            },
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_binds_looser_than_sum() {
        let stmts = parse("x = 1 + 2 < 4\n");
        match &stmts[0] {
            Statement::Assignment { value, .. } => {
                assert!(
                    matches!(value.as_ref(), Statement::Binary { op, .. } if *op == Operator::Less)
                );
            }
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_ladder() {
        let stmts = parse("x = not 1 and 2 or 3\n");
        match &stmts[0] {
            Statement::Assignment { value, .. } => {
                // ((not 1) and 2) or 3
                assert!(
                    matches!(value.as_ref(), Statement::Binary { op, .. } if *op == Operator::Or)
                );
            }
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_class_definition_and_instantiation() {
        let stmts = parse(
            "class Pair:
  def __init__(a, b):
    self.a = a
    self.b = b

p = Pair(1, 2)
",
        );
        assert_eq!(stmts.len(), 2);
        match &stmts[0] {
            Statement::ClassDefinition(class) => {
                assert_eq!(class.name(), "Pair");
                let init = class.method("__init__").expect("missing __init__");
                assert_eq!(init.formal_params, vec!["a".to_owned(), "b".to_owned()]);
                assert!(matches!(init.body, Statement::MethodBody(_)));
            }
            other => panic!("expected a class definition, got {:?}", other),
        }
        match &stmts[1] {
            Statement::Assignment { value, .. } => match value.as_ref() {
                Statement::NewInstance { class, args } => {
                    assert_eq!(class.name(), "Pair");
                    assert_eq!(args.len(), 2);
                }
                other => panic!("expected an instantiation, got {:?}", other),
            },
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_inheritance_resolves_parent() {
        let stmts = parse(
            "class A:
  def m():
    return 1

class B(A):
  def extra():
    return 2
",
        );
        match &stmts[1] {
            Statement::ClassDefinition(class) => {
                assert_eq!(class.name(), "B");
                // m is reachable through the parent chain.
                assert!(class.method("m").is_some());
            }
            other => panic!("expected a class definition, got {:?}", other),
        }
    }

    #[test]
    fn test_method_call_chains() {
        let stmts = parse("x = a.b.c(1).d()\n");
        match &stmts[0] {
            Statement::Assignment { value, .. } => match value.as_ref() {
                Statement::MethodCall { object, method, .. } => {
                    assert_eq!(method, "d");
                    match object.as_ref() {
                        Statement::MethodCall { object, method, args } => {
                            assert_eq!(method, "c");
                            assert_eq!(args.len(), 1);
                            assert!(matches!(
                                object.as_ref(),
                                Statement::Variable(var)
                                    if var.head == "a" && var.tail == vec!["b".to_owned()]
                            ));
                        }
                        other => panic!("expected an inner call, got {:?}", other),
                    }
                }
                other => panic!("expected a method call, got {:?}", other),
            },
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_stringify_and_print() {
        let stmts = parse("print str(1), 'x'\nprint\n");
        match &stmts[0] {
            Statement::Print(args) => {
                assert_eq!(args.len(), 2);
                assert!(matches!(&args[0], Statement::Stringify(_)));
            }
            other => panic!("expected a print, got {:?}", other),
        }
        assert!(matches!(&stmts[1], Statement::Print(args) if args.is_empty()));
    }

    #[test]
    fn test_return_without_value_is_none() {
        let stmts = parse(
            "class A:
  def m():
    return
",
        );
        match &stmts[0] {
            Statement::ClassDefinition(class) => {
                let body = match &class.method("m").expect("missing m").body {
                    Statement::MethodBody(body) => body,
                    other => panic!("expected a method body, got {:?}", other),
                };
                match body.as_ref() {
                    Statement::Compound(stmts) => assert!(matches!(
                        &stmts[0],
                        Statement::Return(value) if matches!(value.as_ref(), Statement::NoneConst)
                    )),
                    other => panic!("expected a compound, got {:?}", other),
                }
            }
            other => panic!("expected a class definition, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_desugars_to_subtraction() {
        let stmts = parse("x = -5\n");
        match &stmts[0] {
            Statement::Assignment { value, .. } => match value.as_ref() {
                Statement::Binary { op, lhs, .. } => {
                    assert_eq!(*op, Operator::Sub);
                    assert!(matches!(lhs.as_ref(), Statement::NumericConst(0)));
                }
                other => panic!("expected a binary node, got {:?}", other),
            },
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        assert!(matches!(
            parse_err("x = Missing()\n"),
            ParseError::UnknownClass { .. }
        ));
        assert!(matches!(
            parse_err("class A(Missing):\n  def m():\n    return 1\n"),
            ParseError::UnknownClass { .. }
        ));
    }

    #[test]
    fn test_malformed_programs_are_rejected() {
        // def outside a class body
        assert!(matches!(
            parse_err("def f():\n  return 1\n"),
            ParseError::UnexpectedToken { .. }
        ));
        // class body without methods
        assert!(matches!(
            parse_err("class A:\nx = 1\n"),
            ParseError::UnexpectedToken { .. }
        ));
        // field read chained onto a call result
        assert!(matches!(
            parse_err("x = a.b().c\n"),
            ParseError::UnexpectedToken { .. }
        ));
        // dangling operator
        assert!(matches!(
            parse_err("x = 1 +\n"),
            ParseError::UnexpectedToken { .. }
        ));
    }
}
