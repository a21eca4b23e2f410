//! Statement grammar

use std::rc::Rc;

use super::Parser;
use super::ast::{Node, Span};
use super::error::{Parsed, SyntaxError, SyntaxErrorKind};
use super::lexer;

impl Parser {
    /// Parse a whole script body
    ///
    /// Anything left after the statement list, other than trivia, is an
    /// unexpected token.
    pub fn parse_script(&mut self) -> Result<Vec<Node>, SyntaxError> {
        let statements = self.parse_statement_list()?;
        self.skip_trivia(true);
        if !self.scanner.is_eof() {
            let start = self.position();
            self.scanner.advance();
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, start));
        }
        Ok(statements)
    }

    /// Greedy repetition of statements and declarations
    pub(super) fn parse_statement_list(&mut self) -> Result<Vec<Node>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            if let Some(statement) = self.parse_statement()? {
                statements.push(statement);
            } else if let Some(declaration) = self.parse_declaration()? {
                statements.push(declaration);
            } else {
                return Ok(statements);
            }
        }
    }

    pub(super) fn parse_statement(&mut self) -> Parsed<Node> {
        self.longest(&[Self::parse_expression_statement, Self::parse_return_statement])
    }

    /// Whether the next token starts something an expression statement
    /// may not begin with: a block, `function`, `class`, `let [`, or
    /// `async function` on one line
    fn starts_restricted(&mut self) -> bool {
        self.lookahead(|p| {
            p.skip_trivia(true);
            if p.scanner.peek() == Some('{') {
                return true;
            }
            match lexer::identifier_name(&mut p.scanner).as_deref() {
                Some("function" | "class") => true,
                Some("let") => p.eat("[").is_some(),
                Some("async") => {
                    p.skip_trivia(false) && lexer::keyword(&mut p.scanner, "function").is_some()
                }
                _ => false,
            }
        })
    }

    /// `expression ;`
    pub(super) fn parse_expression_statement(&mut self) -> Parsed<Node> {
        if self.starts_restricted() {
            return Ok(None);
        }
        let Some(expression) = self.parse_expression()? else {
            return Ok(None);
        };
        let start = expression.span().start;
        if self.eat(";").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingSemicolon, start));
        }
        let span = Span::new(start, self.position());
        Ok(Some(Node::ExpressionStatement {
            expression: Rc::new(expression),
            span,
        }))
    }

    /// `return [no line terminator here] [expression] ;`
    pub(super) fn parse_return_statement(&mut self) -> Parsed<Node> {
        let Some(start) = self.eat_keyword("return") else {
            return Ok(None);
        };
        let same_line = self.lookahead(|p| p.skip_trivia(false));
        let argument = if same_line {
            self.parse_expression()?.map(Rc::new)
        } else {
            None
        };
        if self.eat(";").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingSemicolon, start));
        }
        let span = Span::new(start, self.position());
        Ok(Some(Node::Return { argument, span }))
    }

    /// Declaration (only function declarations so far)
    pub(super) fn parse_declaration(&mut self) -> Parsed<Node> {
        self.parse_function_declaration(false)
    }

    /// `function name ( params [, ...rest] ) { body }`
    ///
    /// The name may be left out only for a default export.
    pub(super) fn parse_function_declaration(&mut self, default_export: bool) -> Parsed<Node> {
        let Some(start) = self.eat_keyword("function") else {
            return Ok(None);
        };

        let name = self.parse_binding_identifier();
        if name.is_none() && !default_export {
            return Err(self.error(SyntaxErrorKind::MissingIdentifier, start));
        }

        if self.eat("(").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingOpenParen, start));
        }
        let (params, rest) = self.parse_formal_parameters(start)?;
        if self.eat(")").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingCloseParen, start));
        }

        if self.eat("{").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingOpenBrace, start));
        }
        let body = self.nested(start, Self::parse_statement_list)?;
        if self.eat("}").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingCloseBrace, start));
        }

        let span = Span::new(start, self.position());
        Ok(Some(Node::FunctionDeclaration {
            name: name.map(Rc::new),
            params,
            rest: rest.map(Rc::new),
            body,
            span,
        }))
    }

    /// Comma-separated binding identifiers, optionally ending in a rest
    /// parameter; a trailing comma is allowed before `)`
    fn parse_formal_parameters(
        &mut self,
        start: usize,
    ) -> Result<(Vec<Node>, Option<Node>), SyntaxError> {
        let mut params = Vec::new();
        loop {
            if self.eat("...").is_some() {
                let Some(rest) = self.parse_binding_identifier() else {
                    return Err(self.error(SyntaxErrorKind::MissingIdentifier, start));
                };
                return Ok((params, Some(rest)));
            }
            let Some(param) = self.parse_binding_identifier() else {
                return Ok((params, None));
            };
            params.push(param);
            if self.eat(",").is_none() {
                return Ok((params, None));
            }
        }
    }

    pub(super) fn parse_binding_identifier(&mut self) -> Option<Node> {
        let origin = self.position();
        self.skip_trivia(true);
        let start = self.position();
        match lexer::identifier(&mut self.scanner) {
            Some(name) => Some(Node::BindingIdentifier {
                name,
                span: Span::new(start, self.position()),
            }),
            None => {
                self.scanner.set_position(origin);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(src: &str) -> Result<Vec<Node>, SyntaxError> {
        Parser::new(src).parse_script()
    }

    fn error_kind(src: &str) -> SyntaxErrorKind {
        script(src).unwrap_err().kind
    }

    #[test]
    fn test_statement_list() {
        let statements = script("1; 2;\n// done\n3;").unwrap();
        assert_eq!(statements.len(), 3);
        assert!(
            statements
                .iter()
                .all(|s| matches!(s, Node::ExpressionStatement { .. }))
        );
        assert_eq!(statements[1].span(), Span::new(3, 5));
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(script(""), Ok(vec![]));
        assert_eq!(script("  /* nothing */ \n"), Ok(vec![]));
    }

    #[test]
    fn test_missing_semicolon() {
        assert_eq!(error_kind("1 + 2"), SyntaxErrorKind::MissingSemicolon);
        assert_eq!(error_kind("(1;"), SyntaxErrorKind::MissingCloseParen);
        assert_eq!(error_kind("true ? 1;"), SyntaxErrorKind::MissingColon);
    }

    #[test]
    fn test_trailing_input_is_unexpected() {
        let err = script("1; )").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken);
        assert_eq!(err.span, Span::new(3, 4));
    }

    #[test]
    fn test_return_statement() {
        let statements = script("return 1 + 2; return;").unwrap();
        assert!(matches!(
            &statements[0],
            Node::Return {
                argument: Some(_),
                ..
            }
        ));
        assert!(matches!(
            &statements[1],
            Node::Return { argument: None, .. }
        ));

        // No line terminator between `return` and its argument
        assert_eq!(error_kind("return\n1;"), SyntaxErrorKind::MissingSemicolon);
    }

    #[test]
    fn test_expression_statement_restrictions() {
        for src in ["{ }", "function f() {}", "class A {}", "let [a] = b;", "async function f() {}"] {
            let mut p = Parser::new(src);
            assert_eq!(p.parse_expression_statement(), Ok(None), "{:?}", src);
            assert_eq!(p.position(), 0);
        }
        // `async` followed by a line break is an ordinary identifier
        let mut p = Parser::new("async\nfunction");
        assert!(!p.starts_restricted());
    }

    #[test]
    fn test_function_declaration() {
        let statements = script("function add(a, b, ...rest) { return a; }").unwrap();
        let Node::FunctionDeclaration {
            name,
            params,
            rest,
            body,
            span,
        } = &statements[0]
        else {
            panic!("expected function declaration");
        };
        assert!(matches!(name.as_deref(), Some(Node::BindingIdentifier { name, .. }) if name == "add"));
        assert_eq!(params.len(), 2);
        assert!(rest.is_some());
        assert_eq!(body.len(), 1);
        assert_eq!(*span, Span::new(0, 41));
    }

    #[test]
    fn test_function_declaration_errors() {
        assert_eq!(error_kind("function () {}"), SyntaxErrorKind::MissingIdentifier);
        assert_eq!(error_kind("function f {}"), SyntaxErrorKind::MissingOpenParen);
        assert_eq!(error_kind("function f(a {}"), SyntaxErrorKind::MissingCloseParen);
        assert_eq!(error_kind("function f(a) 1;"), SyntaxErrorKind::MissingOpenBrace);
        assert_eq!(error_kind("function f(a) { 1;"), SyntaxErrorKind::MissingCloseBrace);
        assert_eq!(error_kind("function f(...) {}"), SyntaxErrorKind::MissingIdentifier);
    }

    #[test]
    fn test_default_export_function_may_be_anonymous() {
        let mut p = Parser::new("function (x) {}");
        let node = p.parse_function_declaration(true).unwrap().unwrap();
        assert!(matches!(node, Node::FunctionDeclaration { name: None, .. }));
    }

    #[test]
    fn test_function_nesting_limit() {
        let src = format!("{}{}", "function f() { ".repeat(3), "}".repeat(3));
        assert_eq!(Parser::with_max_depth(&src, 3).parse_script().map(|s| s.len()), Ok(1));

        let err = Parser::with_max_depth(&src, 2).parse_script().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::NestingTooDeep);
        assert_eq!(err.span.start, 30);
    }
}
