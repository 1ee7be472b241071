#[cfg(test)]
mod parser_tests {
    use sable::expr::Expr;
    use sable::parser::Parser;
    use sable::scanner::Scanner;
    use sable::stmt::Stmt;
    use sable::token::{Token, TokenType};

    fn parse(source: &str) -> (Vec<Stmt>, Vec<String>) {
        let tokens: Vec<Token> = Scanner::new(source)
            .collect::<Result<Vec<_>, _>>()
            .expect("source should scan cleanly");

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        let errors = parser.errors().iter().map(ToString::to_string).collect();

        (statements, errors)
    }

    fn parse_clean(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let statements = parse_clean("print 1 + 2 * 3;");

        let Stmt::Print(Expr::Binary {
            operator, right, ..
        }) = &statements[0]
        else {
            panic!("expected print of a binary expression");
        };

        assert_eq!(operator.token_type, TokenType::PLUS);

        let Expr::Binary { operator, .. } = right.as_ref() else {
            panic!("expected nested binary on the right");
        };

        assert_eq!(operator.token_type, TokenType::STAR);
    }

    #[test]
    fn assignment_is_right_associative() {
        let statements = parse_clean("a = b = 1;");

        let Stmt::Expression(Expr::Assign { value, .. }) = &statements[0] else {
            panic!("expected an assignment");
        };

        assert!(matches!(value.as_ref(), Expr::Assign { .. }));
    }

    #[test]
    fn assignment_to_property_becomes_set() {
        let statements = parse_clean("a.b = 1;");

        assert!(matches!(
            &statements[0],
            Stmt::Expression(Expr::Set { .. })
        ));
    }

    #[test]
    fn invalid_assignment_target_reports_without_unwinding() {
        let (statements, errors) = parse("1 = 2; print 3;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Invalid assignment target."), "{}", errors[0]);

        // Both statements survive: the bad assignment degrades to its
        // left-hand side and the print still parses.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn for_desugars_to_block_and_while() {
        let statements = parse_clean("for (var i = 0; i < 3; i = i + 1) print i;");

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected the initializer block");
        };

        assert!(matches!(&outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected the desugared while loop");
        };

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected the increment block");
        };

        assert!(matches!(&inner[0], Stmt::Print(_)));
        assert!(matches!(&inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn for_without_clauses_is_a_bare_while_true() {
        let statements = parse_clean("for (;;) print 1;");

        let Stmt::While { condition, body } = &statements[0] else {
            panic!("expected a while loop with no wrapping block");
        };

        let Expr::Literal(token) = condition else {
            panic!("expected a literal condition");
        };

        assert_eq!(token.token_type, TokenType::TRUE);
        assert!(matches!(body.as_ref(), Stmt::Print(_)));
    }

    #[test]
    fn class_superclass_parses_as_variable() {
        let statements = parse_clean("class B < A { method() { return 1; } }");

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected a class declaration");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { .. })));
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name.lexeme, "method");
    }

    #[test]
    fn super_and_this_parse_inside_methods() {
        parse_clean("class B < A { m() { return super.m() + this.x; } }");
    }

    #[test]
    fn synchronize_recovers_at_statement_boundary() {
        let (statements, errors) = parse("var = 1; print 2;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Expect variable name."), "{}", errors[0]);

        // The declaration was discarded, the print survived.
        assert_eq!(statements.len(), 1);
        assert!(matches!(&statements[0], Stmt::Print(_)));
    }

    #[test]
    fn each_bad_declaration_yields_one_error() {
        let (statements, errors) = parse("var = 1; class; print 3;");

        assert_eq!(errors.len(), 2);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn params_at_the_limit_are_legal() {
        let params = (0..255)
            .map(|i| format!("p{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        parse_clean(&format!("fun f({}) {{}}", params));
    }

    #[test]
    fn params_over_the_limit_report_but_continue() {
        let params = (0..256)
            .map(|i| format!("p{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let (statements, errors) = parse(&format!("fun f({}) {{}} print 1;", params));

        assert_eq!(errors.len(), 1);
        assert!(
            errors[0].contains("Cannot have more than 255 parameters."),
            "{}",
            errors[0]
        );

        // Parsing carried on: the function and the print both exist.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn arguments_over_the_limit_report_but_continue() {
        let arguments = (0..256)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let (statements, errors) = parse(&format!("f({});", arguments));

        assert_eq!(errors.len(), 1);
        assert!(
            errors[0].contains("Cannot have more than 255 arguments."),
            "{}",
            errors[0]
        );
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn call_chains_left_to_right() {
        let statements = parse_clean("a.b(1).c;");

        let Stmt::Expression(Expr::Get { object, name }) = &statements[0] else {
            panic!("expected a trailing property access");
        };

        assert_eq!(name.lexeme, "c");
        assert!(matches!(object.as_ref(), Expr::Call { .. }));
    }

    #[test]
    fn missing_expression_is_reported_with_line() {
        let (_, errors) = parse("print\n;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("[line 2]"), "{}", errors[0]);
        assert!(errors[0].contains("Expect expression."), "{}", errors[0]);
    }
}
