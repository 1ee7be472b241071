#[cfg(test)]
mod scanner_tests {
    use sable::scanner::Scanner;
    use sable::token::{Token, TokenType};

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();

        assert_eq!(
            tokens.len(),
            expected.len(),
            "token count mismatch for {:?}",
            source
        );

        for (index, (token, (token_type, lexeme))) in tokens.iter().zip(expected).enumerate() {
            assert_eq!(token.token_type, *token_type, "type at index {}", index);
            assert_eq!(token.lexeme, *lexeme, "lexeme at index {}", index);
        }
    }

    #[test]
    fn test_scanner_01_single_character_tokens() {
        assert_token_sequence(
            "(.-){;,}*+",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::DOT, "."),
                (TokenType::MINUS, "-"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::COMMA, ","),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::STAR, "*"),
                (TokenType::PLUS, "+"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_one_or_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= / ;",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_line_comment_runs_to_newline() {
        assert_token_sequence(
            "var x // this is ignored = 1\n;",
            &[
                (TokenType::VARIABLE, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords_and_identifiers() {
        assert_token_sequence(
            "fun forge var variable_ _under99",
            &[
                (TokenType::FUNCTION, "fun"),
                (TokenType::IDENTIFIER, "forge"),
                (TokenType::VARIABLE, "var"),
                (TokenType::IDENTIFIER, "variable_"),
                (TokenType::IDENTIFIER, "_under99"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_string_literal_excludes_quotes() {
        let tokens: Vec<Token> = Scanner::new("\"hello\"").filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "\"hello\"");

        match &tokens[0].token_type {
            TokenType::STRING(literal) => assert_eq!(literal, "hello"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_06_string_may_span_newlines() {
        let tokens: Vec<Token> = Scanner::new("\"a\nb\" c")
            .filter_map(Result::ok)
            .collect();

        // The identifier after the string sits on line 2.
        assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_07_unterminated_string_is_an_error() {
        let results: Vec<_> = Scanner::new("\"never closed").collect();

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Unterminated string."), "{}", errors[0]);

        // EOF still arrives after the error.
        let last = results.last().unwrap().as_ref().unwrap();
        assert_eq!(last.token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_08_number_literals() {
        let tokens: Vec<Token> = Scanner::new("123 123.456").filter_map(Result::ok).collect();

        match &tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 123.0),
            other => panic!("expected NUMBER, got {:?}", other),
        }

        match &tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 123.456),
            other => panic!("expected NUMBER, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_09_dangling_dots_are_not_part_of_numbers() {
        assert_token_sequence(
            "42. .5",
            &[
                (TokenType::NUMBER(42.0), "42"),
                (TokenType::DOT, "."),
                (TokenType::DOT, "."),
                (TokenType::NUMBER(5.0), "5"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_10_unexpected_chars_reported_and_skipped() {
        let results: Vec<_> = Scanner::new(";.@(#").collect();

        // SEMICOLON, DOT, error for '@', LEFT_PAREN, error for '#', EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character."),
                "unexpected message: {}",
                err
            );
        }

        let last = results.last().unwrap().as_ref().unwrap();
        assert_eq!(last.token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_11_eof_is_emitted_exactly_once() {
        let mut scanner = Scanner::new("1");

        let first = scanner.next().unwrap().unwrap();
        assert_eq!(first.token_type, TokenType::NUMBER(0.0));

        let second = scanner.next().unwrap().unwrap();
        assert_eq!(second.token_type, TokenType::EOF);

        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scanner_12_token_display_format() {
        let tokens: Vec<Token> = Scanner::new("42 4.5 \"hi\" foo")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].to_string(), "NUMBER 42 42.0");
        assert_eq!(tokens[1].to_string(), "NUMBER 4.5 4.5");
        assert_eq!(tokens[2].to_string(), "STRING \"hi\" hi");
        assert_eq!(tokens[3].to_string(), "IDENTIFIER foo null");
    }
}
