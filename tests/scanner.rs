#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;
    use tree_lox as lox;

    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let tokens: Vec<_> = Scanner::new(source).filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn layout(tokens: &[Token]) -> Vec<(String, usize, usize, usize)> {
        tokens
            .iter()
            .map(|t| (t.to_string(), t.line, t.start, t.length))
            .collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= /",
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
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { init() { super.init(); this.x = nil; } } print _tmp1",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::SUPER, "super"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::THIS, "this"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::NIL, "nil"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::IDENTIFIER, "print"),
                (TokenType::IDENTIFIER, "_tmp1"),
            ],
        );
    }

    #[test]
    fn test_scanner_04_lines_columns_and_lengths() {
        let (tokens, errors) = scan_lines(&[
            "var x = 5; // comment",
            "if( x / 2 >= 0 ) \"hello world\";",
        ]);

        assert!(errors.is_empty());

        let expected: Vec<(String, usize, usize, usize)> = [
            ("VAR var null", 1, 0, 3),
            ("IDENTIFIER x null", 1, 4, 1),
            ("EQUAL = null", 1, 6, 1),
            ("NUMBER 5 5.0", 1, 8, 1),
            ("SEMICOLON ; null", 1, 9, 1),
            ("IF if null", 2, 0, 2),
            ("LEFT_PAREN ( null", 2, 2, 1),
            ("IDENTIFIER x null", 2, 4, 1),
            ("SLASH / null", 2, 6, 1),
            ("NUMBER 2 2.0", 2, 8, 1),
            ("GREATER_EQUAL >= null", 2, 10, 2),
            ("NUMBER 0 0.0", 2, 13, 1),
            ("RIGHT_PAREN ) null", 2, 15, 1),
            ("STRING \"hello world\" hello world", 2, 17, 13),
            ("SEMICOLON ; null", 2, 30, 1),
        ]
        .into_iter()
        .map(|(s, line, start, length)| (s.to_string(), line, start, length))
        .collect();

        assert_eq!(layout(&tokens), expected);
    }

    #[test]
    fn test_scanner_05_number_literals() {
        let (tokens, _) = scan("123 45.67 1. .5");

        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            rendered,
            vec![
                "NUMBER 123 123.0",
                "NUMBER 45.67 45.67",
                "NUMBER 1 1.0",
                "DOT . null",
                "DOT . null",
                "NUMBER 5 5.0",
            ]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        assert_eq!(results.len(), 5, "Expected 5 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            errors,
            vec![
                "[1] Unexpected character: '$'",
                "[1] Unexpected character: '#'"
            ]
        );
    }

    #[test]
    fn test_unexpected_multibyte_character_is_skipped_whole() {
        let (tokens, errors) = scan("a é b");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].lexeme, "b");
        assert_eq!(tokens[1].start, 5);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[1] Unexpected character: 'é'");
    }

    #[test]
    fn test_unterminated_string_skips_rest_of_line() {
        let (tokens, errors) = scan_lines(&["var s = \"abc;", "1;"]);

        let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["[1] Unterminated string."]);

        assert_token_sequence_of(
            &tokens,
            &[
                (TokenType::VAR, "var", 1),
                (TokenType::IDENTIFIER, "s", 1),
                (TokenType::EQUAL, "=", 1),
                (TokenType::NUMBER(0.0), "1", 2),
                (TokenType::SEMICOLON, ";", 2),
            ],
        );
    }

    #[test]
    fn test_comments_and_whitespace_produce_nothing() {
        let (tokens, errors) = scan("  // just a comment\n\t\r\n// another");

        assert!(tokens.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_string_literal_payload() {
        let (tokens, _) = scan("\"a // not a comment\"");

        assert_eq!(tokens.len(), 1);
        assert_eq!(
            tokens[0].token_type,
            TokenType::STRING(String::new()),
            "discriminant only"
        );

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "a // not a comment"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn test_tokens_serialize_to_json() {
        let (tokens, _) = scan("x");
        let json = serde_json::to_value(&tokens).unwrap();

        assert_eq!(json[0]["lexeme"], "x");
        assert_eq!(json[0]["line"], 1);
        assert_eq!(json[0]["start"], 0);
        assert_eq!(json[0]["length"], 1);
    }

    fn assert_token_sequence_of(tokens: &[Token], expected: &[(TokenType, &str, usize)]) {
        assert_eq!(tokens.len(), expected.len());

        for (actual, (tt, lexeme, line)) in tokens.iter().zip(expected) {
            assert_eq!(actual.token_type, *tt);
            assert_eq!(actual.lexeme, *lexeme);
            assert_eq!(actual.line, *line);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, lox::error::LoxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token {:?}, got error: {}", expected_type, e),
        }
    }
}
