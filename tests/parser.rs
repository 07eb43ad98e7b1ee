#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;
    use tree_lox as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::parser::{Parser, MAX_ARITY};
    use lox::scanner::scan;

    fn print_expression(source: &str) -> String {
        let (tokens, errors) = scan(source);
        assert!(errors.is_empty());

        let expr = Parser::new(&tokens)
            .parse_expression()
            .unwrap_or_else(|e| panic!("{} failed to parse: {}", source, e));

        AstPrinter::print_expr(&expr)
    }

    fn print_program(source: &str) -> Vec<String> {
        let (tokens, _) = scan(source);

        let (statements, error_count) = Parser::new(&tokens)
            .parse(false)
            .unwrap_or_else(|e| panic!("{} failed to parse: {}", source, e));
        assert_eq!(error_count, 0);

        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn strict_error(source: &str) -> String {
        let (tokens, _) = scan(source);

        match Parser::new(&tokens).parse(false) {
            Ok(_) => panic!("{} parsed without error", source),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_printer_canonical_form() {
        assert_eq!(print_expression("-123 * (45.67)"), "(* (- 123) (45.67))");
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(print_expression("1 + 2 * 3 - 4"), "(- (+ 1 (* 2 3)) 4)");
        assert_eq!(print_expression("1 < 2 == !false"), "(== (< 1 2) (! false))");
        assert_eq!(print_expression("a or b and c"), "(or a (and b c))");
        assert_eq!(print_expression("a = b = 3"), "(= a (= b 3))");
        assert_eq!(print_expression("8 / 4 / 2"), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn test_calls_properties_and_literals() {
        assert_eq!(
            print_expression("obj.field.method(1, \"two\", nil)"),
            "((get (get obj field) method) 1 \"two\" nil)"
        );
        assert_eq!(print_expression("a.b = true"), "(set a b true)");
        assert_eq!(print_expression("f()()"), "((f))");
    }

    #[test]
    fn test_statement_forms() {
        let printed = print_program(
            "var a = 1;\n\
             var b;\n\
             if (a) { b = 2; } else b = 3;\n\
             while (a < 3) a = a + 1;\n\
             fun add(x, y) { return x + y; }\n\
             class Sub < Base { init() { super.init(); this.v = 0; } }",
        );

        assert_eq!(
            printed,
            vec![
                "(define a 1)",
                "(define b)",
                "(if a (block (= b 2)) (= b 3))",
                "(while (< a 3) (= a (+ a 1)))",
                "(fun add (x y) (body (return (+ x y))))",
                "(class Sub < Base (fun init () (body ((super init)) (set this v 0))))",
            ]
        );
    }

    #[test]
    fn test_for_loop_is_desugared() {
        let printed = print_program("for (var i = 0; i < 3; i = i + 1) f(i);");

        assert_eq!(
            printed,
            vec!["(block (define i 0) (while (< i 3) (block (f i) (= i (+ i 1)))))"]
        );

        let printed = print_program("for (;;) f();");
        assert_eq!(printed, vec!["(while true (f))"]);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let source = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
                      print(fib(10));";
        let (tokens, _) = scan(source);

        let (first, _) = Parser::new(&tokens).parse(false).unwrap();
        let (second, _) = Parser::new(&tokens).parse(false).unwrap();

        let first: Vec<String> = first.iter().map(AstPrinter::print_stmt).collect();
        let second: Vec<String> = second.iter().map(AstPrinter::print_stmt).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_recovering_parse_counts_every_error() {
        let (tokens, _) = scan("var = 1;\nvar b = ;\nprint(1);");

        let mut parser = Parser::new(&tokens);
        let (statements, error_count) = parser.parse(true).unwrap();

        assert_eq!(error_count, 2);
        assert_eq!(statements.len(), 1);

        let messages: Vec<String> = parser.errors().iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "[1] Expect variable name.",
                "[2] Expect expression, but got ';'."
            ]
        );
    }

    #[test]
    fn test_strict_parse_stops_at_first_error() {
        assert_eq!(
            strict_error("f(1;\nvar = 2;"),
            "[1] Expect ')' after arguments."
        );
    }

    #[test]
    fn test_missing_semicolon() {
        assert_eq!(strict_error("1 + 2"), "[1] Expect ';' after expression.");
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(strict_error("1 = 2;"), "[1] Invalid assignment target.");
        assert_eq!(strict_error("a + b = c;"), "[1] Invalid assignment target.");
    }

    #[test]
    fn test_unclosed_group_reports_opening_line() {
        assert_eq!(
            strict_error("(1 +\n2;"),
            "[1] Mismatched parenthesis: expect ')' after expression."
        );
    }

    #[test]
    fn test_argument_limit() {
        let args = |n: usize| vec!["0"; n].join(", ");

        let (tokens, _) = scan(&format!("f({});", args(MAX_ARITY)));
        assert!(Parser::new(&tokens).parse(false).is_ok());

        assert_eq!(
            strict_error(&format!("f({});", args(MAX_ARITY + 1))),
            "[1] Can't have more than 255 arguments."
        );
    }

    #[test]
    fn test_parameter_limit() {
        let params: Vec<String> = (0..=MAX_ARITY).map(|i| format!("p{}", i)).collect();

        assert_eq!(
            strict_error(&format!("fun f({}) {{}}", params.join(", "))),
            "[1] Can't have more than 255 parameters."
        );
    }

    #[test]
    fn test_annotated_nodes_get_distinct_ids() {
        let (tokens, _) = scan("a = a;");
        let (statements, _) = Parser::new(&tokens).parse(false).unwrap();

        let Stmt::Expression(Expr::Assign { id, value, .. }) = &statements[0] else {
            panic!("expected an assignment");
        };
        let Expr::Variable { id: read_id, .. } = value.as_ref() else {
            panic!("expected a variable read");
        };

        assert_ne!(id, read_id);
    }
}
