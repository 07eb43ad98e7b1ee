#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;
    use tree_lox as lox;

    use lox::ast::{Expr, ExprId, Stmt};
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::scan;

    /// Every name occurrence the resolver may annotate, in source order.
    fn annotated(statements: &[Stmt]) -> Vec<(String, ExprId)> {
        let mut found = Vec::new();
        for stmt in statements {
            walk_stmt(stmt, &mut found);
        }
        found
    }

    fn walk_stmt(stmt: &Stmt, found: &mut Vec<(String, ExprId)>) {
        match stmt {
            Stmt::Expression(expr) => walk_expr(expr, found),
            Stmt::Var { initializer, .. } => {
                if let Some(expr) = initializer {
                    walk_expr(expr, found);
                }
            }
            Stmt::Block(statements) => statements.iter().for_each(|s| walk_stmt(s, found)),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                walk_expr(condition, found);
                walk_stmt(then_branch, found);
                if let Some(stmt) = else_branch {
                    walk_stmt(stmt, found);
                }
            }
            Stmt::While { condition, body } => {
                walk_expr(condition, found);
                walk_stmt(body, found);
            }
            Stmt::Function(decl) => decl.body.iter().for_each(|s| walk_stmt(s, found)),
            Stmt::Class {
                superclass,
                methods,
                ..
            } => {
                if let Some(expr) = superclass {
                    walk_expr(expr, found);
                }
                for method in methods {
                    method.body.iter().for_each(|s| walk_stmt(s, found));
                }
            }
            Stmt::Return { value, .. } => {
                if let Some(expr) = value {
                    walk_expr(expr, found);
                }
            }
        }
    }

    fn walk_expr(expr: &Expr, found: &mut Vec<(String, ExprId)>) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(inner) | Expr::Unary { right: inner, .. } => walk_expr(inner, found),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                walk_expr(left, found);
                walk_expr(right, found);
            }
            Expr::Variable { id, name } => found.push((name.lexeme.clone(), *id)),
            Expr::Assign { id, name, value } => {
                walk_expr(value, found);
                found.push((name.lexeme.clone(), *id));
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                walk_expr(callee, found);
                arguments.iter().for_each(|a| walk_expr(a, found));
            }
            Expr::Get { object, .. } => walk_expr(object, found),
            Expr::Set { object, value, .. } => {
                walk_expr(value, found);
                walk_expr(object, found);
            }
            Expr::This { id, .. } => found.push(("this".to_string(), *id)),
            Expr::Super { id, .. } => found.push(("super".to_string(), *id)),
        }
    }

    /// Resolves `source` and returns each annotated name with its distance.
    fn distances(source: &str) -> Vec<(String, Option<usize>)> {
        let (tokens, _) = scan(source);
        let (statements, _) = Parser::new(&tokens).parse(false).unwrap();

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .unwrap_or_else(|errors| panic!("resolution failed: {:?}", errors));

        annotated(&statements)
            .into_iter()
            .map(|(name, id)| (name, interpreter.distance_of(id)))
            .collect()
    }

    fn resolve_errors(source: &str) -> Vec<String> {
        let (tokens, _) = scan(source);
        let (statements, _) = Parser::new(&tokens).parse(false).unwrap();

        let mut interpreter = Interpreter::new();
        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    fn named(pairs: &[(&str, Option<usize>)]) -> Vec<(String, Option<usize>)> {
        pairs
            .iter()
            .map(|(name, distance)| (name.to_string(), *distance))
            .collect()
    }

    #[test]
    fn test_shadowing_local_resolves_to_own_block() {
        assert_eq!(
            distances("var a = 1; { var a = 2; print(a); }"),
            named(&[("print", Some(1)), ("a", Some(0))])
        );
    }

    #[test]
    fn test_outer_variable_resolves_one_scope_up() {
        assert_eq!(
            distances("var a = 1; { print(a); }"),
            named(&[("print", Some(1)), ("a", Some(1))])
        );
    }

    #[test]
    fn test_later_global_is_left_for_runtime_lookup() {
        assert_eq!(
            distances("fun f() { return later; } var later = 1;"),
            named(&[("later", None)])
        );
    }

    #[test]
    fn test_function_parameters_and_closures() {
        assert_eq!(
            distances(
                "fun outer(x) {\n\
                   var y = x;\n\
                   fun inner() { return x + y; }\n\
                   return inner;\n\
                 }"
            ),
            named(&[
                ("x", Some(0)),
                ("x", Some(1)),
                ("y", Some(1)),
                ("inner", Some(0)),
            ])
        );
    }

    #[test]
    fn test_this_and_super_scopes() {
        assert_eq!(
            distances(
                "class A { m() { return this; } }\n\
                 class B < A { m() { return super.m(); } n() { this.x = 1; } }"
            ),
            named(&[
                ("this", Some(1)),
                ("A", Some(0)),
                ("super", Some(2)),
                ("this", Some(1)),
            ])
        );
    }

    #[test]
    fn test_assignment_resolves_target() {
        assert_eq!(
            distances("{ var a; { a = 1; } }"),
            named(&[("a", Some(1))])
        );
    }

    #[test]
    fn test_read_in_own_initializer_is_rejected() {
        assert_eq!(
            resolve_errors("var a = \"outer\"; { var a = a; }"),
            vec!["[1] Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_duplicate_declaration_in_one_scope() {
        assert_eq!(
            resolve_errors("{ var a = 1; var a = 2; }"),
            vec!["[1] Variable 'a' is already declared in this scope."]
        );
        assert_eq!(
            resolve_errors("fun f(a, a) {}"),
            vec!["[1] Variable 'a' is already declared in this scope."]
        );
    }

    #[test]
    fn test_builtins_cannot_be_redeclared_globally() {
        assert_eq!(
            resolve_errors("var print = 1;"),
            vec!["[1] Variable 'print' is already declared in this scope."]
        );
    }

    #[test]
    fn test_misplaced_return_this_and_super() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[1] Can't return from top-level code."]
        );
        assert_eq!(
            resolve_errors("fun f() { return this; }"),
            vec!["[1] Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve_errors("class A { m() { return super.m(); } }"),
            vec!["[1] Can't use 'super' in a class with no superclass."]
        );
        assert_eq!(
            resolve_errors("super.m();"),
            vec!["[1] Can't use 'super' outside of a class."]
        );
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["[1] Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_eq!(
            resolve_errors("class A < A {}"),
            vec!["[1] A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_every_error_is_reported() {
        let errors = resolve_errors("return 1;\nthis;\n{ var b = b; }");

        assert_eq!(
            errors,
            vec![
                "[1] Can't return from top-level code.",
                "[2] Can't use 'this' outside of a class.",
                "[3] Can't read local variable in its own initializer.",
            ]
        );
    }
}
