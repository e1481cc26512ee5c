#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;
    use rlox as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::resolver::Resolver;
    use lox::runner::parse_program;

    /// Resolve `source` and return every reported error, rendered.
    fn resolve_errors(source: &str) -> Vec<String> {
        let program = parse_program(source).expect("program should parse");
        let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));

        match Resolver::new(&mut interpreter).resolve(&program) {
            Ok(()) => Vec::new(),
            Err(LoxError::Diagnostics(errors)) => errors.iter().map(ToString::to_string).collect(),
            Err(other) => panic!("unexpected error kind: {}", other),
        }
    }

    #[test]
    fn test_valid_program_has_no_errors() {
        let errors = resolve_errors(
            "var a = 1;\n\
             fun f(x) { var y = x; return y + a; }\n\
             class A { init(v) { this.v = v; return; } get() { return this.v; } }\n\
             class B < A { get() { return super.get(); } }",
        );

        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_self_referential_initializer() {
        assert_eq!(
            resolve_errors("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_global_self_reference_is_not_static() {
        assert!(resolve_errors("var a = a;").is_empty());
    }

    #[test]
    fn test_redeclaration_in_block() {
        assert_eq!(
            resolve_errors("{ var a = 1;\n var a = 2; }"),
            vec!["[line 2] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_redeclaration_at_global_scope_is_allowed() {
        assert!(resolve_errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_duplicate_parameter() {
        assert_eq!(
            resolve_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_value_returned_from_initializer() {
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_this_and_super_outside_class() {
        assert_eq!(
            resolve_errors("print this;\nfun f() { return super.x; }"),
            vec![
                "[line 1] Error at 'this': Can't use 'this' outside of a class.",
                "[line 2] Error at 'super': Can't use 'super' outside of a class.",
            ]
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_eq!(
            resolve_errors("class A { m() { return super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            resolve_errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_errors_accumulate_across_the_pass() {
        let errors = resolve_errors(
            "return;\n\
             { var a = a; }\n\
             { var b; var b; }\n\
             print this;",
        );

        assert_eq!(errors.len(), 4);
    }
}
