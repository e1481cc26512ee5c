#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use rlox as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::runner;
    use lox::value::Value;

    /// `Write` sink whose bytes stay readable after the interpreter owns it.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
        }
    }

    /// Run a program, returning what it printed and how it ended.
    fn run(source: &str) -> (String, Result<(), LoxError>) {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));

        let result = runner::run(source, &mut interpreter);
        (out.contents(), result)
    }

    /// Run a program that must succeed and return its output.
    fn output(source: &str) -> String {
        let (out, result) = run(source);
        if let Err(e) = result {
            panic!("program failed: {}\noutput so far:\n{}", e, out);
        }
        out
    }

    /// Run a program that must fail at runtime and return the error text.
    fn runtime_error(source: &str) -> String {
        match run(source).1 {
            Err(e @ LoxError::Runtime(_)) => {
                assert_eq!(e.exit_code(), 70);
                e.to_string()
            }
            Err(other) => panic!("expected a runtime error, got: {}", other),
            Ok(()) => panic!("expected a runtime error, program succeeded"),
        }
    }

    fn evaluate(source: &str) -> Value {
        let mut interpreter = Interpreter::with_output(Box::new(io::sink()));
        runner::evaluate(source, &mut interpreter).expect("expression should evaluate")
    }

    // ───────────────────────── expressions ─────────────────────────

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(evaluate("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(evaluate("(1 + 2) * 3 - 4 / 2"), Value::Number(7.0));
        assert_eq!(
            evaluate("\"foo\" + \"bar\""),
            Value::String("foobar".into())
        );
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        assert_eq!(evaluate("1 / 0"), Value::Number(f64::INFINITY));
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_eq!(evaluate("1 == 1"), Value::Bool(true));
        assert_eq!(evaluate("nil == false"), Value::Bool(false));
        assert_eq!(evaluate("0 == false"), Value::Bool(false));
        assert_eq!(evaluate("\"1\" == 1"), Value::Bool(false));
        assert_eq!(evaluate("nil == nil"), Value::Bool(true));
        assert_eq!(evaluate("\"a\" != \"a\""), Value::Bool(false));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(evaluate("1 or 2"), Value::Number(1.0));
        assert_eq!(evaluate("nil or \"x\""), Value::String("x".into()));
        assert_eq!(evaluate("nil and 1"), Value::Nil);
        assert_eq!(evaluate("1 and 2"), Value::Number(2.0));
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(
            output("var hit = false;\nfun f() { hit = true; return true; }\nvar r = true or f();\nprint hit;\nr = false and f();\nprint hit;"),
            "false\nfalse\n"
        );
    }

    #[test]
    fn test_truthiness_of_zero_and_empty_string() {
        assert_eq!(evaluate("!0"), Value::Bool(false));
        assert_eq!(evaluate("!\"\""), Value::Bool(false));
        assert_eq!(evaluate("!nil"), Value::Bool(true));
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            runtime_error("print 1 + \"a\";"),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print -\"a\";"),
            "Operand must be a number.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print\n\n1 < \"b\";"),
            "Operands must be numbers.\n[line 3]"
        );
    }

    // ───────────────────────── statements ──────────────────────────

    #[test]
    fn test_print_formats_values() {
        assert_eq!(
            output("print 3; print 2.5; print nil; print true; print \"s\"; print clock;"),
            "3\n2.5\nnil\ntrue\ns\n<native fn>\n"
        );
    }

    #[test]
    fn test_block_shadowing_restores_outer() {
        assert_eq!(
            output("var a = 1;\n{ var a = 2; print a; }\nprint a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_assignment_in_shadowing_block_keeps_outer_value() {
        assert_eq!(
            output("var a = \"outer\";\n{ var a = \"inner\"; a = \"changed\"; print a; }\nprint a;"),
            "changed\nouter\n"
        );
    }

    #[test]
    fn test_if_else_and_while() {
        assert_eq!(
            output("var i = 0;\nwhile (i < 3) { if (i == 1) print \"one\"; else print i; i = i + 1; }"),
            "0\none\n2\n"
        );
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            output("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_for_loop_without_clauses_exits_by_return() {
        assert_eq!(
            output("fun f() { var n = 0; for (;;) { n = n + 1; if (n == 4) return n; } }\nprint f();"),
            "4\n"
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            runtime_error("print missing;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
    }

    #[test]
    fn test_assignment_to_undeclared_global_is_an_error() {
        assert_eq!(
            runtime_error("ghost = 1;"),
            "Undefined variable 'ghost'.\n[line 1]"
        );
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let (out, result) = run("print 1;\nprint nope;\nprint 2;");

        assert_eq!(out, "1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_static_error_prevents_any_output() {
        let (out, result) = run("print 1;\n{ var a = a; }");

        assert_eq!(out, "");
        assert_eq!(result.map_err(|e| e.exit_code()), Err(65));
    }

    // ───────────────────────── functions ───────────────────────────

    #[test]
    fn test_recursion() {
        assert_eq!(
            output("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\nprint fib(10);"),
            "55\n"
        );
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output("fun f() {}\nprint f();\nprint f;"), "nil\n<fn f>\n");
    }

    #[test]
    fn test_closure_counter() {
        assert_eq!(
            output(
                "fun makeCounter() { var i = 0; fun count() { i = i + 1; return i; } return count; }\n\
                 var c = makeCounter();\n\
                 print c(); print c();\n\
                 var d = makeCounter();\n\
                 print d();"
            ),
            "1\n2\n1\n"
        );
    }

    #[test]
    fn test_closure_binds_statically() {
        assert_eq!(
            output(
                "var a = \"global\";\n\
                 { fun show() { print a; } show(); var a = \"block\"; show(); }"
            ),
            "global\nglobal\n"
        );
    }

    #[test]
    fn test_arity_mismatch() {
        assert_eq!(
            runtime_error("fun f(a, b) {}\nf(1);"),
            "Expected 2 arguments, but got 1.\n[line 2]"
        );
        assert_eq!(
            runtime_error("fun f(a, b) {}\nf(1, 2, 3);"),
            "Expected 2 arguments, but got 3.\n[line 2]"
        );
    }

    #[test]
    fn test_calling_a_non_callable() {
        assert_eq!(
            runtime_error("\"str\"();"),
            "Can only call functions and classes.\n[line 1]"
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert!(matches!(evaluate("clock()"), Value::Number(n) if n > 0.0));
    }

    // ───────────────────────── classes ─────────────────────────────

    #[test]
    fn test_class_and_instance_display() {
        assert_eq!(
            output("class Bagel {}\nprint Bagel;\nprint Bagel();"),
            "Bagel\nBagel instance\n"
        );
    }

    #[test]
    fn test_fields_and_methods() {
        assert_eq!(
            output(
                "class Point { init(x, y) { this.x = x; this.y = y; } sum() { return this.x + this.y; } }\n\
                 var p = Point(1, 2);\n\
                 print p.sum();\n\
                 p.x = 10;\n\
                 print p.sum();"
            ),
            "3\n12\n"
        );
    }

    #[test]
    fn test_bound_method_remembers_its_instance() {
        assert_eq!(
            output(
                "class Person { init(n) { this.name = n; } hi() { return \"hi \" + this.name; } }\n\
                 var m = Person(\"ann\").hi;\n\
                 print m();"
            ),
            "hi ann\n"
        );
    }

    #[test]
    fn test_initializer_returns_the_instance() {
        assert_eq!(
            output(
                "class Foo { init() { this.v = 1; return; } }\n\
                 var f = Foo();\n\
                 print f.init();\n\
                 print f.init() == f;"
            ),
            "Foo instance\ntrue\n"
        );
    }

    #[test]
    fn test_class_arity_follows_init() {
        assert_eq!(
            runtime_error("class A { init(a) {} }\nA();"),
            "Expected 1 arguments, but got 0.\n[line 2]"
        );
        assert_eq!(
            runtime_error("class B {}\nB(1);"),
            "Expected 0 arguments, but got 1.\n[line 2]"
        );
    }

    #[test]
    fn test_field_shadows_method() {
        assert_eq!(
            output("class A { m() { return \"method\"; } }\nvar a = A();\na.m = \"field\";\nprint a.m;"),
            "field\n"
        );
    }

    #[test]
    fn test_inheritance_and_super() {
        assert_eq!(
            output(
                "class A { greet() { return \"A\"; } }\n\
                 class B < A { greet() { return super.greet() + \"B\"; } }\n\
                 print B().greet();"
            ),
            "AB\n"
        );
    }

    #[test]
    fn test_super_is_static_not_dynamic() {
        assert_eq!(
            output(
                "class A { name() { return \"A\"; } }\n\
                 class B < A { name() { return \"B\" + super.name(); } }\n\
                 class C < B { name() { return \"C\" + super.name(); } }\n\
                 print C().name();"
            ),
            "CBA\n"
        );
    }

    #[test]
    fn test_inherited_methods_and_init() {
        assert_eq!(
            output(
                "class Base { init(v) { this.v = v; } get() { return this.v; } }\n\
                 class Derived < Base {}\n\
                 print Derived(7).get();"
            ),
            "7\n"
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("class A {}\nprint A().missing;"),
            "Undefined property 'missing'.\n[line 2]"
        );
        assert_eq!(
            runtime_error("var n = 1;\nprint n.x;"),
            "Only instances have properties.\n[line 2]"
        );
        assert_eq!(
            runtime_error("var n = 1;\nn.x = 2;"),
            "Only instances have fields.\n[line 2]"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_eq!(
            runtime_error("var NotAClass = 1;\nclass A < NotAClass {}"),
            "Superclass must be a class.\n[line 2]"
        );
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));

        runner::run("fun add(a, b) { return a + b; }", &mut interpreter).unwrap();
        runner::run("var x = add(1, 2);", &mut interpreter).unwrap();
        runner::run("print x;", &mut interpreter).unwrap();

        assert_eq!(out.contents(), "3\n");
    }

    #[test]
    fn test_error_inside_block_restores_environment() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));

        runner::run("var a = \"g\";", &mut interpreter).unwrap();

        let err = runner::run("{ var a = \"b\"; nope; }", &mut interpreter).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 1]");

        runner::run("print a;", &mut interpreter).unwrap();
        assert_eq!(out.contents(), "g\n");
    }

    #[test]
    fn test_error_inside_call_restores_environment() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));

        runner::run("var a = \"g\";", &mut interpreter).unwrap();
        runner::run("fun f() { var a = 1; { nope; } }", &mut interpreter).unwrap();

        let err = runner::run("f();", &mut interpreter).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 1]");

        runner::run("print a; a = \"set\"; print a;", &mut interpreter).unwrap();
        assert_eq!(out.contents(), "g\nset\n");
    }
}
