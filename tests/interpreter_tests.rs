// Integration tests for the Brewin interpreter
//
// These tests verify the interpreter's behavior by running complete Brewin
// programs and checking what they print. Tests cover:
// - Control flow and scoping
// - Recursion and overloading
// - Reference parameters
// - Closures and lambda capture
// - Prototype objects
// - Operators and coercions
// - Built-in input/output
// - Error kinds and call stacks

use brewin::errors::{BrewinError, ErrorKind};
use brewin::interpreter::{CapturedOutput, Interpreter, ScriptedInput, Value};
use pretty_assertions::assert_eq;

fn run_with_input(code: &str, input: &[&str]) -> (Vec<String>, Result<Value, Box<BrewinError>>) {
    let output = CapturedOutput::new();
    let mut interp = Interpreter::with_io(output.clone(), ScriptedInput::new(input.iter().copied()));
    let result = interp.run_source(code);
    (output.lines(), result)
}

fn run_code(code: &str) -> Vec<String> {
    let (lines, result) = run_with_input(code, &[]);
    if let Err(err) = result {
        panic!("program failed: {}", err);
    }
    lines
}

fn run_err(code: &str) -> Box<BrewinError> {
    match run_with_input(code, &[]).1 {
        Ok(value) => panic!("expected an error, program returned {:?}", value),
        Err(err) => err,
    }
}

#[test]
fn test_if_else_picks_branch() {
    let out = run_code(
        r#"
        func main() {
            x = 3;
            if (x > 2) { print("big"); } else { print("small"); }
        }
    "#,
    );
    assert_eq!(out, vec!["big"]);
}

#[test]
fn test_else_if_chain() {
    let out = run_code(
        r#"
        func classify(n) {
            if (n < 0) { return "negative"; } else if (n == 0) { return "zero"; } else { return "positive"; }
        }
        func main() {
            print(classify(-4));
            print(classify(0));
            print(classify(9));
        }
    "#,
    );
    assert_eq!(out, vec!["negative", "zero", "positive"]);
}

#[test]
fn test_identity_function_sum() {
    let out = run_code("func id(x) { return x; } func main() { print(id(5) + id(2)); }");
    assert_eq!(out, vec!["7"]);
}

#[test]
fn test_int_coerces_to_bool_in_comparison() {
    let out = run_code("func main() { print(3 == true); print(0 == false); print(0 == true); }");
    assert_eq!(out, vec!["true", "true", "false"]);
}

#[test]
fn test_bool_coerces_to_int_in_arithmetic() {
    let out = run_code("func main() { print(true + 1); print(false * 5); print(true + true); }");
    assert_eq!(out, vec!["2", "0", "2"]);
}

#[test]
fn test_int_conditions_and_logic() {
    let out = run_code(
        r#"
        func main() {
            if (2) { print("nonzero"); }
            if (0) { print("zero"); } else { print("falsy"); }
            print(1 && true);
            print(0 || false);
            print(!0);
        }
    "#,
    );
    assert_eq!(out, vec!["nonzero", "falsy", "true", "false", "true"]);
}

#[test]
fn test_cross_type_equality_never_errors() {
    let out = run_code(
        r#"
        func main() {
            print("1" == 1);
            print("1" != 1);
            print(nil == nil);
            print(nil != 0);
            print("a" == "a");
        }
    "#,
    );
    assert_eq!(out, vec!["false", "true", "true", "true", "true"]);
}

#[test]
fn test_division_truncates_toward_zero() {
    let out = run_code(
        r#"
        func main() {
            print(-7 / 2);
            print(-7 % 2);
            print(7 / -2);
            print((-7 / 2) * 2 + (-7 % 2));
        }
    "#,
    );
    assert_eq!(out, vec!["-3", "-1", "-3", "-7"]);
}

#[test]
fn test_division_by_zero_is_fault() {
    let err = run_err("func main() { x = 1 / 0; }");
    assert_eq!(err.kind, ErrorKind::FaultError);
    let err = run_err("func main() { x = 1 % 0; }");
    assert_eq!(err.kind, ErrorKind::FaultError);
}

#[test]
fn test_string_concatenation_and_mismatch() {
    let out = run_code(r#"func main() { print("brew" + "in"); print("n=", 3, " ok=", true); }"#);
    assert_eq!(out, vec!["brewin", "n=3 ok=true"]);

    let err = run_err(r#"func main() { print("a" + 1); }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
    let err = run_err(r#"func main() { print("a" < "b"); }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_non_boolean_condition_is_type_error() {
    let err = run_err(r#"func main() { if ("yes") { print("no"); } }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
    let err = run_err("func main() { while (nil) { print(1); } }");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_nil_prints_empty_line() {
    let out = run_code("func nothing() { return; } func main() { print(nothing()); print(nil); }");
    assert_eq!(out, vec!["", ""]);
}

#[test]
fn test_recursion_keeps_locals_per_activation() {
    let out = run_code(
        r#"
        func factorial(n) {
            if (n <= 1) { return 1; }
            rest = factorial(n - 1);
            return n * rest;
        }
        func main() {
            n = 5;
            print(factorial(n));
            print(factorial(0));
            print(n);
        }
    "#,
    );
    assert_eq!(out, vec!["120", "1", "5"]);
}

#[test]
fn test_callee_does_not_see_caller_locals() {
    let err = run_err(
        r#"
        func peek() { print(secret); }
        func main() { secret = 42; peek(); }
    "#,
    );
    assert_eq!(err.kind, ErrorKind::NameError);
    assert_eq!(err.message, "Variable/Function secret not found");
}

#[test]
fn test_assignment_updates_outer_binding_from_block() {
    let out = run_code(
        r#"
        func main() {
            x = 1;
            if (true) { x = 2; }
            print(x);
            i = 0;
            while (i < 3) { i = i + 1; x = x + i; }
            print(i);
            print(x);
        }
    "#,
    );
    assert_eq!(out, vec!["2", "3", "8"]);
}

#[test]
fn test_block_locals_do_not_outlive_block() {
    let (out, result) = run_with_input(
        r#"
        func main() {
            if (true) { inner = 10; print(inner); }
            print(inner);
        }
    "#,
        &[],
    );
    assert_eq!(out, vec!["10"]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::NameError);
}

#[test]
fn test_while_return_exits_function() {
    let out = run_code(
        r#"
        func first_over(limit) {
            i = 0;
            while (true) {
                i = i + 1;
                if (i * i > limit) { return i; }
            }
        }
        func main() { print(first_over(50)); }
    "#,
    );
    assert_eq!(out, vec!["8"]);
}

#[test]
fn test_overloading_by_arity() {
    let out = run_code(
        r#"
        func f() { return 0; }
        func f(a) { return a; }
        func f(a, b) { return a + b; }
        func main() { print(f()); print(f(4)); print(f(1, 2)); }
    "#,
    );
    assert_eq!(out, vec!["0", "4", "3"]);
}

#[test]
fn test_duplicate_definition_is_name_error() {
    let err = run_err("func f(a) { } func f(b) { } func main() { }");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn test_ambiguous_function_value() {
    let err = run_err(
        r#"
        func f() { return 0; }
        func f(a) { return a; }
        func main() { g = f; }
    "#,
    );
    assert_eq!(err.kind, ErrorKind::NameError);
    assert!(err.message.contains("Ambiguous"));
}

#[test]
fn test_arity_mismatch_is_name_error() {
    let err = run_err("func f(a) { return a; } func main() { f(1, 2); }");
    assert_eq!(err.kind, ErrorKind::NameError);
    assert_eq!(err.message, "Function f taking 2 params not found");
}

#[test]
fn test_missing_main_is_name_error() {
    let err = run_err("func helper() { return 1; }");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn test_functions_are_values() {
    let out = run_code(
        r#"
        func square(x) { return x * x; }
        func apply(h, v) { return h(v); }
        func main() {
            print(apply(square, 7));
            g = square;
            print(g(3));
            print(g == square);
            print(square);
        }
    "#,
    );
    assert_eq!(out, vec!["49", "9", "true", "<function square/1>"]);
}

#[test]
fn test_calling_non_callable_is_type_error() {
    let err = run_err("func main() { x = 5; x(); }");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_reference_parameter_round_trip() {
    let out = run_code(
        r#"
        func bump(ref n) { n = n + 1; }
        func bump_copy(n) { n = n + 1; }
        func main() {
            x = 1;
            bump(x);
            bump(x);
            print(x);
            bump_copy(x);
            print(x);
        }
    "#,
    );
    assert_eq!(out, vec!["3", "3"]);
}

#[test]
fn test_reference_parameters_chain_through_calls() {
    let out = run_code(
        r#"
        func inner(ref b) { b = b * 10; }
        func outer(ref a) { inner(a); a = a + 1; }
        func main() { x = 2; outer(x); print(x); }
    "#,
    );
    assert_eq!(out, vec!["21"]);
}

#[test]
fn test_reference_parameter_with_expression_argument() {
    let out = run_code(
        r#"
        func set(ref n) { n = 99; print(n); }
        func main() { set(1 + 1); }
    "#,
    );
    assert_eq!(out, vec!["99"]);
}

#[test]
fn test_closure_capture_isolation() {
    let out = run_code(
        r#"
        func main() {
            v = 1;
            f = lambda() { print(v); };
            v = 2;
            f();
            print(v);
        }
    "#,
    );
    assert_eq!(out, vec!["1", "2"]);
}

#[test]
fn test_closure_writes_do_not_leak_out() {
    let out = run_code(
        r#"
        func main() {
            v = 1;
            f = lambda() { v = 100; };
            f();
            print(v);
        }
    "#,
    );
    assert_eq!(out, vec!["1"]);
}

#[test]
fn test_closure_sees_reference_captured_binding() {
    let out = run_code(
        r#"
        func show(ref v) {
            g = lambda() { print(v); };
            v = 5;
            g();
        }
        func main() { x = 1; show(x); print(x); }
    "#,
    );
    assert_eq!(out, vec!["5", "5"]);
}

#[test]
fn test_counter_closure_keeps_state() {
    let out = run_code(
        r#"
        func make_counter() {
            count = 0;
            return lambda() { count = count + 1; return count; };
        }
        func main() {
            c = make_counter();
            print(c());
            print(c());
            d = c;
            print(d());
            print(c());
            fresh = make_counter();
            print(fresh());
        }
    "#,
    );
    assert_eq!(out, vec!["1", "2", "3", "3", "1"]);
}

#[test]
fn test_closure_parameters_shadow_captured_names() {
    let out = run_code(
        r#"
        func main() {
            x = 10;
            add = lambda(x, y) { return x + y; };
            print(add(1, 2));
            print(x);
        }
    "#,
    );
    assert_eq!(out, vec!["3", "10"]);
}

#[test]
fn test_lambda_argument_to_reference_parameter_shares_snapshot() {
    let out = run_code(
        r#"
        func share(ref f) { g = f; g(); f(); }
        func copy(f) { g = f; g(); f(); }
        func main() {
            n = 0;
            share(lambda() { n = n + 1; print(n); });
            copy(lambda() { n = n + 1; print(n); });
            print(n);
        }
    "#,
    );
    assert_eq!(out, vec!["1", "2", "1", "1", "0"]);
}

#[test]
fn test_closure_equality_is_identity() {
    let out = run_code(
        r#"
        func main() {
            f = lambda() { return 1; };
            g = f;
            h = lambda() { return 1; };
            print(f == g);
            print(f == h);
        }
    "#,
    );
    assert_eq!(out, vec!["true", "false"]);
}

#[test]
fn test_objects_fields_and_aliasing() {
    let out = run_code(
        r#"
        func rename(o) { o.name = "after"; }
        func main() {
            o = @;
            o.name = "before";
            alias = o;
            rename(alias);
            print(o.name);
            print(o == alias);
            print(o == @);
        }
    "#,
    );
    assert_eq!(out, vec!["after", "true", "false"]);
}

#[test]
fn test_prototype_lookup_and_own_writes() {
    let out = run_code(
        r#"
        func main() {
            base = @;
            base.kind = "animal";
            dog = @;
            dog.proto = base;
            print(dog.kind);
            dog.kind = "dog";
            print(base.kind);
            print(dog.kind);
            print(dog.proto == base);
            print(base.proto);
        }
    "#,
    );
    assert_eq!(out, vec!["animal", "animal", "dog", "true", ""]);
}

#[test]
fn test_methods_bind_this() {
    let out = run_code(
        r#"
        func speak() { print(this.name + " says " + this.sound); }
        func main() {
            base = @;
            base.speak = speak;
            base.sound = "...";
            base.rename = lambda(n) { this.name = n; };
            dog = @;
            dog.proto = base;
            dog.sound = "woof";
            dog.rename("rex");
            dog.speak();
            print(dog.name);
        }
    "#,
    );
    assert_eq!(out, vec!["rex says woof", "rex"]);
}

#[test]
fn test_object_member_errors() {
    let err = run_err("func main() { o = @; print(o.missing); }");
    assert_eq!(err.kind, ErrorKind::NameError);

    let err = run_err("func main() { o = nil; print(o.x); }");
    assert_eq!(err.kind, ErrorKind::FaultError);

    let err = run_err("func main() { o = nil; o.go(); }");
    assert_eq!(err.kind, ErrorKind::FaultError);

    let err = run_err("func main() { x = 5; x.y = 1; }");
    assert_eq!(err.kind, ErrorKind::TypeError);

    let err = run_err("func main() { o = @; o.proto = 5; }");
    assert_eq!(err.kind, ErrorKind::TypeError);

    let err = run_err("func main() { a = @; b = @; b.proto = a; a.proto = b; }");
    assert_eq!(err.kind, ErrorKind::TypeError);

    let err = run_err("func main() { o = @; o.f = 3; o.f(); }");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_input_builtins() {
    let (out, result) = run_with_input(
        r#"
        func main() {
            n = inputi("count?");
            name = inputs();
            print(name, ":", n * 2);
        }
    "#,
        &["21", "brewer"],
    );
    assert!(result.is_ok());
    assert_eq!(out, vec!["count?", "brewer:42"]);
}

#[test]
fn test_input_errors() {
    let (_, result) = run_with_input("func main() { n = inputi(); }", &["abc"]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::TypeError);

    let (_, result) = run_with_input("func main() { n = inputs(); }", &[]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::FaultError);

    let (_, result) = run_with_input(r#"func main() { n = inputi("a", "b"); }"#, &["1"]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::TypeError);
}

#[test]
fn test_builtins_take_precedence() {
    let out = run_code(
        r#"
        func print(x) { return 0; }
        func main() { print("builtin"); }
    "#,
    );
    assert_eq!(out, vec!["builtin"]);
}

#[test]
fn test_main_return_value_and_top_level_env() {
    let output = CapturedOutput::new();
    let mut interp = Interpreter::with_io(output.clone(), ScriptedInput::default());
    let result = interp.run_source("func main() { x = 3; y = x * 2; return y + 1; }").unwrap();

    assert_eq!(result, Value::Int(7));
    assert_eq!(interp.env().get("x"), Some(Value::Int(3)));
    assert_eq!(interp.env().get("y"), Some(Value::Int(6)));
    assert_eq!(interp.functions().len(), 1);
    assert!(output.lines().is_empty());
}

#[test]
fn test_error_carries_call_stack() {
    let err = run_err(
        r#"
        func divide(a, b) { return a / b; }
        func middle(n) { return divide(n, 0); }
        func main() { print(middle(4)); }
    "#,
    );
    assert_eq!(err.kind, ErrorKind::FaultError);
    assert_eq!(err.call_stack, vec!["main/0", "middle/1", "divide/2"]);
}

#[test]
fn test_output_before_error_is_kept() {
    let (out, result) = run_with_input(
        r#"func main() { print("one"); print(undefined_thing); print("two"); }"#,
        &[],
    );
    assert_eq!(out, vec!["one"]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::NameError);
}

#[test]
fn test_parse_errors_are_reported() {
    let err = run_err("func main() { x = ; }");
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert!(err.location.is_known());
}

#[test]
fn test_negation_requires_an_int() {
    let err = run_err("func main() { print(-true); }");
    assert_eq!(err.kind, ErrorKind::TypeError);
    let err = run_err("func main() { x = false; print(-x); }");
    assert_eq!(err.kind, ErrorKind::TypeError);

    let out = run_code("func main() { print(-(1 + 2)); print(-9223372036854775807 - 1); }");
    assert_eq!(out, vec!["-3", "-9223372036854775808"]);
}

#[test]
fn test_closure_arity_is_checked_before_the_call() {
    let err = run_err("func main() { f = lambda(a, b) { return a; }; f(1); }");
    assert_eq!(err.kind, ErrorKind::NameError);
    assert_eq!(err.message, "Function f taking 1 params not found");
}

#[test]
fn test_lambda_cannot_see_its_own_variable() {
    // The snapshot is taken before `f` is bound, and the caller's frame is not visible
    let (out, result) = run_with_input(
        r#"
        func main() {
            f = lambda(n) {
                print(n);
                if (n == 0) { return 0; }
                return f(n - 1);
            };
            f(2);
        }
    "#,
        &[],
    );
    assert_eq!(out, vec!["2"]);
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameError);
    assert_eq!(err.message, "Function f taking 1 params not found");
}

#[test]
fn test_lambda_recursion_through_a_parameter() {
    let out = run_code(
        r#"
        func main() {
            countdown = lambda(self, n) {
                if (n < 0) { return; }
                print(n);
                self(self, n - 1);
            };
            countdown(countdown, 2);
        }
    "#,
    );
    assert_eq!(out, vec!["2", "1", "0"]);
}

#[derive(Clone, Default)]
struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_statements_are_traced() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let out = tracing::subscriber::with_default(subscriber, || {
        run_code(
            r#"
            func main() {
                i = 0;
                while (i < 1) { i = i + 1; }
                if (i == 1) { print("done"); }
                return;
            }
        "#,
        )
    });
    assert_eq!(out, vec!["done"]);

    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let exec_lines: Vec<&str> = text.lines().filter(|l| l.contains("exec")).collect();
    for label in ["assign", "while", "if", "call", "return"] {
        assert!(
            exec_lines.iter().any(|l| l.contains(label)),
            "no exec event for {} in:\n{}",
            label,
            text
        );
    }
    assert!(text.contains("program loaded"));
}
