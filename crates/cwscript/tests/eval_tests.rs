//! End-to-end evaluation tests: values, operators and built-ins

use cwscript::*;
use pretty_assertions::assert_eq;

fn run(src: &str) -> (std::result::Result<(), ScriptError>, String) {
    let out = OutputBuffer::new();
    let result = Program::from_source_with(src, EvalContext::default(), Box::new(out.clone()))
        .and_then(|mut program| program.run());
    (result, out.contents())
}

/// Run `src` and return its output, failing the test on any error.
fn output(src: &str) -> String {
    let (result, out) = run(src);
    if let Err(err) = result {
        panic!("{} failed: {}", src, err);
    }
    out
}

fn error(src: &str) -> ScriptError {
    match run(src).0 {
        Err(err) => err,
        Ok(()) => panic!("{} should have failed", src),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_precedence() {
    assert_eq!(output("print 1 + 2 * 3;"), "7\n");
    assert_eq!(output("x = (1 + 2) * 3 - 1; print x;"), "8\n");
    assert_eq!(output("print 2 ** 3 ** 2;"), "64\n");
}

#[test]
fn test_int_and_float_results() {
    assert_eq!(output("print 2 + 3;"), "5\n");
    assert_eq!(output("print 2 + 0.5;"), "2.5\n");
    assert_eq!(output("print 4 / 2;"), "2.0\n");
    assert_eq!(output("print 7 // 2;"), "3\n");
    assert_eq!(output("print 7.5 // 2;"), "3\n");
    assert_eq!(output("print 2 ** -1;"), "0.5\n");
}

#[test]
fn test_int_division_truncates() {
    assert_eq!(output("print ((-5) // 2);"), "-2\n");
    assert_eq!(output("print -5 // 2;"), "-2\n");
}

#[test]
fn test_booleans_are_numeric() {
    assert_eq!(output("print true + true;"), "2\n");
    assert_eq!(output("print false * 3.0;"), "0.0\n");
}

#[test]
fn test_zero_power() {
    assert_eq!(output("print 0 ** 0;"), "1\n");
}

#[test]
fn test_zero_division_is_fatal_outside_try() {
    for src in ["print 1 / 0;", "print 1 // 0;", "print 1 % 0;", "print 0 ** -1;", "print 1.0 / 0.0;"] {
        let err = error(src);
        assert_eq!(err.kind, ErrorKind::Runtime, "{}", src);
        assert!(err.message.contains("zero_division"), "{}", err.message);
    }
}

#[test]
fn test_overflow_is_an_error() {
    let err = error("print 9223372036854775807 + 1;");
    assert!(err.message.contains("overflow"), "{}", err.message);
}

#[test]
fn test_string_concatenation() {
    assert_eq!(output("print 'ab' + \"cd\";"), "abcd\n");
}

#[test]
fn test_list_concatenation_makes_new_list() {
    let src = "a = [1]; b = a + [2]; push a 9; print b; print a;";
    assert_eq!(output(src), "[1, 2]\n[1, 9]\n");
}

#[test]
fn test_mixed_add_is_type_error() {
    let err = error("print 1 + \"x\";");
    assert_eq!(err.kind, ErrorKind::Runtime);
    assert_eq!(err.message, "Unsupported operand types for '+': int and string");
}

#[test]
fn test_non_numeric_operand_fails_type_assertion() {
    let err = error("print \"a\" * 2;");
    assert!(err.message.starts_with("Type assertion of type numeric"), "{}", err.message);
}

// ═══════════════════════════════════════════════════════════════════════
// Comparison and Logic Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_comparisons() {
    assert_eq!(output("print 1 < 2; print 2 <= 2; print 3 > 4; print 1 == 1.0;"), "true\ntrue\nfalse\ntrue\n");
    assert_eq!(output("print 'a' != 'b';"), "true\n");
}

#[test]
fn test_structural_equality() {
    assert_eq!(output("print [1, [2]] == [1, [2]];"), "true\n");
    assert_eq!(output("print [1, 2] == [2, 1];"), "false\n");
    assert_eq!(output("print 1 == '1';"), "false\n");
}

#[test]
fn test_short_circuit() {
    assert_eq!(output("x = 0; false && (x = 1); print x;"), "0\n");
    assert_eq!(output("x = 0; true || (x = 1); print x;"), "0\n");
    assert_eq!(output("print 0 || 'y';"), "true\n");
    assert_eq!(output("print 1 && 0;"), "false\n");
}

#[test]
fn test_not_and_negation() {
    assert_eq!(output("print !0; print !'a';"), "true\nfalse\n");
    assert_eq!(output("x = 3; print -x;"), "-3\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Variable and Assignment Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_dotted_and_bare_locals_are_the_same() {
    assert_eq!(output(".x = 4; print x; print global.x;"), "4\n4\n");
}

#[test]
fn test_compound_assignment() {
    let src = "x = 10; x += 5; x -= 3; x *= 2; x //= 5; print x; x /= 2; print x; x **= 2; print x;";
    assert_eq!(output(src), "4\n2.0\n4.0\n");
}

#[test]
fn test_string_append_assignment() {
    assert_eq!(output("s = 'a'; s += 'b'; print s;"), "ab\n");
}

#[test]
fn test_increment_and_invert() {
    assert_eq!(output("x = 1; ++x; ++x; --x; print x;"), "2\n");
    assert_eq!(output("f = false; !!f; print f;"), "true\n");
}

#[test]
fn test_undefined_variable() {
    let err = error("print nope;");
    assert_eq!(err.message, "Invalid variable 'nope'");
}

#[test]
fn test_assignment_needs_a_target() {
    let err = error("1 = 2;");
    assert!(err.message.contains("variable"), "{}", err.message);
}

// ═══════════════════════════════════════════════════════════════════════
// Container Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_list_index_read_and_write() {
    assert_eq!(output("l = [1, 2, 3]; l:0 = 9; l:-1 += 1; print l;"), "[9, 2, 4]\n");
}

#[test]
fn test_list_index_out_of_bounds() {
    let err = error("l = [1]; print l:5;");
    assert_eq!(err.message, "Index 5 out of bounds for length 1");
}

#[test]
fn test_string_index() {
    assert_eq!(output("print 'abc':1; print 'abc':-1;"), "b\nc\n");
}

#[test]
fn test_lists_are_shared() {
    assert_eq!(output("a = [1]; b = a; push b 2; print a;"), "[1, 2]\n");
}

#[test]
fn test_object_literal() {
    let src = "o = object { a = 1; b = 'x'; }; print o; print o:'a'; o:'c' = [true]; print keys o;";
    assert_eq!(output(src), "{a: 1, b: \"x\"}\n1\n[\"a\", \"b\", \"c\"]\n");
}

#[test]
fn test_nested_object_paths() {
    let src = "o = object { inner = object { v = 1; }; }; .o.inner.v = 5; print o;";
    assert_eq!(output(src), "{inner: {v: 5}}\n");
}

#[test]
fn test_object_equality_ignores_order() {
    let src = "x = object { a = 1; b = 2; }; y = object { b = 2; a = 1; }; print x == y; y:'a' = 3; print x == y;";
    assert_eq!(output(src), "true\nfalse\n");
}

#[test]
fn test_cyclic_lists_compare_without_overflow() {
    let src = "a = [1]; push(a, a); b = [1]; push(b, b); print a == b; c = [2]; push(c, c); print a == c;";
    assert_eq!(output(src), "true\nfalse\n");
}

#[test]
fn test_deeply_nested_lists() {
    let src = "x = []; y = []; i = 0; while i < 50000 { x = [x]; y = [y]; i += 1; }; print len x; print x == y; s = str x; print len s;";
    assert_eq!(output(src), "1\ntrue\n100002\n");
}

#[test]
fn test_self_containing_list_prints() {
    assert_eq!(output("l = [1]; push l l; print l;"), "[1, [...]]\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_string_builtins() {
    assert_eq!(output("print len 'héllo';"), "5\n");
    assert_eq!(output("print slice 'hello' 1 3;"), "el\n");
    assert_eq!(output("print slice_after('hello', -2);"), "lo\n");
    assert_eq!(output("print find 'hello' 'l'; print find 'hello' 'z';"), "2\n-1\n");
    assert_eq!(output("print replace 'a-b-c' '-' '+';"), "a+b+c\n");
    assert_eq!(output("print upper 'ab'; print lower 'CD';"), "AB\ncd\n");
}

#[test]
fn test_list_builtins() {
    assert_eq!(output("print range 4;"), "[0, 1, 2, 3]\n");
    assert_eq!(output("print range_step 10 0 -3;"), "[10, 7, 4, 1]\n");
    assert_eq!(output("print merge [1] [2, 3];"), "[1, 2, 3]\n");
    assert_eq!(output("l = [1, 2, 3]; print pop l 0; print l;"), "1\n[2, 3]\n");
    assert_eq!(output("print find [1, 2, 3] 3;"), "2\n");
    assert_eq!(output("print slice [1, 2, 3, 4] 1 100;"), "[2, 3, 4]\n");
}

#[test]
fn test_object_builtins() {
    let src = "o = object { a = 1; b = 2; }; print values o; print pop o 'a'; print o; print find o 2;";
    assert_eq!(output(src), "[1, 2]\n1\n{b: 2}\nb\n");
}

#[test]
fn test_range_step_zero_is_error() {
    assert!(error("print range_step 0 5 0;").message.contains("zero"));
}

#[test]
fn test_math_builtins() {
    assert_eq!(output("print max 1 2.5; print min 3 -1;"), "2.5\n-1\n");
    assert_eq!(output("print abs -4; print floor 2.7; print ceil 2.1; print round 2.5;"), "4\n2\n3\n2\n");
    assert_eq!(output("print sqrt 16;"), "4.0\n");
    assert_eq!(output("print floor pi;"), "3\n");
}

#[test]
fn test_conversions() {
    assert_eq!(output("print int ' 42 '; print int 3.9; print float 2;"), "42\n3\n2.0\n");
    assert_eq!(output("print str [1, 'a']; print type 1.5; print type null;"), "[1, \"a\"]\nfloat\nnull\n");
    assert!(error("print int 'x';").message.contains("Invalid integer"));
}

#[test]
fn test_random_int_within_bounds() {
    let out = output("r = random_int 3 5; print r >= 3 && r <= 5; x = random; print x >= 0 && x < 1;");
    assert_eq!(out, "true\ntrue\n");
}

#[test]
fn test_seeded_random_is_repeatable() {
    let run_seeded = || {
        let out = OutputBuffer::new();
        let ctx = EvalContext::default().with_seed(7);
        let mut program =
            Program::from_source_with("print random_int 0 1000000;", ctx, Box::new(out.clone())).unwrap();
        program.run().unwrap();
        out.contents()
    };
    assert_eq!(run_seeded(), run_seeded());
}

#[test]
fn test_local_and_global_builtins() {
    assert_eq!(output("a = 1; print global; print local == global;"), "{a: 1}\ntrue\n");
}
