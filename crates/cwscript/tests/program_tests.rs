//! Driver behavior: stepping, halting, error reporting and hand-built trees

use std::rc::Rc;

use cwscript::*;
use pretty_assertions::assert_eq;

fn load(src: &str) -> (Program, OutputBuffer) {
    let out = OutputBuffer::new();
    let program = Program::from_source_with(src, EvalContext::default(), Box::new(out.clone()))
        .unwrap_or_else(|err| panic!("{} failed to parse: {}", src, err));
    (program, out)
}

// ═══════════════════════════════════════════════════════════════════════
// Stepping Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_single_stepping_reaches_the_same_output() {
    let (mut program, out) = load("x = 1 + 2 * 3; print x;");
    let mut steps = 0;
    while program.advance().unwrap() {
        steps += 1;
        assert!(steps < 1000, "program did not finish");
    }
    assert!(steps > 5);
    assert_eq!(out.contents(), "7\n");
    assert!(program.is_finished());
    assert!(!program.is_halted());
}

#[test]
fn test_output_appears_between_steps() {
    let (mut program, out) = load("print 'a';\nprint 'b';");
    while out.contents().is_empty() {
        assert!(program.advance().unwrap());
    }
    assert_eq!(out.contents(), "a\n");
    assert_eq!(program.current_line(), 0);
    program.run().unwrap();
    assert_eq!(out.contents(), "a\nb\n");
    assert_eq!(program.current_line(), 1);
}

#[test]
fn test_run_steps_respects_budget() {
    let (mut program, out) = load("i = 0; while true { i += 1; };");
    assert!(program.run_steps(500).unwrap());
    assert!(!program.is_finished());
    let i = program.global("i").unwrap();
    assert!(matches!(i, Value::Int(n) if n > 0));
    assert_eq!(out.contents(), "");
}

#[test]
fn test_finished_program_has_no_work() {
    let (mut program, _) = load("x = 1;");
    program.run().unwrap();
    assert!(!program.advance().unwrap());
    assert_eq!(program.stack_depth(), 1);
    assert!(matches!(program.result(), Some(Value::Null)));
}

#[test]
fn test_empty_program() {
    let (mut program, out) = load("# nothing here\n");
    program.run().unwrap();
    assert!(program.is_finished());
    assert_eq!(out.contents(), "");
}

#[test]
fn test_globals_visible_to_host() {
    let (mut program, _) = load("a = [1, 2]; b = object { c = 'd'; };");
    program.run().unwrap();
    assert_eq!(program.global("a").unwrap().to_display(true), "[1, 2]");
    assert_eq!(program.global("b").unwrap().to_display(true), "{c: \"d\"}");
    assert!(program.global("missing").is_none());
    assert_eq!(program.global_scope().keys(), vec!["a".to_string(), "b".to_string()]);
}

// ═══════════════════════════════════════════════════════════════════════
// Halting Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_error_halts_permanently() {
    let (mut program, out) = load("print 1;\nprint 1 / 0;\nprint 2;");
    let err = program.run().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Runtime);
    assert_eq!(err.line, Some(1));
    assert_eq!(err.context.as_deref(), Some("print 1 / 0;"));
    assert!(program.is_halted());
    assert!(!program.is_finished());
    assert_eq!(program.error(), Some(&err));

    assert!(!program.advance().unwrap());
    assert!(!program.advance().unwrap());
    assert_eq!(out.contents(), "1\n");
}

#[test]
fn test_error_display_includes_line_and_context() {
    let (mut program, _) = load("x = 1;\ny = x + 'a';");
    let err = program.run().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Runtime error: Unsupported operand types for '+': int and string (line 2)\n    y = x + 'a';"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Frontend Error Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_lex_error() {
    let err = Program::from_source("x = 'open;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lex);
    assert_eq!(err.message, "Unterminated string literal");
}

#[test]
fn test_parse_error_with_context() {
    let err = Program::from_source("x = 1;\nprint x").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
    assert_eq!(err.line, Some(1));
    assert_eq!(err.context.as_deref(), Some("print x"));
}

#[test]
fn test_duplicate_parameter_rejected() {
    let err = Program::from_source("f = function [a, a] {};").unwrap_err();
    assert_eq!(err.message, "Duplicate function parameter");
}

// ═══════════════════════════════════════════════════════════════════════
// Hand-built Tree Tests
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_hand_built_tree() {
    // total = 0; for n [1, 2, 3] { total += n; }; print total;
    let list = Node::new(
        0,
        NodeKind::List(vec![Node::int(0, 1), Node::int(0, 2), Node::int(0, 3)].into()),
    );
    let body = Block::new(
        1,
        vec![Node::op(1, Op::AddAssign, vec![Node::local(1, "total"), Node::local(1, "n")])],
    );
    let root = Block::new(
        0,
        vec![
            Node::op(0, Op::Assign, vec![Node::local(0, "total"), Node::int(0, 0)]),
            Node::new(
                0,
                NodeKind::For {
                    target: Node::local(0, "n"),
                    source: list,
                    body: Rc::new(body),
                },
            ),
            Node::op(2, Op::Print, vec![Node::local(2, "total")]),
        ],
    );

    let out = OutputBuffer::new();
    let mut program = Program::with_output(root, EvalContext::default(), Box::new(out.clone()));
    program.run().unwrap();
    assert_eq!(out.contents(), "6\n");
    assert!(matches!(program.global("total"), Some(Value::Int(6))));
}

#[test]
fn test_hand_built_tree_matches_parsed_tree() {
    let parsed = frontend::parse("x = 2;").unwrap();
    let built = Block::new(
        0,
        vec![Node::op(0, Op::Assign, vec![Node::local(0, "x"), Node::int(0, 2)])],
    );
    assert_eq!(parsed, built);
}

#[test]
fn test_machine_directly() {
    let root = Rc::new(Block::new(0, vec![Node::op(0, Op::Print, vec![Node::int(0, 4)])]));
    let out = OutputBuffer::new();
    let mut machine = Machine::new(root, &EvalContext::default().with_trace(true), Box::new(out.clone()));
    while machine.step().unwrap() {}
    assert!(!machine.has_work());
    assert_eq!(out.contents(), "4\n");
}
