// Error reporting tests: every failure is the first error, with a location

use ashl::{parse_source, ErrorKind};

fn error(source: &str) -> ashl::ParseError {
    match parse_source(source, "err.ash") {
        Ok(module) => panic!("Expected an error, got {:#?}", module),
        Err(e) => e,
    }
}

#[test]
fn test_missing_terminator_cites_last_token() {
    let err = error("float x");
    assert!(matches!(
        err.kind,
        ErrorKind::ExhaustedInput | ErrorKind::UnexpectedKind { .. }
    ));
    let location = err.location().expect("located error");
    assert_eq!((location.line, location.column), (1, 7));
    assert_eq!(&*location.file, "err.ash");
}

#[test]
fn test_unexpected_kind_reports_expected_and_found() {
    let err = error("struct A { float x; }\nstruct B { int y; };");
    match &err.kind {
        ErrorKind::UnexpectedKind { expected, found } => {
            assert_eq!(expected.len(), 1);
            assert_eq!(found.to_string(), "'struct'");
        }
        other => panic!("Expected unexpected-kind error, got {:?}", other),
    }
    assert_eq!(err.location().map(|l| l.line), Some(2));
    assert!(err.to_string().starts_with("err.ash:2:1: expected ';'"));
}

#[test]
fn test_unrecognized_top_level_keyword() {
    let err = error("for (;;) { }");
    assert!(matches!(err.kind, ErrorKind::UnrecognizedConstruct { .. }));
    assert_eq!(err.location().map(|l| l.column), Some(1));
}

#[test]
fn test_unterminated_string_and_comment() {
    let err = error("include \"common.ash");
    assert_eq!(err.kind, ErrorKind::ExhaustedInput);
    assert_eq!(err.location().map(|l| l.column), Some(9));

    let err = error("struct A { float x; }; /* never closed");
    assert_eq!(err.kind, ErrorKind::ExhaustedInput);
    assert_eq!(err.location().map(|l| l.column), Some(24));
}

#[test]
fn test_malformed_number() {
    let err = error("void f() { x = 2x; }");
    assert!(matches!(
        err.kind,
        ErrorKind::MalformedLiteral { ref lexeme, .. } if lexeme == "2x"
    ));
}

#[test]
fn test_unknown_statement_in_stage_scope() {
    let err = error("vertex { return 1; }");
    assert!(matches!(err.kind, ErrorKind::UnrecognizedConstruct { .. }));
    assert!(err.message().contains("stage scope"));
}
