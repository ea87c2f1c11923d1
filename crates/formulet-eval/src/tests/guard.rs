use crate::guard::{MAX_EXPRESSION_LEN, check};
use formulet_common::ErrorKind;

fn assert_unsafe(expr: &str) {
    let err = check(expr).expect_err(&format!("gate accepted {expr:?}"));
    assert_eq!(err.kind, ErrorKind::Unsafe);
}

#[test]
fn every_blocklisted_capability_is_rejected_anywhere() {
    let words = [
        "import",
        "using System.IO",
        "Process",
        "Assembly",
        "File",
        "Directory",
        "Thread",
        "Task.Run",
        "Environment",
        "Reflection",
        "DllImport",
        "Console",
        "Window",
        "Registry",
        "Activator",
        "AppDomain",
        "GC.Collect",
    ];
    for word in words {
        // Standalone, embedded mid-expression, and case-flipped.
        assert_unsafe(word);
        assert_unsafe(&format!("SUM(1) + {word} + 2"));
        assert_unsafe(&word.to_uppercase());
        assert_unsafe(&word.to_lowercase());
    }
}

#[test]
fn reflection_shapes_are_rejected() {
    for expr in [
        "GetType()",
        "x.GetMethod(\"a\")",
        "GetProperty(\"p\")",
        "InvokeMember(\"m\")",
        "Invoke(1)",
        "foo.CreateInstance(\"t\")",
        "Type.GetType(\"t\")",
        "System.Reflection",
        "this.GetType",
        "typeof(x).GetMethod",
    ] {
        assert_unsafe(expr);
    }
}

#[test]
fn injection_shapes_are_rejected() {
    for expr in [
        "1;2",
        "{",
        "}",
        "class Foo",
        "namespace Bar",
        "while(true)",
        "while ( true )",
        "for(;;)",
        "#region",
        "# endregion",
        "#if",
        "#else",
        "#endif",
    ] {
        assert_unsafe(expr);
    }
}

#[test]
fn stream_constructors_are_rejected() {
    for expr in ["new FileStream", "new Stream", "new XmlReader", "new StreamWriter"] {
        assert_unsafe(expr);
    }
}

#[test]
fn length_cap_is_exact() {
    let at_cap = "x".repeat(MAX_EXPRESSION_LEN);
    assert!(check(&at_cap).is_ok());
    let over_cap = "x".repeat(MAX_EXPRESSION_LEN + 1);
    assert_unsafe(&over_cap);
}

#[test]
fn whole_word_matching_spares_substrings() {
    for expr in [
        "@profile + 1",        // contains "file" but not as a whole word
        "SUM(@imports_total)", // "import" embedded in a longer identifier
        "@window_size",
        "CONCAT('Processes')",
    ] {
        assert!(check(expr).is_ok(), "rejected {expr:?}");
    }
}

#[test]
fn gating_runs_before_parsing() {
    // Syntactically invalid AND unsafe: the gate wins, so the kind is
    // Unsafe rather than Compile.
    assert_unsafe("1 + ; garbage {{{");
}
