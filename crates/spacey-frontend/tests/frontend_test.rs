//! End-to-end tests of the front end pipeline: parse, validate, lower.

use spacey_frontend::source::Severity;
use spacey_frontend::{Error, Frontend, FrontendConfig};

fn compile_ok(frontend: &mut Frontend, src: &str) {
    if let Err(error) = frontend.compile("test.js", src) {
        let diagnostics: Vec<String> = frontend
            .diagnostics()
            .iter()
            .map(|diagnostic| frontend.format_diagnostic(diagnostic))
            .collect();
        panic!("{src:?}: {} {diagnostics:?}", frontend.format_error(&error));
    }
}

fn errors_of(src: &str) -> Vec<String> {
    let mut frontend = Frontend::default();
    assert!(frontend.compile("test.js", src).is_err(), "{src:?} should fail");
    frontend
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .map(|diagnostic| frontend.format_diagnostic(diagnostic))
        .collect()
}

fn header_of(frontend: &Frontend, name: &str) -> String {
    let function = frontend.find_function(name).unwrap();
    let text = frontend.function_to_string(function);
    text.lines().next().unwrap_or_default().to_string()
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_diagnostics_carry_locations() {
    let errors = errors_of("var x;\nbreak;");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("test.js:2:1: error: 'break' not within"));
}

#[test]
fn test_failed_validation_does_not_lower() {
    let mut frontend = Frontend::default();
    let error = frontend.compile("test.js", "function f() {} 1 = 2;").unwrap_err();
    assert!(matches!(error, Error::Validation { errors: 1 }));
    assert!(frontend.module().is_empty());
}

#[test]
fn test_revalidation_reports_the_same_errors() {
    let mut frontend = Frontend::default();
    let buffer = frontend.add_source("test.js", "for (;;) { break; } continue;");
    let root = frontend.parse(buffer).unwrap();

    let first = frontend.validate(root).unwrap_err();
    let second = frontend.validate(root).unwrap_err();
    assert!(matches!(first, Error::Validation { errors: 1 }));
    assert!(matches!(second, Error::Validation { errors: 1 }));
    assert_eq!(frontend.diagnostics().error_count(), 2);
}

#[test]
fn test_duplicate_labels() {
    let errors = errors_of("a: { a: ; }");
    assert!(errors[0].contains("label 'a' is already defined"));

    let mut frontend = Frontend::default();
    compile_ok(&mut frontend, "function f() { a: ; } function g() { a: ; }");
}

#[test]
fn test_jump_targets() {
    let mut frontend = Frontend::default();
    compile_ok(&mut frontend, "for (;;) { break; } outer: { break outer; }");

    assert_eq!(errors_of("break;").len(), 1);
    assert_eq!(errors_of("switch (1) { case 1: continue; }").len(), 1);
    assert_eq!(errors_of("outer: { continue outer; }").len(), 1);
}

#[test]
fn test_assignment_targets() {
    assert_eq!(errors_of("1 = 2;").len(), 1);
    assert_eq!(errors_of("f() = 2;").len(), 1);

    let mut frontend = Frontend::default();
    compile_ok(&mut frontend, "a.b = 2; a = 2;");
}

#[test]
fn test_strict_only_names() {
    let mut frontend = Frontend::default();
    compile_ok(&mut frontend, "var eval = 1; var arguments = 1;");

    let strict = FrontendConfig::new().with_strict(true);
    for src in ["var eval = 1;", "var arguments = 1;"] {
        let mut frontend = Frontend::new(strict.clone());
        assert!(matches!(
            frontend.compile("test.js", src),
            Err(Error::Validation { errors: 1 })
        ));
    }
}

#[test]
fn test_max_errors_limits_stored_diagnostics() {
    let config = FrontendConfig::new().with_max_errors(2);
    let mut frontend = Frontend::new(config);
    let error = frontend.compile("test.js", "break; break; break;").unwrap_err();
    assert!(matches!(error, Error::Validation { errors: 3 }));
    assert_eq!(frontend.diagnostics().len(), 2);
}

#[test]
fn test_syntax_errors_are_not_diagnostics() {
    let mut frontend = Frontend::default();
    let error = frontend.compile("test.js", "var = 1;").unwrap_err();
    assert!(matches!(error, Error::Syntax { .. }));
    assert!(frontend.diagnostics().is_empty());
    assert!(frontend.format_error(&error).starts_with("test.js:1:"));
}

// ============================================================================
// Strictness
// ============================================================================

#[test]
fn test_strictness_inherited_by_nested_functions() {
    let mut frontend = Frontend::default();
    compile_ok(&mut frontend, "'use strict'; function f() { function g() {} }");
    assert_eq!(header_of(&frontend, "f"), "function f() es5 strict");
    assert_eq!(header_of(&frontend, "g"), "function g() es5 strict");
}

#[test]
fn test_own_directive_is_local() {
    let mut frontend = Frontend::default();
    compile_ok(&mut frontend, "function f() { 'use strict'; } function g() {}");
    assert_eq!(header_of(&frontend, "f"), "function f() es5 strict");
    assert_eq!(header_of(&frontend, "g"), "function g() es5");
    assert_eq!(header_of(&frontend, "global"), "function global() es5 global");
}

// ============================================================================
// Lowering
// ============================================================================

#[test]
fn test_sources_share_one_module() {
    let mut frontend = Frontend::default();
    let first = frontend.compile("a.js", "function a() {}").unwrap();
    let second = frontend.compile("b.js", "function b() {}").unwrap();
    assert_ne!(first, second);
    assert_eq!(frontend.module().len(), 4);
    assert_eq!(frontend.module().top_level(), Some(second));
    assert!(frontend.find_function("a").is_some());
}

#[test]
fn test_capture_storage_only_when_needed() {
    let mut frontend = Frontend::default();
    compile_ok(
        &mut frontend,
        "function plain() { return this; }\n\
         function arrows() { return () => this; }\n\
         function args() { return () => arguments.length; }",
    );
    let frame = |name: &str| {
        let function = frontend.find_function(name).unwrap();
        frontend.module()[function].variables.len()
    };
    assert_eq!(frame("plain"), 0);
    assert_eq!(frame("arrows"), 2);
    assert_eq!(frame("args"), 3);
}

#[test]
fn test_parameters_shadow_function_declarations() {
    let mut frontend = Frontend::default();
    compile_ok(&mut frontend, "function f(g) { return g; function g() {} }");
    let text = frontend.function_to_string(frontend.find_function("f").unwrap());
    // The hoisted closure is stored after the parameter, so it wins
    let parameter = text.find("StoreFrame %g, [g]").unwrap();
    let closure = text.find("CreateFunction g").unwrap();
    assert!(parameter < closure);
}

// ============================================================================
// Lazy compilation
// ============================================================================

fn lazy_config() -> FrontendConfig {
    FrontendConfig::new().with_lazy(true).with_lazy_threshold(0)
}

#[test]
fn test_lazy_arity_is_visible_before_lowering() {
    let mut frontend = Frontend::new(lazy_config());
    compile_ok(&mut frontend, "function add(a, b, c) { return a + b + c; }");
    let add = frontend.find_function("add").unwrap();
    assert!(frontend.module()[add].is_lazy());
    assert_eq!(frontend.module()[add].param_count(), 3);
    assert_eq!(frontend.function_name(add), "add");
}

#[test]
fn test_lazy_is_equivalent_to_eager() {
    let src = "var k = 2;\n\
               function f(a) {\n\
                 var total = 0;\n\
                 for (var i = 0; i < a; i++) { if (i == k) continue; total += i; }\n\
                 try { g(total); } catch (e) { return -1; } finally { h(); }\n\
                 return total;\n\
               }";

    let mut eager = Frontend::default();
    compile_ok(&mut eager, src);
    let mut lazy = Frontend::new(lazy_config());
    compile_ok(&mut lazy, src);

    assert_eq!(lazy.compile_all_lazy().unwrap(), 1);
    let expected = eager.function_to_string(eager.find_function("f").unwrap());
    let actual = lazy.function_to_string(lazy.find_function("f").unwrap());
    assert_eq!(actual, expected);
}

#[test]
fn test_small_bodies_stay_eager() {
    let config = FrontendConfig::new().with_lazy(true).with_lazy_threshold(1000);
    let mut frontend = Frontend::new(config);
    compile_ok(&mut frontend, "function f() { return 1; }");
    let f = frontend.find_function("f").unwrap();
    assert!(!frontend.module()[f].is_lazy());
}

#[test]
fn test_lazy_body_error_is_deferred_to_runtime() {
    let mut frontend = Frontend::new(lazy_config());
    compile_ok(&mut frontend, "function f() { 'use strict'; var eval; }");
    let f = frontend.find_function("f").unwrap();

    frontend.compile_lazy(f).unwrap();
    assert!(!frontend.module()[f].is_lazy());
    assert_eq!(frontend.diagnostics().error_count(), 1);
    let text = frontend.function_to_string(f);
    assert!(text.contains("TryLoadGlobal SyntaxError"));
    assert!(text.contains("Throw"));
}

#[test]
fn test_compile_lazy_twice_is_an_error() {
    let mut frontend = Frontend::new(lazy_config());
    compile_ok(&mut frontend, "function f() { return 1; }");
    let f = frontend.find_function("f").unwrap();
    frontend.compile_lazy(f).unwrap();
    assert!(matches!(frontend.compile_lazy(f), Err(Error::NotLazy(_))));
}
