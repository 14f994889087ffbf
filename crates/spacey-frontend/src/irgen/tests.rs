use super::IrGen;
use crate::ast::Ast;
use crate::ident::{Interner, Keywords};
use crate::ir::{InstrKind, Module};
use crate::sema::SemContext;
use crate::source::{SourceManager, SourceRange};
use crate::{Frontend, FrontendConfig};

fn compile_ok(src: &str) -> Frontend {
    let mut frontend = Frontend::default();
    if let Err(error) = frontend.compile("t.js", src) {
        panic!("{src:?} failed: {}", frontend.format_error(&error));
    }
    frontend
}

fn compile_lazy_ok(src: &str) -> Frontend {
    let config = FrontendConfig::new().with_lazy(true).with_lazy_threshold(0);
    let mut frontend = Frontend::new(config);
    if let Err(error) = frontend.compile("t.js", src) {
        panic!("{src:?} failed: {}", frontend.format_error(&error));
    }
    frontend
}

fn function_text(frontend: &Frontend, name: &str) -> String {
    match frontend.find_function(name) {
        Some(function) => frontend.function_to_string(function),
        None => panic!("no function named {name}"),
    }
}

/// Asserts that `needles` appear in `text` in the given order.
fn assert_in_order(text: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match text[from..].find(needle) {
            Some(offset) => from += offset + needle.len(),
            None => panic!("{needle:?} not found in order in:\n{text}"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_simple_function() {
    let frontend = compile_ok("function f(a) { return a + 1; }");
    assert_eq!(
        function_text(&frontend, "f"),
        "function f(a) es5\n\
         frame = [a]\n\
         %BB0:\n  \
         StoreFrame %a, [a]\n  \
         %0 = LoadFrame [a]\n  \
         %1 = Binary +, %0, 1\n  \
         Return %1\n"
    );
}

#[test]
fn test_global_function_stores_closures() {
    let frontend = compile_ok("function f(a) { return a + 1; }");
    assert_eq!(
        function_text(&frontend, "global"),
        "function global() es5 global\n\
         %BB0:\n  \
         %0 = CreateFunction f\n  \
         StoreGlobal %0, f\n  \
         Return undefined\n"
    );
    assert!(frontend.module_to_string().starts_with("globals = [f]\n\n"));
}

#[test]
fn test_implicit_return_undefined() {
    let frontend = compile_ok("function f() { g(); }");
    let text = function_text(&frontend, "f");
    assert_in_order(&text, &["TryLoadGlobal g", "Call %0, undefined", "Return undefined"]);
    assert_eq!(text.matches("%BB").count(), 1);
}

#[test]
fn test_hoisted_vars_start_undefined() {
    let frontend = compile_ok("function f(a) { var b = a; return b; }");
    let text = function_text(&frontend, "f");
    assert!(text.contains("frame = [b, a]"));
    assert_in_order(
        &text,
        &["StoreFrame undefined, [b]", "StoreFrame %a, [a]", "LoadFrame [a]"],
    );
}

#[test]
fn test_nested_declarations_are_hoisted() {
    let frontend = compile_ok("function f() { return g(); function g() { return 1; } }");
    let text = function_text(&frontend, "f");
    assert_in_order(
        &text,
        &["%0 = CreateFunction g", "StoreFrame %0, [g]", "LoadFrame [g]"],
    );
}

#[test]
fn test_named_function_expression_alias() {
    let frontend = compile_ok("var g = function h() { return h; };");
    let global = function_text(&frontend, "global");
    assert!(global.contains("frame = [?anon_0_h]"));
    assert_in_order(
        &global,
        &["%0 = CreateFunction h", "StoreFrame %0, [?anon_0_h]", "StoreGlobal %0, g"],
    );
    assert!(function_text(&frontend, "h").contains("LoadFrame [?anon_0_h@global]"));
}

#[test]
fn test_anonymous_function_takes_variable_name() {
    let frontend = compile_ok("var handler = function () {};");
    assert!(frontend.find_function("handler").is_some());
}

// ============================================================================
// Globals
// ============================================================================

#[test]
fn test_global_properties() {
    let frontend = compile_ok("var z; x = 1; typeof y;");
    assert!(frontend.module_to_string().starts_with("globals = [z, x?, y?]\n"));

    let global = function_text(&frontend, "global");
    assert_in_order(&global, &["StoreGlobal 1, x", "%0 = LoadGlobal y", "Unary typeof, %0"]);
}

#[test]
fn test_strict_global_store() {
    let frontend = compile_ok("'use strict'; x = 1;");
    let global = function_text(&frontend, "global");
    assert!(global.starts_with("function global() es5 strict global\n"));
    assert!(global.contains("TryStoreGlobal 1, x"));
}

#[test]
fn test_strict_store_to_declared_global() {
    let frontend = compile_ok("'use strict'; var x; function g() { x = 2; } x = 1; y = 3;");
    let global = function_text(&frontend, "global");
    assert_in_order(
        &global,
        &["StoreGlobal %0, g", "StoreGlobal 1, x", "TryStoreGlobal 3, y"],
    );
    assert!(!global.contains("TryStoreGlobal %0, g"));
    assert!(!global.contains("TryStoreGlobal 1, x"));

    let g = function_text(&frontend, "g");
    assert!(g.contains("StoreGlobal 2, x"));
    assert!(!g.contains("TryStoreGlobal"));
}

#[test]
fn test_delete_forms() {
    let frontend = compile_ok("function f(a) { delete a; delete o.p; delete g; }");
    let text = function_text(&frontend, "f");
    assert_in_order(
        &text,
        &["DeleteProperty %0, \"p\"", "DeleteProperty globalObject, \"g\""],
    );
}

// ============================================================================
// Arrow functions
// ============================================================================

#[test]
fn test_arrow_captures_this() {
    let frontend = compile_ok("function outer() { return () => this; }");
    assert_eq!(
        function_text(&frontend, "outer"),
        "function outer() es5\n\
         frame = [?anon_0_this, ?anon_1_new.target]\n\
         %BB0:\n  \
         StoreFrame %this, [?anon_0_this]\n  \
         %0 = GetNewTarget\n  \
         StoreFrame %0, [?anon_1_new.target]\n  \
         %1 = CreateFunction anonymous\n  \
         Return %1\n"
    );
    assert_eq!(
        function_text(&frontend, ""),
        "function anonymous() arrow\n\
         %BB0:\n  \
         %0 = LoadFrame [?anon_0_this@outer]\n  \
         Return %0\n"
    );
}

#[test]
fn test_arrow_captures_arguments() {
    let frontend = compile_ok("function f() { return () => arguments[0]; }");
    let text = function_text(&frontend, "f");
    assert!(text.contains("frame = [?anon_0_this, ?anon_1_new.target, ?anon_2_arguments]"));
    assert_in_order(
        &text,
        &["%0 = CreateArguments", "StoreFrame %0, [?anon_2_arguments]"],
    );

    let arrow = function_text(&frontend, "");
    assert_in_order(
        &arrow,
        &["%0 = LoadFrame [?anon_2_arguments@f]", "LoadProperty %0, 0"],
    );
}

#[test]
fn test_arrow_reads_parameter_named_arguments() {
    let frontend = compile_ok("function f(arguments) { return () => arguments; }");
    let text = function_text(&frontend, "f");
    assert!(text.contains("frame = [arguments, ?anon_0_this, ?anon_1_new.target]\n"));
    assert!(!text.contains("CreateArguments"));
    assert_eq!(
        function_text(&frontend, ""),
        "function anonymous() arrow\n\
         %BB0:\n  \
         %0 = LoadFrame [arguments@f]\n  \
         Return %0\n"
    );
}

#[test]
fn test_arrow_reads_var_named_arguments() {
    let frontend = compile_ok("function f() { var arguments = 5; return () => arguments; }");
    let text = function_text(&frontend, "f");
    assert!(text.contains("frame = [arguments, ?anon_0_this, ?anon_1_new.target]\n"));
    assert!(text.contains("StoreFrame 5, [arguments]"));
    assert!(!text.contains("CreateArguments"));
    assert!(function_text(&frontend, "").contains("LoadFrame [arguments@f]"));
}

#[test]
fn test_arrow_arguments_stops_at_nearest_function() {
    let frontend =
        compile_ok("function outer(arguments) { function inner() { return () => arguments; } }");
    let inner = function_text(&frontend, "inner");
    assert!(inner.contains("frame = [?anon_0_this, ?anon_1_new.target, ?anon_2_arguments]"));
    assert!(inner.contains("CreateArguments"));
    assert!(function_text(&frontend, "").contains("LoadFrame [?anon_2_arguments@inner]"));
}

#[test]
fn test_no_capture_without_arrows() {
    let frontend = compile_ok("function f() { return this; }");
    let text = function_text(&frontend, "f");
    assert!(!text.contains("frame ="));
    assert!(text.contains("Return %this"));
}

#[test]
fn test_arguments_object_created_once() {
    let frontend = compile_ok("function f() { return arguments[0] + arguments[1]; }");
    let text = function_text(&frontend, "f");
    assert_eq!(text.matches("CreateArguments").count(), 1);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_while_loop_blocks() {
    let frontend = compile_ok("function f(a) { while (a) { a = a - 1; } return a; }");
    let text = function_text(&frontend, "f");
    assert_in_order(&text, &["CondBranch", "Binary -", "Branch %BB1", "Return"]);
}

// The prologue's body block is only entered from the entry block, so
// lowering always folds it; a loop at the start of the body gets a block
// of its own. The unmerged shape is covered in `ir::function`.
#[test]
fn test_entry_merges_before_leading_loop() {
    let frontend = compile_ok("function f(a) { do { a = a - 1; } while (a); return a; }");
    let text = function_text(&frontend, "f");
    assert!(text.starts_with(
        "function f(a) es5\n\
         frame = [a]\n\
         %BB0:\n  \
         StoreFrame %a, [a]\n  \
         Branch %BB1\n\
         %BB1:\n"
    ));
    assert_in_order(&text, &["Binary -", "%BB2:", "CondBranch", "%BB3:", "Return"]);
}

#[test]
fn test_return_runs_finalizer() {
    let frontend = compile_ok("function f() { try { return 1; } finally { g(); } }");
    let text = function_text(&frontend, "f");
    assert_in_order(
        &text,
        &[
            "TryStart %BB1, %BB2",
            "%BB1:",
            "TryEnd",
            "TryLoadGlobal g",
            "Return 1",
            "%BB2:",
            "%2 = Catch",
            "TryLoadGlobal g",
            "Throw %2",
        ],
    );
}

#[test]
fn test_break_out_of_try_runs_finalizer() {
    let frontend = compile_ok("function f() { l: try { break l; } finally { g(); } }");
    let text = function_text(&frontend, "f");
    assert_in_order(&text, &["TryStart", "TryEnd", "TryLoadGlobal g", "Branch"]);
}

#[test]
fn test_break_inside_try_does_not_unwind() {
    let frontend = compile_ok("function f() { try { l: { break l; } } finally { g(); } }");
    let text = function_text(&frontend, "f");
    // One TryEnd on the normal exit path, none for the break
    assert_eq!(text.matches("TryEnd").count(), 1);
}

#[test]
fn test_try_catch_binds_exception() {
    let frontend = compile_ok("function f() { try { g(); } catch (e) { return e; } }");
    let text = function_text(&frontend, "f");
    assert!(text.contains("frame = [e]"));
    assert_in_order(&text, &["= Catch", "StoreFrame", "[e]", "LoadFrame [e]"]);
}

#[test]
fn test_logical_uses_phi() {
    let frontend = compile_ok("function f(a, b) { return a || b; }");
    let text = function_text(&frontend, "f");
    assert_in_order(&text, &["CondBranch", "Phi"]);
}

// ============================================================================
// Lazy functions
// ============================================================================

#[test]
fn test_lazy_stub_keeps_signature() {
    let frontend = compile_lazy_ok("function f(a, b) { return a + b; }");
    let f = frontend.find_function("f").unwrap();
    let function = &frontend.module()[f];
    assert!(function.is_lazy());
    assert_eq!(function.param_count(), 2);
    assert!(function.blocks().is_empty());
    assert_eq!(frontend.function_to_string(f), "function f(a, b) es5 lazy\n");
}

#[test]
fn test_lazy_matches_eager() {
    let src = "'use strict'; function f(a, b) { var c = a + b; if (c) { return c; } x = b; return g(c); }";
    let eager = compile_ok(src);
    let mut lazy = compile_lazy_ok(src);

    let f = lazy.find_function("f").unwrap();
    lazy.compile_lazy(f).unwrap();
    assert!(!lazy.module()[f].is_lazy());
    assert_eq!(lazy.function_to_string(f), function_text(&eager, "f"));
}

#[test]
fn test_lazy_function_sees_outer_variables() {
    let mut frontend =
        compile_lazy_ok("function outer(a) { function inner() { return a; } return inner; }");
    assert_eq!(frontend.compile_all_lazy().unwrap(), 2);
    assert_eq!(frontend.module().len(), 3);
    assert!(function_text(&frontend, "inner").contains("LoadFrame [a@outer]"));
}

#[test]
fn test_lazy_named_function_expression() {
    let mut frontend = compile_lazy_ok("var g = function h() { return h; };");
    let h = frontend.find_function("h").unwrap();
    frontend.compile_lazy(h).unwrap();
    assert!(frontend.function_to_string(h).contains("LoadFrame [?anon_0_h@global]"));
}

#[test]
fn test_lazy_validation_error_becomes_throw() {
    let mut frontend = compile_lazy_ok("function f(a) { x: x: ; }");
    let f = frontend.find_function("f").unwrap();
    frontend.compile_lazy(f).unwrap();

    assert_eq!(frontend.diagnostics().error_count(), 1);
    assert_eq!(
        frontend.function_to_string(f),
        "function f(a) es5 strict\n\
         %BB0:\n  \
         %0 = TryLoadGlobal SyntaxError\n  \
         %1 = Call %0, undefined, \"label 'x' is already defined\"\n  \
         Throw %1\n"
    );
    assert!(frontend.module_to_string().contains("SyntaxError?"));
}

// ============================================================================
// Degenerate functions
// ============================================================================

#[test]
fn test_dummy_function() {
    let mut sources = SourceManager::new();
    let buffer = sources.add_buffer("t.js", "");
    let ast = Ast::new();
    let sem = SemContext::new();
    let mut interner = Interner::new();
    let keywords = Keywords::new(&mut interner);
    let name = interner.intern("dummy");
    let mut module = Module::new();

    let function = IrGen::new(&ast, &sem, &mut interner, keywords, &mut module)
        .gen_dummy_function(name, SourceRange::new(buffer, 0, 0));

    let kinds: Vec<&str> = module[function]
        .all_instructions()
        .map(|instr| instr.kind.name())
        .collect();
    assert_eq!(kinds, ["Unreachable", "Return"]);
    assert_eq!(module[function].param_count(), 0);
    assert!(matches!(
        module[function].all_instructions().last().map(|instr| &instr.kind),
        Some(InstrKind::Return(_))
    ));
}
