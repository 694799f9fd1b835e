//! End-to-end tests driving `build::Pipeline` the way the CLI does, over
//! a temporary project directory with real `.mg` files on disk.

use glint::build::Pipeline;
use glint::interning::ModulePath;
use std::fs;
use std::path::Path;

fn write_project(dir: &Path, files: &[(&str, &str)]) {
    for (relative, source) in files {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }
}

#[test]
fn builds_factorial_function_to_cpp() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            fn factorial(n: Int) -> Int {
                if n <= 1 {
                    return 1;
                }
                return n * factorial(n - 1);
            }

            fn main() -> Int {
                return factorial(5);
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("int64_t factorial(int64_t n)"));
    assert!(cpp.contains("glint_main"));
    assert!(cpp.contains("int main()"));
}

#[test]
fn tagged_optional_parses_and_checks() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            fn find(values: [Int], target: Int) -> Int? {
                for v in values {
                    if v == target {
                        return some(v);
                    }
                }
                return none;
            }

            fn main() -> Int {
                let result = find([1, 2, 3], 2);
                let described = match result {
                    some(v) => v + 1,
                    none => 0,
                };
                return described;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("std::optional<int64_t> find"));
    assert!(cpp.contains("has_value()"));
    assert!(cpp.contains(".value();"));
}

#[test]
fn some_pattern_variable_is_typed_as_the_optionals_inner_type() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            fn find(values: [Int], target: Int) -> Int? {
                for v in values {
                    if v == target {
                        return some(v);
                    }
                }
                return none;
            }

            fn main() -> Int {
                let result = find([1, 2, 3], 2);
                let described = match result {
                    some(v) => v == "not a number",
                    none => false,
                };
                return 0;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let result = pipeline.run(dir.path(), &entry);

    assert!(
        result.is_err(),
        "comparing the Some(v) binding (Int) against a String should be rejected"
    );
}

#[test]
fn cross_module_call_resolves_through_shared_string_table() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[
            (
                "math/util.mg",
                r#"
                export fn double(x: Int) -> Int {
                    return x * 2;
                }
                "#,
            ),
            (
                "main.mg",
                r#"
                using math.util;

                fn main() -> Int {
                    return math.util.double(21);
                }
                "#,
            ),
        ],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry);

    assert!(cpp.is_ok(), "expected cross-module build to succeed: {:?}", cpp.err());
    let cpp = cpp.unwrap();
    assert!(cpp.contains("double"));
}

#[test]
fn interpolated_string_and_array_iteration_emit() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            fn main() -> Void {
                let names = ["a", "b", "c"];
                for name in names {
                    Std.IO.print($"hello, {name}!");
                }
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("glint_to_string"));
    assert!(cpp.contains("for (auto&"));
}

#[test]
fn plain_string_containing_hole_syntax_is_not_interpolated() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            fn main() -> Void {
                Std.IO.print("hello, {name}!");
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(!cpp.contains("glint_to_string"));
    assert!(cpp.contains(r#""hello, {name}!""#));
}

#[test]
fn dollar_prefixed_string_interpolates_a_function_call_hole() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            fn fact(n: Int) -> Int {
                if n <= 1 {
                    return 1;
                }
                return n * fact(n - 1);
            }

            fn main() -> Void {
                Std.IO.print($"{fact(5)}");
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("glint_to_string(fact(5))"));
}

#[test]
fn string_concatenation_with_a_non_string_operand_checks_and_emits() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            fn describe(count: Int) -> String {
                return "count: " + count;
            }

            fn main() -> Int {
                Std.IO.print(describe(3));
                return 0;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("std::string describe(int64_t count)"));
}

#[test]
fn assignment_to_non_lvalue_is_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[("main.mg", "fn main() -> Int { 1 + 2 = 3; return 0; }")],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let result = pipeline.run(dir.path(), &entry);

    assert!(result.is_err(), "assigning to a non-lvalue should be rejected");
}

#[test]
fn module_names_are_prefixed_with_the_package_name() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[
            (
                "math/util.mg",
                r#"
                export fn double(x: Int) -> Int {
                    return x * 2;
                }
                "#,
            ),
            (
                "main.mg",
                r#"
                using myapp.math.util;

                fn main() -> Int {
                    return myapp.math.util.double(21);
                }
                "#,
            ),
        ],
    );

    let mut pipeline = Pipeline::new();
    pipeline.set_package("myapp");
    let mut entry = ModulePath::from_single("myapp", &mut pipeline.string_table);
    entry.push("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry);

    assert!(cpp.is_ok(), "expected package-prefixed build to succeed: {:?}", cpp.err());
    assert!(cpp.unwrap().contains("double"));
}

#[test]
fn native_block_passes_through_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            @cpp{
            inline int64_t triple(int64_t x) { return x * 3; }
            }

            fn main() -> Int {
                return 0;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("inline int64_t triple(int64_t x)"));
}

#[test]
fn native_import_emits_include_and_using_namespace() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            using native system "algorithm" as std;

            fn main() -> Int {
                return 0;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("#include <algorithm>"));
    assert!(cpp.contains("using namespace std;"));
}

#[test]
fn native_import_with_selected_symbols_emits_qualified_using_decls() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            using native system "algorithm" as std.{sort, find};

            fn main() -> Int {
                return 0;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("using std::sort;"));
    assert!(cpp.contains("using std::find;"));
    assert!(!cpp.contains("using namespace std;"));
}

#[test]
fn class_emits_constructor_visibility_sections_and_static_members() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            class Point {
                export x: Int,
                export y: Int,
                static origin_label: String = "origin",

                export fn sum() -> Int {
                    return this.x + this.y;
                }

                static fn label() -> String {
                    return origin_label;
                }
            }

            fn main() -> Int {
                let p = new Point(1, 2);
                Std.IO.print(Point.label());
                return p.sum();
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("struct Point {"));
    assert!(cpp.contains("Point(int64_t x, int64_t y) : x(x), y(y) {}"));
    assert!(cpp.contains("inline static std::string origin_label"));
    assert!(cpp.contains("static std::string label()"));
    assert!(cpp.contains("(*this)"));
    assert!(cpp.contains("Point(1, 2)"));
}

#[test]
fn class_with_no_fields_emits_default_constructor() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            class Empty {
                export fn noop() -> Void {}
            }

            fn main() -> Int {
                let e = new Empty();
                return 0;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    assert!(cpp.contains("Empty() = default;"));
}

#[test]
fn new_with_wrong_argument_count_is_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "main.mg",
            r#"
            class Point {
                x: Int,
                y: Int,
            }

            fn main() -> Int {
                let p = new Point(1);
                return 0;
            }
            "#,
        )],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let result = pipeline.run(dir.path(), &entry);

    assert!(result.is_err(), "wrong constructor argument count should be rejected");
}

#[test]
fn new_of_undefined_class_is_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[("main.mg", "fn main() -> Int { let p = new Ghost(); return 0; }")],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let result = pipeline.run(dir.path(), &entry);

    assert!(result.is_err(), "constructing an undefined class should be rejected");
}

#[test]
#[ignore = "requires a host C++17 compiler on PATH or GLINTC_CXX set"]
fn run_command_round_trips_through_a_real_host_compiler() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[("main.mg", "fn main() -> Int { return 7; }")],
    );

    let mut pipeline = Pipeline::new();
    let entry = ModulePath::from_single("main", &mut pipeline.string_table);
    let cpp = pipeline.run(dir.path(), &entry).expect("build should succeed");

    let mut reporter = glint::diagnostics::Reporter::new();
    let exit_code = glint::build::host_compiler::compile_and_run(&cpp, 0, &mut reporter)
        .expect("host compiler should run the binary");
    assert_eq!(exit_code, 7);
}
