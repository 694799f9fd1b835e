//! Hand-rolled command-line front end. No argument-parsing crate: flags
//! and commands are matched directly against `std::env::args()`, mirroring
//! the CLI style used elsewhere in this pipeline's tooling.

use crate::build::host_compiler;
use crate::build::Pipeline;
use crate::interning::ModulePath;
use crate::project::Manifest;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub struct Options {
    pub verbose: bool,
    pub output: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verbose: false,
            output: None,
        }
    }
}

pub fn run() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut options = Options::default();
    args.retain(|arg| {
        if arg == "--verbose" {
            options.verbose = true;
            false
        } else {
            true
        }
    });

    if let Some(idx) = args.iter().position(|a| a == "-o") {
        if idx + 1 < args.len() {
            options.output = Some(PathBuf::from(args.remove(idx + 1)));
            args.remove(idx);
        }
    }

    let Some(command) = args.first().cloned() else {
        print_usage();
        return ExitCode::from(2);
    };
    let rest = &args[1..];

    match command.as_str() {
        "build" => cmd_build(rest, &options),
        "build-project" => cmd_build_project(&options),
        "emit" => cmd_emit(rest, &options),
        "run" => cmd_run(rest, &options),
        "check" => cmd_check(rest),
        "install-deps" => {
            println!("install-deps is not part of the core pipeline");
            ExitCode::SUCCESS
        }
        "stdlib" => cmd_stdlib(rest),
        "lsp" => {
            println!("lsp is not part of the core pipeline");
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("unknown command '{other}'");
            print_usage();
            ExitCode::from(2)
        }
    }
}

fn print_usage() {
    eprintln!("usage: glintc <build|build-project|emit|run|check|install-deps|stdlib|lsp> [args] [--verbose] [-o <file>]");
}

fn single_file_pipeline(file: &Path) -> (Pipeline, ModulePath) {
    let mut pipeline = Pipeline::new();
    let source = std::fs::read_to_string(file).unwrap_or_default();
    let module = ModulePath::from_relative_file_path(
        file.file_name().map(Path::new).unwrap_or(file),
        None,
        &mut pipeline.string_table,
    );
    let files = vec![crate::build::SourceFile {
        relative_path: file.file_name().map(PathBuf::from).unwrap_or_else(|| file.to_path_buf()),
        source,
    }];
    pipeline.build_module_graph(files);
    (pipeline, module)
}

fn report_and_exit(pipeline: &Pipeline) -> ExitCode {
    let table = &pipeline.string_table;
    let text = pipeline.reporter.render_all(table, &|_module| None);
    eprint!("{text}");
    if pipeline.reporter.has_error() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn cmd_check(rest: &[String]) -> ExitCode {
    let Some(file) = rest.first() else {
        eprintln!("usage: glintc check <file>");
        return ExitCode::from(2);
    };
    let (mut pipeline, _entry) = single_file_pipeline(Path::new(file));
    if !pipeline.reporter.has_error() {
        pipeline.resolve_imports();
    }
    if !pipeline.reporter.has_error() {
        pipeline.resolve_names();
    }
    if !pipeline.reporter.has_error() {
        pipeline.check_types();
    }
    report_and_exit(&pipeline)
}

fn cmd_emit(rest: &[String], options: &Options) -> ExitCode {
    let Some(file) = rest.first() else {
        eprintln!("usage: glintc emit <file>");
        return ExitCode::from(2);
    };
    let (mut pipeline, entry) = single_file_pipeline(Path::new(file));
    if !pipeline.reporter.has_error() {
        pipeline.resolve_imports();
    }
    if !pipeline.reporter.has_error() {
        pipeline.resolve_names();
    }
    if !pipeline.reporter.has_error() {
        pipeline.check_types();
    }
    if pipeline.reporter.has_error() {
        return report_and_exit(&pipeline);
    }

    let cpp = pipeline.generate_cpp(&entry);
    match &options.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &cpp) {
                eprintln!("could not write {}: {e}", path.display());
                return ExitCode::from(1);
            }
        }
        None => println!("{cpp}"),
    }
    ExitCode::SUCCESS
}

fn cmd_build(rest: &[String], options: &Options) -> ExitCode {
    let Some(file) = rest.first() else {
        eprintln!("usage: glintc build <file>");
        return ExitCode::from(2);
    };
    let (mut pipeline, entry) = single_file_pipeline(Path::new(file));
    if !pipeline.reporter.has_error() {
        pipeline.resolve_imports();
    }
    if !pipeline.reporter.has_error() {
        pipeline.resolve_names();
    }
    if !pipeline.reporter.has_error() {
        pipeline.check_types();
    }
    if pipeline.reporter.has_error() {
        return report_and_exit(&pipeline);
    }

    let cpp = pipeline.generate_cpp(&entry);
    let output_path = options.output.clone().unwrap_or_else(|| PathBuf::from("a.out"));
    if host_compiler::compile_only(&cpp, &output_path, 0, &mut pipeline.reporter).is_err() {
        return report_and_exit(&pipeline);
    }
    if options.verbose {
        println!("wrote {}", output_path.display());
    }
    ExitCode::SUCCESS
}

fn cmd_build_project(options: &Options) -> ExitCode {
    let manifest_path = Path::new(Manifest::FILE_NAME);
    let manifest = match Manifest::load(manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    let mut pipeline = Pipeline::new();
    pipeline.set_package(manifest.project.name.clone());
    let src_root = Path::new("src");
    let mut entry = ModulePath::from_single(&manifest.project.name, &mut pipeline.string_table);
    entry.push("main", &mut pipeline.string_table);
    match pipeline.run(src_root, &entry) {
        Ok(cpp) => {
            let output_path = options
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&manifest.project.name));
            let optimization = manifest.build.optimization.unwrap_or(0);
            if host_compiler::compile_only(&cpp, &output_path, optimization, &mut pipeline.reporter).is_err() {
                return report_and_exit(&pipeline);
            }
            if options.verbose {
                println!("built project '{}' -> {}", manifest.project.name, output_path.display());
            }
            ExitCode::SUCCESS
        }
        Err(_) => report_and_exit(&pipeline),
    }
}

fn cmd_run(rest: &[String], _options: &Options) -> ExitCode {
    let Some(file) = rest.first() else {
        eprintln!("usage: glintc run <file>");
        return ExitCode::from(2);
    };
    let (mut pipeline, entry) = single_file_pipeline(Path::new(file));
    if !pipeline.reporter.has_error() {
        pipeline.resolve_imports();
    }
    if !pipeline.reporter.has_error() {
        pipeline.resolve_names();
    }
    if !pipeline.reporter.has_error() {
        pipeline.check_types();
    }
    if pipeline.reporter.has_error() {
        return report_and_exit(&pipeline);
    }

    let cpp = pipeline.generate_cpp(&entry);
    match host_compiler::compile_and_run(&cpp, 0, &mut pipeline.reporter) {
        Ok(code) => ExitCode::from(code as u8),
        Err(()) => report_and_exit(&pipeline),
    }
}

fn cmd_stdlib(rest: &[String]) -> ExitCode {
    match rest.first().map(String::as_str) {
        Some("list") => {
            for name in ["Std.IO", "Std.Math", "Std.Parse", "Std.String", "Std.Array"] {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
        Some("extract") | Some("import") | Some("new") => {
            println!("stdlib {} is not part of the core pipeline", rest[0]);
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("usage: glintc stdlib <list|extract|import|new>");
            ExitCode::from(2)
        }
    }
}
