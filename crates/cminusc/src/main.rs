use std::fs;
use std::ops::Range;
use std::path::PathBuf;
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;

use cminus_common::{Diagnostic, DiagnosticBag};
use cminus_compiler::ast::json;
use cminus_compiler::semantic::{self, AnalyzerConfig};

/// C-Minus semantic checker.
///
/// Reads a syntax tree produced by the parser (JSON) and reports semantic
/// errors.
#[derive(Parser)]
#[command(
    name = "cminusc",
    version,
    about,
    long_about = "C-Minus semantic checker.\n\nReads the JSON syntax tree of a C-Minus program, binds every declaration\nand type-checks every use.\n\nExamples:\n  cminusc sort.json                      Report semantic errors\n  cminusc sort.json --trace              Also print the symbol table\n  cminusc sort.json --source sort.cm     Show errors against the source\n  cminusc sort.json --emit-symbols       Print the symbol table as JSON"
)]
struct Cli {
    /// Input syntax tree (.json).
    input: PathBuf,

    /// Source file the tree was parsed from, for annotated diagnostics.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Print the symbol table after analysis.
    #[arg(long)]
    trace: bool,

    /// Print the symbol table as JSON to stdout.
    #[arg(long = "emit-symbols")]
    emit_symbols: bool,

    /// Only print the number of errors.
    #[arg(long)]
    check: bool,

    /// Suppress the summary line.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let tree = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let source = cli.source.as_ref().map(|path| match fs::read_to_string(path) {
        Ok(s) => (path.display().to_string(), s),
        Err(e) => {
            eprintln!("error: could not read '{}': {}", path.display(), e);
            process::exit(1);
        }
    });

    let program = match json::from_json(&tree) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: invalid syntax tree '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    // === Semantic Analysis ===
    let config = AnalyzerConfig { trace: cli.trace };
    let mut diagnostics = DiagnosticBag::new();
    let analysis = semantic::analyze(program.as_deref(), &mut diagnostics, &config);

    if cli.check {
        println!("{}", analysis.error_count);
    } else {
        for diag in diagnostics.diagnostics() {
            match &source {
                Some((file_name, text)) => print_diagnostic(diag, text, file_name),
                None => eprintln!("{}", diag),
            }
        }
    }

    if let Some(listing) = &analysis.listing {
        println!("\nSymbol table:\n\n{}", listing);
    }

    if cli.emit_symbols {
        match serde_json::to_string_pretty(&analysis.symbols.snapshot()) {
            Ok(j) => println!("{}", j),
            Err(e) => {
                eprintln!("error: failed to serialize symbol table: {}", e);
                process::exit(1);
            }
        }
    }

    if !cli.quiet && !cli.check {
        if analysis.is_accepted() {
            println!("No semantic errors found.");
        } else {
            eprintln!("{} semantic error(s) found.", analysis.error_count);
        }
    }

    if !analysis.is_accepted() {
        process::exit(1);
    }
}

/// Byte range of 1-based `line` in `source`, excluding the newline.
fn line_range(source: &str, line: u32) -> Option<Range<usize>> {
    let mut start = 0;
    for (number, text) in source.split_inclusive('\n').enumerate() {
        if number + 1 == line as usize {
            let len = text.trim_end_matches(['\n', '\r']).len();
            return Some(start..start + len.max(1));
        }
        start += text.len();
    }
    None
}

fn print_diagnostic(diag: &Diagnostic, source: &str, file_name: &str) {
    let Some(span) = line_range(source, diag.line) else {
        eprintln!("{}", diag);
        return;
    };

    let mut report = Report::build(ReportKind::Error, file_name, span.start)
        .with_message(diag.to_string())
        .with_label(
            Label::new((file_name, span))
                .with_message(&diag.message)
                .with_color(Color::Red),
        );

    for related in &diag.related {
        if let Some(range) = line_range(source, related.line) {
            report = report.with_label(
                Label::new((file_name, range))
                    .with_message(&related.message)
                    .with_color(Color::Blue),
            );
        }
    }

    if let Err(e) = report.finish().eprint((file_name, Source::from(source))) {
        eprintln!("error: could not render diagnostic: {}", e);
        eprintln!("{}", diag);
    }
}
