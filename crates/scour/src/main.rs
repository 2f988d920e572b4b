//! Scour - HTML and CSS sanitizer
//!
//! Usage: scour [OPTIONS] [FILE]

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use scour_css::tokenize;
use scour_html::Tokenizer;
use scour_sanitize::{sanitize_reader, SanitizeSettings};
use scour_text::TextSource;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What to do with the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sanitize,
    Tokens,
    Css,
}

struct Options {
    mode: Mode,
    settings: Option<String>,
    input: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("scour");

    let mut options = Options {
        mode: Mode::Sanitize,
        settings: None,
        input: None,
    };

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage(program);
                return ExitCode::SUCCESS;
            }
            "--version" | "-V" => {
                println!("Scour {}", VERSION);
                return ExitCode::SUCCESS;
            }
            "--tokens" => options.mode = Mode::Tokens,
            "--css" => options.mode = Mode::Css,
            "--settings" => match rest.next() {
                Some(path) => options.settings = Some(path.clone()),
                None => {
                    eprintln!("Usage: {} --settings <POLICY.json> [FILE]", program);
                    return ExitCode::FAILURE;
                }
            },
            flag if flag.starts_with('-') && flag != "-" => {
                eprintln!("Unknown option: {}", flag);
                print_usage(program);
                return ExitCode::FAILURE;
            }
            path => {
                if options.input.is_some() {
                    eprintln!("Only one input file may be given");
                    return ExitCode::FAILURE;
                }
                options.input = Some(path.to_string());
            }
        }
    }

    if let Err(e) = run(&options) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_usage(program: &str) {
    println!(
        r#"Scour {} - HTML and CSS sanitizer

USAGE:
    {} [OPTIONS] [FILE]

Reads FILE, or stdin when FILE is missing or "-", and writes to stdout.

OPTIONS:
    -h, --help                  Print this help message
    -V, --version               Print version information
    --settings <POLICY.json>    Load allow-lists from a JSON policy
    --tokens                    Dump the HTML token stream instead of sanitizing
    --css                       Dump normalized CSS items instead of sanitizing

EXAMPLES:
    {} page.html
    {} --settings policy.json < page.html
    {} --css style.css

"#,
        VERSION, program, program, program, program
    );
}

fn run(options: &Options) -> Result<(), String> {
    let settings = match &options.settings {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
            SanitizeSettings::from_json(&json).map_err(|e| format!("{}: {}", path, e))?
        }
        None => SanitizeSettings::default(),
    };

    let input = open_input(options.input.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match options.mode {
        Mode::Sanitize => sanitize_reader(input, &settings, &mut out).map_err(|e| e.to_string()),
        Mode::Tokens => {
            let source = TextSource::from_reader(input).map_err(|e| e.to_string())?;
            for node in Tokenizer::with_cursor(source.cursor()) {
                writeln!(out, "{} {:?}", node.position, node.kind).map_err(|e| e.to_string())?;
            }
            Ok(())
        }
        Mode::Css => {
            let source = TextSource::from_reader(input).map_err(|e| e.to_string())?;
            for item in tokenize(source.as_str()).normalize() {
                writeln!(out, "{} {:?}", item.position, item.token).map_err(|e| e.to_string())?;
            }
            Ok(())
        }
    }
}

fn open_input(path: Option<&str>) -> Result<Box<dyn Read>, String> {
    match path {
        None | Some("-") => Ok(Box::new(io::stdin())),
        Some(path) => {
            log::info!("Reading {}", path);
            let file = fs::File::open(path).map_err(|e| format!("Failed to open {}: {}", path, e))?;
            Ok(Box::new(file))
        }
    }
}
