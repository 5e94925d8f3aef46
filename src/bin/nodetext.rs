//! Command-line interface for nodetext
//!
//! Usage:
//!   nodetext inspect `<path>` [--format `<format>`] [--node `<id>`]
//!                                                    - Parse one file and print it in a format
//!   nodetext compile `<dir>` [--config `<file>`]      - Load a project and write dynamic output
//!   nodetext list-formats                            - List all available formats
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default: `warn`).

use clap::{Arg, Command};
use nodetext::nodetext::config::Loader;
use nodetext::nodetext::dynamic::DirectiveRegistry;
use nodetext::nodetext::formats::FormatRegistry;
use nodetext::nodetext::location::LineIndex;
use nodetext::nodetext::parsing::{parse_buffer, ParseContext};
use nodetext::nodetext::project::{DiskStore, ProjectIndex};
use nodetext::nodetext::Settings;
use std::path::{Path, PathBuf};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let matches = Command::new("nodetext")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse and compile brace-delimited plain-text notes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Settings file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Parse a file and print its node tree")
                .arg(
                    Arg::new("path")
                        .help("Path to the file to parse")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format (e.g., 'treeviz', 'json')")
                        .default_value("treeviz"),
                )
                .arg(
                    Arg::new("node")
                        .long("node")
                        .short('n')
                        .help("Print only the subtree under this node id"),
                ),
        )
        .subcommand(
            Command::new("compile")
                .about("Load a directory and write every dynamic definition's output")
                .arg(
                    Arg::new("dir")
                        .help("Project directory")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(Command::new("list-formats").about("List available output formats"))
        .get_matches();

    let settings = load_settings(matches.get_one::<String>("config"));

    match matches.subcommand() {
        Some(("inspect", inspect_matches)) => {
            let path = inspect_matches.get_one::<String>("path").unwrap();
            let format = inspect_matches.get_one::<String>("format").unwrap();
            let node = inspect_matches.get_one::<String>("node").map(String::as_str);
            handle_inspect_command(path, format, node, &settings);
        }
        Some(("compile", compile_matches)) => {
            let dir = compile_matches.get_one::<String>("dir").unwrap();
            handle_compile_command(dir, settings);
        }
        Some(("list-formats", _)) => {
            handle_list_formats_command();
        }
        _ => unreachable!(),
    }
}

fn load_settings(config: Option<&String>) -> Settings {
    let loader = match config {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new(),
    };
    loader.build().unwrap_or_else(|e| {
        eprintln!("Error loading settings: {}", e);
        std::process::exit(1);
    })
}

/// Handle the inspect command
fn handle_inspect_command(path: &str, format: &str, node: Option<&str>, settings: &Settings) {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file: {}", e);
        std::process::exit(1);
    });

    let registry = DirectiveRegistry::with_defaults();
    let buffer = parse_buffer(
        Path::new(path),
        &source,
        &ParseContext::new(settings, &registry),
    );
    for error in &buffer.errors {
        eprintln!("Parse error: {}", error);
    }
    let lines = LineIndex::new(&buffer.contents);
    for (id, error) in &buffer.directive_errors {
        match buffer.get_node(id) {
            Some(found) => {
                let position = lines.position(found.start_position());
                eprintln!("{}:{}: definition error in '{}': {}", path, position, id, error);
            }
            None => eprintln!("Definition error in '{}': {}", id, error),
        }
    }

    let output = FormatRegistry::with_defaults()
        .render(&buffer, format, node)
        .unwrap_or_else(|e| {
            eprintln!("Format error: {}", e);
            std::process::exit(1);
        });
    print!("{}", output);
}

/// Handle the compile command
fn handle_compile_command(dir: &str, settings: Settings) {
    let mut index = ProjectIndex::new(DiskStore::new(PathBuf::from(dir)), settings);
    if let Err(e) = index.load() {
        eprintln!("Error loading project: {}", e);
        std::process::exit(1);
    }

    println!("Parsed {} file(s)", index.files().len());
    for error in index.errors() {
        eprintln!("  {}", error);
    }
    if !index.errors().is_empty() {
        std::process::exit(2);
    }
}

/// Handle the list-formats command
fn handle_list_formats_command() {
    let registry = FormatRegistry::with_defaults();
    println!("Available formats:\n");
    for (name, summary) in registry.formats() {
        println!("  {}", name);
        println!("    {}", summary);
    }
}
