#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::exit;

use saphyr_marshal::{AnyField, ErrorCollector, FlagsConfig, LoadOptions, PathConfig, load};

const USAGE: &str = "Usage: saphyr-marshal <file> [--root DIR]... [--flag NAME]...\n\
    Loads a YAML file with the built-in tag handlers, prints every error and the resolved value.";

struct Args {
    file: PathBuf,
    roots: Vec<PathBuf>,
    flags: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut file = None;
    let mut roots = Vec::new();
    let mut flags = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--root" => roots.push(PathBuf::from(args.next().ok_or("--root needs a directory")?)),
            "--flag" => flags.push(args.next().ok_or("--flag needs a name")?),
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("Unknown option {other}")),
            other if file.is_none() => file = Some(PathBuf::from(other)),
            other => return Err(format!("Unexpected argument {other}")),
        }
    }
    let file = file.ok_or("Expected a path to a YAML file")?;
    Ok(Args { file, roots, flags })
}

/// Load a YAML file and report every problem found in it. Also resolves imports,
/// globs and conditionals, so the printed value is what an application would see.
fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            exit(1);
        }
    };

    let name = args.file.display().to_string();
    let content = match std::fs::read_to_string(&args.file) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read {name}: {err}");
            exit(2);
        }
    };

    let errors = ErrorCollector::new();
    let options = LoadOptions::default()
        .with_error_handler(errors.handler())
        .with_source_name(name.clone())
        .with_location(args.file.clone())
        .with_config(PathConfig::with_roots(args.roots))
        .with_config(FlagsConfig::new(args.flags));

    let loaded = match load(&content, &AnyField::new(), options) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{}", err.render_snippet(&content));
            exit(3);
        }
    };

    for reported in errors.errors() {
        // Errors in imported files point into those files, not into `content`.
        if reported.mark.source() == name {
            eprintln!("{}\n", reported.render_snippet(&content));
        } else {
            eprintln!("{reported}\n");
        }
    }

    if let Some(value) = &loaded {
        println!("{value}");
    }
    if !errors.is_empty() || loaded.is_none() {
        eprintln!("{name} invalid: {} error(s)", errors.len());
        exit(3);
    }
}
