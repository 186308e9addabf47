//! Binary to generate/update .expected.html and .expected.err files
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- basic   # Update only tests matching "basic"

use haml_jsp::{Config, compile};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests");

    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&test_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|s| s == "haml").unwrap_or(false))
    {
        let path = entry.path();
        let path_str = path.to_string_lossy();

        // Apply filter if provided
        if let Some(ref f) = filter {
            if !path_str.contains(f) {
                skipped += 1;
                continue;
            }
        }

        process_file(path);
        updated += 1;
    }

    println!("Updated {} files, skipped {}", updated, skipped);
}

/// Same configuration the expected-output harness builds for a case
fn case_config(path: &Path) -> Option<Config> {
    let config_path = path.with_extension("config.json");
    let config = if config_path.exists() {
        let text = fs::read_to_string(&config_path).ok()?;
        match Config::from_json(&text) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid config {:?}: {}", config_path, e);
                return None;
            }
        }
    } else {
        Config::default()
    };
    Some(config.with_filter("plain", |text: &str| text.to_string()))
}

fn process_file(path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", path, e);
            return;
        }
    };
    let Some(config) = case_config(path) else {
        return;
    };

    let is_error_test = path.to_string_lossy().contains("/errors/");

    match compile(&source, &config) {
        Ok(output) => {
            if is_error_test {
                eprintln!("ERROR: {:?} is in errors/ but compiles", path);
                return;
            }
            let expected_html = path.with_extension("expected.html");
            write(&expected_html, &output);
        }
        Err(e) => {
            if is_error_test {
                let expected_err = path.with_extension("expected.err");
                write(&expected_err, &format!("{}\n", e.kind.name()));
            } else {
                let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown");
                eprintln!(
                    "ERROR: {:?} failed to compile but is not in errors/:{}",
                    path,
                    e.render(&source, filename)
                );
            }
        }
    }
}

fn write(path: &Path, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Failed to write {:?}: {}", path, e);
    } else {
        println!("  wrote {}", path.display());
    }
}
