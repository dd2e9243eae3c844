//! Golden-file runner: convert `<dir>/*.json` and diff against the sibling `*.proto`.
//!
//! Usage: `cargo run -p dev-test-runner -- [fixtures-dir] [--bless]`
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use colored::Colorize;

fn main() -> Result<()> {
    let mut dir = PathBuf::from("fixtures");
    let mut bless = false;
    for arg in std::env::args().skip(1) {
        if arg == "--bless" { bless = true } else { dir = PathBuf::from(arg) }
    }

    let pattern = format!("{}/*.json", dir.display());
    let mut failed = 0usize;
    let mut total = 0usize;
    for entry in glob::glob(&pattern)? {
        let json_path = entry?;
        total += 1;
        if !check(&json_path, bless)? {
            failed += 1;
        }
    }

    if total == 0 {
        anyhow::bail!("no fixtures matched {pattern}");
    }
    eprintln!("—— {} passed, {} failed ——", total - failed, failed);
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check(json_path: &Path, bless: bool) -> Result<bool> {
    let proto_path = json_path.with_extension("proto");
    let source = std::fs::read_to_string(json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;
    let actual = match jsonbuf::convert(&source) {
        Ok(x) => x,
        Err(error) => {
            eprintln!("{} {}: {error}", "❌".red(), json_path.display());
            return Ok(false);
        }
    };

    if bless {
        std::fs::write(&proto_path, &actual)?;
        eprintln!("{} {}", "blessed".cyan(), proto_path.display());
        return Ok(true);
    }

    let expected = std::fs::read_to_string(&proto_path)
        .with_context(|| format!("missing golden file {}", proto_path.display()))?;
    if actual == expected {
        eprintln!("{} {}", "✅".green(), json_path.display());
        Ok(true)
    } else {
        eprintln!("{} {}", "❌ mismatch".red(), json_path.display());
        for (i, (a, e)) in actual.lines().zip(expected.lines()).enumerate() {
            if a != e {
                eprintln!("  line {}: expected {e:?}, got {a:?}", i + 1);
            }
        }
        if actual.lines().count() != expected.lines().count() {
            eprintln!(
                "  expected {} lines, got {}",
                expected.lines().count(),
                actual.lines().count()
            );
        }
        Ok(false)
    }
}
