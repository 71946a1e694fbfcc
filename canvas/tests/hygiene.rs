//! Source hygiene for the workspace.
//!
//! Every crate's production code stays free of panicking calls. The canvas
//! crate runs inside the render loop, so it additionally may not discard a
//! `Result` or silence dead code. Budgets only ever go down.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source roots, relative to the canvas package.
const CRATE_ROOTS: [&str; 5] = ["src", "../wire/src", "../store/src", "../client/src", "../cli/src"];

struct Budget {
    pattern: &'static str,
    max: usize,
}

const PANICS: [Budget; 6] = [
    Budget { pattern: ".unwrap()", max: 0 },
    Budget { pattern: ".expect(", max: 0 },
    Budget { pattern: "panic!(", max: 0 },
    Budget { pattern: "unreachable!(", max: 0 },
    Budget { pattern: "todo!(", max: 0 },
    Budget { pattern: "unimplemented!(", max: 0 },
];

const CANVAS_DISCARDS: [Budget; 3] = [
    Budget { pattern: "let _ =", max: 0 },
    Budget { pattern: ".ok()", max: 0 },
    Budget { pattern: "#[allow(dead_code)]", max: 0 },
];

struct SourceFile {
    path: PathBuf,
    content: String,
}

/// Non-test `.rs` files under `root`.
fn source_files(root: &str) -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new(root), &mut files);
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let is_test = path.file_name().is_some_and(|n| n.to_string_lossy().ends_with("_test.rs"));
        if is_test || path.extension().is_none_or(|e| e != "rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path, content });
        }
    }
}

/// Files containing `pattern`, with per-file line counts.
fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.display().to_string(), count))
        })
        .collect()
}

fn check(files: &[SourceFile], budgets: &[Budget]) -> Vec<String> {
    budgets
        .iter()
        .filter_map(|budget| {
            let found = hits(files, budget.pattern);
            let count: usize = found.iter().map(|(_, c)| c).sum();
            (count > budget.max).then(|| {
                let listing: Vec<String> = found.iter().map(|(path, c)| format!("    {path}: {c}")).collect();
                format!("`{}` found {count}, max {}\n{}", budget.pattern, budget.max, listing.join("\n"))
            })
        })
        .collect()
}

#[test]
fn crate_roots_exist() {
    for root in CRATE_ROOTS {
        assert!(!source_files(root).is_empty(), "no sources under {root}");
    }
}

#[test]
fn production_code_does_not_panic() {
    let failures: Vec<String> = CRATE_ROOTS
        .iter()
        .flat_map(|root| check(&source_files(root), &PANICS))
        .collect();
    assert!(failures.is_empty(), "panic budget exceeded:\n{}", failures.join("\n"));
}

#[test]
fn canvas_inspects_every_result() {
    let failures = check(&source_files("src"), &CANVAS_DISCARDS);
    assert!(failures.is_empty(), "discard budget exceeded:\n{}", failures.join("\n"));
}
