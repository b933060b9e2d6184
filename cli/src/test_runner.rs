use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use richtext::{Document, text_to_document};

const FIXTURE_SUFFIX: &str = ".test.txt";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected block kinds in order (`heading`, `paragraph`, `list`).
    #[serde(default)]
    pub expect_blocks: Option<Vec<String>>,

    /// Expected plain text of each block; list items are joined by newlines.
    #[serde(default)]
    pub expect_texts: Option<Vec<String>>,

    /// Expected HTML rendering (trimmed comparison).
    #[serde(default)]
    pub expect_html: Option<String>,

    /// Expected document JSON, compared structurally.
    #[serde(default)]
    pub expect_json: Option<String>,
}

/// Parse a `.test.txt` file into its TOML config and converter input.
/// The file's final line terminator is not part of the input.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..]; // skip \n---
    let input = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    let input = input
        .strip_suffix("\r\n")
        .or_else(|| input.strip_suffix('\n'))
        .unwrap_or(input);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, input))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let (config, input) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let document = text_to_document(input);
    let outcome = match check_document(&config, &document) {
        Some(reason) => TestOutcome::Fail(reason),
        None => TestOutcome::Pass,
    };

    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Returns `Some(reason)` on the first expectation that does not hold.
fn check_document(config: &TestConfig, document: &Document) -> Option<String> {
    if let Some(expected) = &config.expect_blocks {
        let actual: Vec<&str> = document.blocks().iter().map(|b| b.kind().as_str()).collect();
        if actual != *expected {
            return Some(format!(
                "block kinds mismatch\n  expected: [{}]\n  actual:   [{}]",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if let Some(expected) = &config.expect_texts {
        let actual: Vec<String> = document.blocks().iter().map(|b| b.plain_text()).collect();
        if actual != *expected {
            return Some(format!(
                "block texts mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    if let Some(expected) = &config.expect_html {
        let actual = document.to_html();
        if actual.trim() != expected.trim() {
            return Some(format!(
                "html mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual.trim()
            ));
        }
    }

    if let Some(expected) = &config.expect_json {
        let expected: serde_json::Value = match serde_json::from_str(expected) {
            Ok(v) => v,
            Err(e) => return Some(format!("expect_json is not valid JSON: {}", e)),
        };
        let actual = match serde_json::to_value(document) {
            Ok(v) => v,
            Err(e) => return Some(format!("cannot serialize document: {}", e)),
        };
        if actual != expected {
            return Some(format!(
                "json mismatch\n  expected: {}\n  actual:   {}",
                expected, actual
            ));
        }
    }

    None
}

/// Discover fixture files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(FIXTURE_SUFFIX) {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn label_for<'a>(result: &'a TestResult) -> &'a str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(FIXTURE_SUFFIX))
            .unwrap_or("?")
    })
}

fn print_failures(failures: &[TestResult]) {
    eprintln!();
    eprintln!("failures:");
    for f in failures {
        eprintln!();
        eprintln!("  --- {} ---", f.path.display());
        if let TestOutcome::Fail(reason) = &f.outcome {
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }
}

/// Run all fixture files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
            return 1;
        }
        filter_categories(all_categories, categories)
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !path.is_file() {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", bold(header, no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label_for(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), label_for(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        print_failures(&failures);
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        let ok = if no_color { "ok" } else { "\x1b[32mok\x1b[0m" };
        eprintln!("test result: {}. {} passed, 0 failed", ok, passed);
        0
    } else {
        let bad = if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" };
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            bad,
            passed,
            failed,
            passed + failed
        );
        1
    }
}

fn filter_categories(
    all_categories: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return all_categories;
    }

    let available: Vec<String> = all_categories
        .keys()
        .map(|k| if k.is_empty() { "(root)".to_string() } else { k.clone() })
        .collect();

    let mut filtered = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let matching: Vec<&String> = all_categories
            .keys()
            .filter(|cat| *cat == req || cat.starts_with(&format!("{}/", req)))
            .collect();
        if matching.is_empty() {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                available.join(", ")
            );
        }
        for cat in matching {
            filtered.insert(cat.clone(), all_categories[cat].clone());
        }
    }
    filtered
}
