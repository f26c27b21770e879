use tempfile::TempDir;

use quill::error::ToolError;
use quill::tools::{cd, edit, glob, grep, ls, replace, view};

// ============================================================
// edit: byte-exactness and failure atomicity
// ============================================================

#[test]
fn edit_changes_only_the_matched_occurrence() {
    let tmp = TempDir::new().unwrap();
    let original = "header\nfn target() {}\nfooter\n";
    std::fs::write(tmp.path().join("f.rs"), original).unwrap();

    edit::edit(tmp.path(), "f.rs", "fn target() {}", "fn renamed() {}").unwrap();

    let after = std::fs::read_to_string(tmp.path().join("f.rs")).unwrap();
    assert_eq!(after, "header\nfn renamed() {}\nfooter\n");
}

#[test]
fn edit_view_differs_only_on_the_affected_line() {
    let tmp = TempDir::new().unwrap();
    let body: String = (1..=5).map(|i| format!("line number {i}\n")).collect();
    std::fs::write(tmp.path().join("f.txt"), &body).unwrap();

    let before = view::view(tmp.path(), "f.txt", None, None).unwrap();
    edit::edit(tmp.path(), "f.txt", "line number 3", "CHANGED").unwrap();
    let after = view::view(tmp.path(), "f.txt", None, None).unwrap();

    let diffs: Vec<(&str, &str)> = before
        .lines()
        .zip(after.lines())
        .filter(|(b, a)| b != a)
        .collect();
    assert_eq!(diffs.len(), 1);
    assert!(diffs[0].1.contains("CHANGED"));
}

#[test]
fn edit_failures_leave_the_file_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let original = "dup\ndup\nunique\n";
    std::fs::write(tmp.path().join("f.txt"), original).unwrap();

    assert!(matches!(
        edit::edit(tmp.path(), "f.txt", "dup", "x"),
        Err(ToolError::AmbiguousMatch { count: 2, .. })
    ));
    assert!(matches!(
        edit::edit(tmp.path(), "f.txt", "absent", "x"),
        Err(ToolError::NoMatch(_))
    ));

    let after = std::fs::read(tmp.path().join("f.txt")).unwrap();
    assert_eq!(after, original.as_bytes());
}

// ============================================================
// replace: full overwrite, atomicity
// ============================================================

#[test]
fn replace_then_view_returns_exactly_the_content() {
    let tmp = TempDir::new().unwrap();
    replace::replace(tmp.path(), "out.txt", "alpha\nbeta").unwrap();
    let shown = view::view(tmp.path(), "out.txt", None, None).unwrap();
    assert!(shown.contains("1\talpha"));
    assert!(shown.contains("2\tbeta"));
    let raw = std::fs::read_to_string(tmp.path().join("out.txt")).unwrap();
    assert_eq!(raw, "alpha\nbeta");
}

#[test]
fn failed_replace_preserves_the_original() {
    let tmp = TempDir::new().unwrap();
    // Parent "f.txt" is a file, so creating "f.txt/child" must fail and
    // leave the original file untouched.
    std::fs::write(tmp.path().join("f.txt"), "original").unwrap();
    let result = replace::replace(tmp.path(), "f.txt/child", "new");
    assert!(result.is_err());
    let after = std::fs::read_to_string(tmp.path().join("f.txt")).unwrap();
    assert_eq!(after, "original");
}

#[test]
fn replace_leaves_no_temp_files_behind() {
    let tmp = TempDir::new().unwrap();
    replace::replace(tmp.path(), "clean.txt", "content").unwrap();
    let entries: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["clean.txt"]);
}

// ============================================================
// glob: determinism
// ============================================================

#[test]
fn glob_is_deterministic_across_calls() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("a/b")).unwrap();
    for name in ["a/one.rs", "a/b/two.rs", "three.rs"] {
        std::fs::write(tmp.path().join(name), "").unwrap();
    }
    let runs: Vec<String> = (0..3)
        .map(|_| glob::glob_files(tmp.path(), "**/*.rs", None).unwrap())
        .collect();
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
    assert!(runs[0].contains("one.rs"));
    assert!(runs[0].contains("two.rs"));
    assert!(runs[0].contains("three.rs"));
}

// ============================================================
// grep / ls / cd error taxonomy
// ============================================================

#[test]
fn grep_invalid_regex_does_not_crash() {
    let tmp = TempDir::new().unwrap();
    match grep::grep(tmp.path(), "(unclosed", None, None) {
        Err(ToolError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
}

#[test]
fn ls_on_missing_path_is_not_found() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        ls::ls(tmp.path(), Some("ghost")),
        Err(ToolError::NotFound(_))
    ));
}

#[test]
fn cd_failure_does_not_commit() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("f.txt"), "").unwrap();
    // Both failure modes return Err; the caller keeps the old cwd.
    assert!(cd::cd(tmp.path(), "f.txt").is_err());
    assert!(cd::cd(tmp.path(), "missing").is_err());
}
