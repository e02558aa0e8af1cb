use assert_cmd::Command;
use predicates::str::contains;
use std::io::Write;
use tempfile::NamedTempFile;

const FIXTURE: &str = "tests/fixtures/case_study.md";

fn casebook() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("casebook"));
    cmd.env_remove("CASEBOOK_CONFIG_FILE")
        .env_remove("CASEBOOK__RENDER__HEADING_SLUGS")
        .env_remove("CASEBOOK__TOC__SCROLL_OFFSET")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn render_json_lists_items_and_diagnostics() {
    let assert = casebook()
        .args(["render", FIXTURE])
        .assert()
        .success()
        .stderr(contains("no renderer for block type `bogus`"));

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");
    assert_eq!(value["items"].as_array().map(Vec::len), Some(18));
    assert_eq!(value["diagnostics"][0]["kind"], "unknown_block_type");
}

#[test]
fn render_html_includes_toc_nav() {
    casebook()
        .args(["render", FIXTURE, "--format", "html"])
        .assert()
        .success()
        .stdout(contains("<nav class=\"case-study__toc\""))
        .stdout(contains("<h2 id=\"lessons-learned\">Lessons Learned</h2>"));
}

#[test]
fn scan_prints_segments() {
    casebook()
        .args(["scan", FIXTURE])
        .assert()
        .success()
        .stdout(contains("\"kind\": \"block\""))
        .stdout(contains("\"type_name\": \"techstack\""));
}

#[test]
fn toc_scroll_tracks_active_section() {
    casebook()
        .args(["toc", FIXTURE, "--scroll", "1300"])
        .assert()
        .success()
        .stdout(contains("\"active_id\": \"research-analysis\""));
}

#[test]
fn toc_jump_to_unknown_section_fails() {
    casebook()
        .args(["toc", FIXTURE, "--jump", "appendix"])
        .assert()
        .failure()
        .code(65);
}

#[test]
fn config_file_controls_scroll_offset() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tmp file");
    writeln!(file, "[toc]\nscroll_offset = 0.0").expect("write config");

    casebook()
        .arg("--config-file")
        .arg(file.path())
        .args(["toc", FIXTURE, "--scroll", "1150"])
        .assert()
        .success()
        .stdout(contains("\"active_id\": \"problem-statement\""));
}

#[test]
fn missing_document_is_an_io_failure() {
    let missing = NamedTempFile::new().expect("tmp file").into_temp_path();
    let path = missing.to_path_buf();
    drop(missing);

    casebook()
        .args(["scan"])
        .arg(&path)
        .assert()
        .failure()
        .code(74);
}
