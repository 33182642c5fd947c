//! Integration tests for the pagedeck CLI
//!
//! Runs the built binary against generated fixtures. Every command that
//! touches pages runs with `--no-render` so no pdfium library is needed.

use anyhow::Result;
use pagedeck_test_suite::generators::{jpeg_bytes, png_bytes};
use pagedeck_test_suite::{ArchiveValidator, DocumentValidator, TestPdfBuilder};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

/// Test helper to run CLI command and return output
fn run_cli_command(args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_pagedeck"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()?;
    Ok(output)
}

/// A temp dir holding `report.pdf` (3 pages) and `photo.jpg` (40x30)
fn setup_inputs() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().expect("Failed to create temp directory");
    let pdf = dir.path().join("report.pdf");
    let jpg = dir.path().join("photo.jpg");
    fs::write(&pdf, TestPdfBuilder::letter_pages(3).build()).unwrap();
    fs::write(&jpg, jpeg_bytes(40, 30)).unwrap();
    (dir, pdf, jpg)
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_cli_help_command() {
    let output = run_cli_command(&["--help"]).unwrap();
    assert!(output.status.success());

    let help = stdout(&output);
    for command in ["info", "merge", "compress", "export"] {
        assert!(help.contains(command), "help should list {command}");
    }
}

#[test]
fn test_cli_version_command() {
    let output = run_cli_command(&["--version"]).unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("pagedeck"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_cli_command(&["shuffle"]).unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_missing_inputs() {
    let output = run_cli_command(&["merge"]).unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("required"));
}

#[test]
fn test_cli_info_with_nonexistent_file() {
    let output = run_cli_command(&["info", "--no-render", "/nonexistent/file.pdf"]).unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to read"));
}

#[test]
fn test_cli_info_lists_pages() {
    let (_dir, pdf, jpg) = setup_inputs();

    let output = run_cli_command(&["info", "--no-render", arg(&pdf), arg(&jpg)]).unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let listing = stdout(&output);
    assert!(listing.starts_with("4 pages"));
    assert!(listing.contains("report.pdf page 3"));
    assert!(listing.contains("photo.jpg page 1"));
}

#[test]
fn test_cli_info_rejects_unsupported_inputs() {
    let dir = tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "hello").unwrap();

    let output = run_cli_command(&["info", "--no-render", arg(&notes)]).unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("none of the inputs"));
}

#[test]
fn test_cli_merge_with_edits() {
    let (dir, pdf, jpg) = setup_inputs();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    let output = run_cli_command(&[
        "merge",
        "--no-render",
        arg(&pdf),
        arg(&jpg),
        "--rotate",
        "2:right",
        "--rotate",
        "2:right",
        "--delete",
        "1",
        "--move",
        "4:2",
        "--output",
        arg(&out),
        "--name",
        "bundle",
    ])
    .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Merged 3 pages"));

    let merged = fs::read(out.join("bundle.pdf")).unwrap();
    let validator = DocumentValidator::new(&merged).unwrap();
    let pages = validator.pages().unwrap();
    assert_eq!(pages.len(), 3);
    // Initial order [p1, p2, p3, img]; img moves before p2, then p1 is deleted.
    assert_eq!(pages[0].images, 1);
    assert_eq!(pages[1].rotate, 180);
    assert_eq!(pages[2].rotate, 0);
}

#[test]
fn test_cli_merge_default_name() {
    let (dir, pdf, _jpg) = setup_inputs();

    let output = run_cli_command(&["merge", "--no-render", arg(&pdf), "-o", arg(dir.path())]).unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let written: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("report_"))
        .collect();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with(".pdf"));
}

#[test]
fn test_cli_rotate_invalid_direction() {
    let (_dir, pdf, _jpg) = setup_inputs();

    let output = run_cli_command(&["merge", "--no-render", arg(&pdf), "--rotate", "1:up"]).unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown rotate direction"));
}

#[test]
fn test_cli_delete_out_of_range() {
    let (dir, pdf, _jpg) = setup_inputs();

    let output = run_cli_command(&[
        "merge",
        "--no-render",
        arg(&pdf),
        "--delete",
        "9",
        "-o",
        arg(dir.path()),
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("page 9 does not exist"));
}

#[test]
fn test_cli_compress_raster() {
    let (dir, pdf, jpg) = setup_inputs();

    let output = run_cli_command(&[
        "compress",
        "--no-render",
        arg(&pdf),
        arg(&jpg),
        "--strategy",
        "raster",
        "--preset",
        "low",
        "--keep-merged",
        "-o",
        arg(dir.path()),
        "-n",
        "small",
    ])
    .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("MB ->"));

    assert!(dir.path().join("small.pdf").exists());
    let compressed = fs::read(dir.path().join("small_compressed.pdf")).unwrap();
    let pages = DocumentValidator::new(&compressed).unwrap().pages().unwrap();
    assert_eq!(pages.len(), 4);
    assert!(pages.iter().all(|page| page.images == 1));
}

#[test]
fn test_cli_compress_unknown_preset() {
    let (_dir, pdf, _jpg) = setup_inputs();

    let output = run_cli_command(&["compress", "--no-render", arg(&pdf), "--preset", "tiny"]).unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_export_png() {
    let (dir, pdf, _jpg) = setup_inputs();
    let logo = dir.path().join("logo.png");
    fs::write(&logo, png_bytes(20, 10, true)).unwrap();

    let output = run_cli_command(&[
        "export",
        "--no-render",
        arg(&pdf),
        arg(&logo),
        "--format",
        "png",
        "--rotate",
        "4:left",
        "-o",
        arg(dir.path()),
    ])
    .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Exported 4 pages as png"));

    let archive = fs::read(dir.path().join("pdf_pages_as_png.zip")).unwrap();
    assert_eq!(
        ArchiveValidator::entry_names(&archive).unwrap(),
        vec!["page-01.png", "page-02.png", "page-03.png", "page-04.png"]
    );
    let entries = ArchiveValidator::entries(&archive).unwrap();
    assert_eq!((entries[3].width, entries[3].height), (10, 20));
}
