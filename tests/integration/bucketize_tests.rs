//! Bucketize integration tests
//!
//! These archive the fixture resource tree into real zip files on disk and
//! inspect what landed in each shard.

use respack::{
    create_partitions, walk_files, Archiver, Context, DeclarationOrder, PartitionSession, ResourceType, Sharder,
};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

/// Get the path to the fixture res directory
fn fixture_res() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/res")
}

/// (entry name -> contents) of an archive on disk.
fn read_zip(path: &Path) -> BTreeMap<String, String> {
    let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).unwrap();
        let mut body = String::new();
        file.read_to_string(&mut body).unwrap();
        entries.insert(file.name().to_string(), body);
    }
    entries
}

/// Runs bucketize over `roots`, one `<type>:<file>` spec per output.
fn bucketize(roots: &[PathBuf], specs: &[String]) -> respack::Result<()> {
    let files = walk_files(roots)?;
    let order = DeclarationOrder::new(&files);
    let session = PartitionSession::new(create_partitions(specs)?, Sharder::fnv(), order);
    let mut archiver = Archiver::new(&files, session)?.with_workers(4);
    archiver.archive(&Context::new())
}

fn spec(dir: &TempDir, res_type: &str, file: &str) -> String {
    format!("{}:{}", res_type, dir.path().join(file).display())
}

#[test]
fn test_archive_fixture_tree() {
    let out = TempDir::new().unwrap();
    let specs: Vec<String> = [
        ("string", "string.zip"),
        ("color", "color.zip"),
        ("id", "id.zip"),
        ("attr", "attr.zip"),
        ("styleable", "styleable.zip"),
        ("layout", "layout.zip"),
        ("drawable", "drawable.zip"),
        ("raw", "raw.zip"),
    ]
    .iter()
    .map(|(t, f)| spec(&out, t, f))
    .collect();
    bucketize(&[fixture_res()], &specs).unwrap();

    let strings = read_zip(&out.path().join("string.zip"));
    assert_eq!(
        strings.keys().collect::<Vec<_>>(),
        vec!["res/values-fr/strings.xml", "res/values/strings.xml"]
    );
    let default_strings = &strings["res/values/strings.xml"];
    assert!(default_strings.starts_with("<?xml version='1.0' encoding='utf-8'?>"));
    assert!(default_strings.contains(r#"<resources xmlns:tools="http://schemas.android.com/tools">"#));
    assert!(default_strings.contains(r#"<string name="app_name">Demo</string>"#));
    assert!(default_strings
        .contains(r#"<string name="greeting" tools:ignore="MissingTranslation">Hello <b>there</b></string>"#));
    assert!(!default_strings.contains("accent"));
    assert!(default_strings.ends_with("</resources>"));
    assert!(strings["res/values-fr/strings.xml"].contains(r#"<string name="app_name">Demo FR</string>"#));

    let colors = read_zip(&out.path().join("color.zip"));
    assert!(colors["res/values/strings.xml"].contains(r#"<color name="accent">#ff0000</color>"#));

    let ids = read_zip(&out.path().join("id.zip"));
    assert_eq!(ids.len(), 1);
    assert!(ids["res/values/strings.xml"].contains(r#"<item name="placeholder" type="id"></item>"#));

    let attrs = read_zip(&out.path().join("attr.zip"));
    let attrs = &attrs["res/values/attrs.xml"];
    assert!(attrs.contains(r#"<enum name="circle" value="0"></enum>"#));
    assert!(attrs.contains(r#"<attr name="cornerRadius" format="dimension"></attr>"#));
    assert!(!attrs.contains("android:gravity"));

    let styleables = read_zip(&out.path().join("styleable.zip"));
    assert!(styleables["res/values/attrs.xml"].contains(r#"<declare-styleable name="ShapeView">"#));

    let layouts = read_zip(&out.path().join("layout.zip"));
    assert!(layouts["res/layout/activity_main.xml"].contains("@+id/root"));
    assert_eq!(read_zip(&out.path().join("drawable.zip"))["res/drawable/icon.png"], "not a real png\n");
    assert_eq!(read_zip(&out.path().join("raw.zip"))["res/raw/notes.txt"], "release notes\n");
}

#[test]
fn test_values_files_go_to_every_shard() {
    let out = TempDir::new().unwrap();
    let specs = vec![
        spec(&out, "string", "string-0.zip"),
        spec(&out, "string", "string-1.zip"),
        spec(&out, "string", "string-2.zip"),
    ];
    bucketize(&[fixture_res().join("values")], &specs).unwrap();

    let mut total = 0;
    for shard in ["string-0.zip", "string-1.zip", "string-2.zip"] {
        let entries = read_zip(&out.path().join(shard));
        let body = &entries["res/values/strings.xml"];
        assert!(body.starts_with("<?xml"));
        assert!(body.ends_with("</resources>"));
        total += body.matches("<string ").count();
    }
    assert_eq!(total, 2);
}

#[test]
fn test_unrequested_types_are_dropped() {
    let out = TempDir::new().unwrap();
    bucketize(&[fixture_res()], &[spec(&out, "raw", "raw.zip")]).unwrap();
    let raw = read_zip(&out.path().join("raw.zip"));
    assert_eq!(raw.keys().collect::<Vec<_>>(), vec!["res/raw/notes.txt"]);
}

#[test]
fn test_later_root_overrides_file_resources() {
    let overlay = TempDir::new().unwrap();
    let raw = overlay.path().join("res/raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join("notes.txt"), "overlay notes\n").unwrap();

    let out = TempDir::new().unwrap();
    bucketize(
        &[fixture_res(), overlay.path().join("res")],
        &[spec(&out, "raw", "raw.zip")],
    )
    .unwrap();
    let raw = read_zip(&out.path().join("raw.zip"));
    assert_eq!(raw.len(), 1);
    assert_eq!(raw["res/raw/notes.txt"], "overlay notes\n");
}

#[test]
fn test_malformed_values_file_fails() {
    let res = TempDir::new().unwrap();
    let values = res.path().join("res/values");
    fs::create_dir_all(&values).unwrap();
    fs::write(values.join("broken.xml"), "<resources><string name=\"a\">unclosed").unwrap();

    let out = TempDir::new().unwrap();
    let err = bucketize(&[res.path().join("res")], &[spec(&out, "string", "string.zip")]).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("archive: "), "{}", message);
    assert!(message.contains("broken.xml"), "{}", message);
}

#[test]
fn test_conflicting_values_fail() {
    let res = TempDir::new().unwrap();
    let values = res.path().join("res/values");
    fs::create_dir_all(&values).unwrap();
    fs::write(
        values.join("dupes.xml"),
        r#"<resources><string name="a">xy</string><string name="a">zw</string></resources>"#,
    )
    .unwrap();

    let out = TempDir::new().unwrap();
    let err = bucketize(&[res.path().join("res")], &[spec(&out, "string", "string.zip")]).unwrap_err();
    assert!(err.to_string().contains("got error collecting values"), "{}", err);
}

#[test]
fn test_partitions_by_type() {
    let out = TempDir::new().unwrap();
    let partitions = create_partitions(&[
        spec(&out, "layout", "nested/layout-0.zip"),
        spec(&out, "layout", "nested/layout-1.zip"),
    ])
    .unwrap();
    assert_eq!(partitions[&ResourceType::Layout].len(), 2);
    assert!(out.path().join("nested/layout-0.zip").exists());
}
