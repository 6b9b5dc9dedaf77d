//! Mini-parse integration tests
//!
//! These run the full liteparse pipeline over the fixture resource tree
//! and over in-memory file contents.

use respack::{parse_all, parse_all_contents, Context, Error, ResourceSet};
use std::path::PathBuf;

/// Get the path to the fixture res directory
fn fixture_res() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/res")
}

fn names(set: &ResourceSet) -> Vec<String> {
    set.resources.iter().map(|r| r.name.to_string()).collect()
}

#[test]
fn test_fixture_tree_declares_everything() {
    let set = parse_all(&Context::new(), &[fixture_res()], "com.example", 4).unwrap();
    assert_eq!(set.package, "com.example");

    let names = names(&set);
    for expected in [
        "res-auto:string/app_name",
        "res-auto:string/greeting",
        "res-auto:color/accent",
        "res-auto:id/placeholder",
        "res-auto:id/circle",
        "res-auto:id/square",
        "res-auto:attr/shape",
        "res-auto:attr/cornerRadius",
        "res-auto:styleable/ShapeView",
        "res-auto:layout/activity_main",
        "res-auto:id/root",
        "res-auto:id/title",
        "res-auto:drawable/icon",
        "res-auto:raw/notes",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {} in {:?}", expected, names);
    }

    // Platform attrs are referenced by the styleable, not declared.
    assert!(!names.iter().any(|n| n == "android:attr/gravity"));
}

#[test]
fn test_output_is_sorted() {
    let set = parse_all(&Context::new(), &[fixture_res()], "", 8).unwrap();
    let names = names(&set);
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_output_does_not_depend_on_worker_count() {
    let one = parse_all(&Context::new(), &[fixture_res()], "", 1).unwrap();
    let many = parse_all(&Context::new(), &[fixture_res()], "", 16).unwrap();
    assert_eq!(one, many);
}

#[test]
fn test_styleable_lists_its_attrs() {
    let set = parse_all(&Context::new(), &[fixture_res().join("values/attrs.xml")], "", 2).unwrap();
    let styleable = set
        .resources
        .iter()
        .find(|r| r.name.to_string() == "res-auto:styleable/ShapeView")
        .expect("styleable declared");
    assert_eq!(
        styleable.styleable_attrs.as_deref(),
        Some(
            &[
                "res-auto:attr/shape".to_string(),
                "android:attr/gravity".to_string(),
                "res-auto:attr/cornerRadius".to_string(),
            ][..]
        )
    );
}

#[test]
fn test_json_output_shape() {
    let set = parse_all(&Context::new(), &[fixture_res().join("drawable")], "com.example", 2).unwrap();
    let json: serde_json::Value = serde_json::to_value(&set).unwrap();
    assert_eq!(json["package"], "com.example");
    assert_eq!(json["resources"][0]["package"], "res-auto");
    assert_eq!(json["resources"][0]["type"], "drawable");
    assert_eq!(json["resources"][0]["name"], "icon");
    assert!(json["resources"][0].get("styleable_attrs").is_none());
}

#[test]
fn test_in_memory_contents() {
    let files = vec![
        PathBuf::from("/src/res/values/values.xml"),
        PathBuf::from("/src/res/layout/list.xml"),
        PathBuf::from("/src/res/values/.hidden"),
    ];
    let contents = vec![
        b"<resources><dimen name='gap'>4dp</dimen></resources>".to_vec(),
        br#"<ListView xmlns:android="http://schemas.android.com/apk/res/android" android:id="@+id/list"/>"#.to_vec(),
        b"ignored".to_vec(),
    ];
    let set = parse_all_contents(&Context::new(), &files, contents, "com.example", 2).unwrap();
    assert_eq!(
        names(&set),
        vec!["res-auto:dimen/gap", "res-auto:id/list", "res-auto:layout/list"]
    );
}

#[test]
fn test_mismatched_contents() {
    let err = parse_all_contents(
        &Context::new(),
        &[PathBuf::from("/src/res/values/values.xml")],
        vec![],
        "",
        2,
    )
    .unwrap_err();
    assert!(matches!(err, Error::ContentsMismatch { paths: 1, contents: 0 }));
}

#[test]
fn test_malformed_file_fails_the_run() {
    let files = vec![
        PathBuf::from("/src/res/values/good.xml"),
        PathBuf::from("/src/res/values/bad.xml"),
    ];
    let contents = vec![
        b"<resources><bool name='ok'>true</bool></resources>".to_vec(),
        b"<resources><string>no name</string></resources>".to_vec(),
    ];
    let err = parse_all_contents(&Context::new(), &files, contents, "", 2).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("/src/res/values/bad.xml"), "{}", message);
    assert!(message.contains("mini-values-parse"), "{}", message);
}

#[test]
fn test_missing_root_fails() {
    let err = parse_all(&Context::new(), &[fixture_res().join("does-not-exist")], "", 2);
    assert!(err.is_err());
}
