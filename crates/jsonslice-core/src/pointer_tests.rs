use crate::{Document, Kind, PathError, Scalar};

const SAMPLE: &str = r#"{"a":[1,2,{"b":null}],"c":"x","d/e":{"~":true},"":0}"#;

fn doc() -> Document {
    Document::parse(SAMPLE).unwrap()
}

#[test]
fn empty_path_is_root() {
    let doc = doc();
    assert_eq!(doc.resolve("").unwrap().id(), doc.root().id());
}

#[test]
fn resolves_nested_null_leaf() {
    let doc = doc();
    let leaf = doc.resolve("/a/2/b").unwrap();

    assert_eq!(leaf.kind().unwrap(), Kind::Null);
    assert_eq!(leaf.id().as_u32(), 9);
}

#[test]
fn resolve_matches_child_iteration() {
    let doc = doc();
    let via_children = doc
        .root()
        .get("a")
        .unwrap()
        .unwrap()
        .at(2)
        .unwrap()
        .unwrap();

    assert_eq!(doc.resolve("/a/2").unwrap().id(), via_children.id());
}

#[test]
fn escapes() {
    let doc = doc();
    let node = doc.resolve("/d~1e/~0").unwrap();
    assert_eq!(node.scalar().unwrap(), Scalar::Bool(true));

    let node = doc.resolve("/").unwrap();
    assert_eq!(node.scalar().unwrap(), Scalar::UInt(0));
}

#[test]
fn missing_key() {
    let err = doc().resolve("/a/2/zz").unwrap_err();
    insta::assert_snapshot!(err, @"path `/a/2/zz`: `zz` not found");
}

#[test]
fn index_out_of_range() {
    let err = doc().resolve("/a/3").unwrap_err();
    assert!(matches!(err, PathError::NotFound { segment, .. } if segment == "3"));
}

#[test]
fn field_into_array_is_a_mismatch() {
    let err = doc().resolve("/a/b").unwrap_err();
    insta::assert_snapshot!(err, @"path `/a/b`: cannot address `b` in array");
}

#[test]
fn index_into_scalar_is_a_mismatch() {
    let err = doc().resolve("/c/0").unwrap_err();
    assert!(matches!(
        err,
        PathError::TypeMismatch {
            found: Kind::String,
            ..
        }
    ));
}

#[test]
fn leading_zero_index_is_not_an_index() {
    let err = doc().resolve("/a/01").unwrap_err();
    assert!(matches!(err, PathError::TypeMismatch { .. }));
}

#[test]
fn huge_index_is_not_found() {
    let err = doc().resolve("/a/99999999999999999999999").unwrap_err();
    assert!(matches!(err, PathError::NotFound { .. }));
}

#[test]
fn missing_leading_slash() {
    let err = doc().resolve("a").unwrap_err();
    insta::assert_snapshot!(err, @"path `a` is malformed: must be empty or start with `/`");
}

#[test]
fn bad_escape() {
    let err = doc().resolve("/d~2e").unwrap_err();
    assert!(matches!(err, PathError::Malformed { .. }));

    let err = doc().resolve("/x~").unwrap_err();
    assert!(matches!(err, PathError::Malformed { .. }));
}

#[test]
fn resolves_relative_to_a_node() {
    let doc = doc();
    let a = doc.resolve("/a").unwrap();

    assert_eq!(a.resolve("/2/b").unwrap().id(), doc.resolve("/a/2/b").unwrap().id());
    assert_eq!(a.resolve("").unwrap().id(), a.id());
}
