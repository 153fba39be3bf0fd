use crate::tape::{self, TAG_ARRAY_END, TAG_ARRAY_START, TAG_NULL};
use crate::{ChildSlot, Document, DocumentError, Kind, NodeId, Scalar};

fn corrupt_array() -> Document {
    // [null, <tag '?'>]
    Document::from_raw_parts(
        vec![
            tape::container_word(TAG_ARRAY_START, 3, 2),
            tape::word(TAG_NULL, 0),
            tape::word(b'?', 0),
            tape::word(TAG_ARRAY_END, 0),
        ],
        Vec::new(),
    )
}

#[test]
fn kind_and_size() {
    let doc = Document::parse(r#"{"a":[1,2,{"b":null}],"c":"x"}"#).unwrap();
    let root = doc.root();

    assert_eq!(root.kind().unwrap(), Kind::Object);
    assert_eq!(root.size().unwrap(), 2);
    assert_eq!(root.get("c").unwrap().unwrap().kind().unwrap(), Kind::String);
    assert!(root.get("zzz").unwrap().is_none());
}

#[test]
fn cursor_walks_children_without_borrowing() {
    let doc = Document::parse(r#"{"k":1,"m":[true]}"#).unwrap();

    let mut cursor = doc.cursor(NodeId::ROOT).unwrap().unwrap();
    let (slot, first) = doc.next_child(&mut cursor).unwrap().unwrap();
    let ChildSlot::Key(key) = slot else {
        panic!("object children carry keys");
    };
    assert_eq!(doc.key(key).unwrap(), "k");
    assert_eq!(doc.node(first).scalar().unwrap(), Scalar::UInt(1));
    assert_eq!(cursor.position(), 1);

    let (_, second) = doc.next_child(&mut cursor).unwrap().unwrap();
    let mut inner = doc.cursor(second).unwrap().unwrap();
    let (slot, _) = doc.next_child(&mut inner).unwrap().unwrap();
    assert_eq!(slot, ChildSlot::Index(0));

    assert!(doc.next_child(&mut cursor).unwrap().is_none());
    assert!(cursor.is_exhausted());
}

#[test]
fn scalars_have_no_cursor() {
    let doc = Document::parse("42").unwrap();
    assert_eq!(doc.cursor(NodeId::ROOT).unwrap(), None);
}

#[test]
fn unrecognized_tag_surfaces_on_access() {
    let doc = corrupt_array();
    let root = doc.root();
    assert_eq!(root.kind().unwrap(), Kind::Array);

    let results: Vec<_> = root.children().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(
        *err,
        DocumentError::UnrecognizedNodeKind { tag: b'?', index: 2 }
    );
    insta::assert_snapshot!(err, @"unrecognized node kind 0x3f at tape index 2");
}

#[test]
fn out_of_bounds_end_index() {
    let doc = Document::from_raw_parts(vec![tape::container_word(TAG_ARRAY_START, 9, 0)], Vec::new());
    let err = doc.root().children().next().unwrap().unwrap_err();
    assert_eq!(err, DocumentError::OutOfBounds { index: 9 });
}

#[test]
fn corrupt_string_offset() {
    let doc = Document::from_raw_parts(vec![tape::word(tape::TAG_STRING, 100)], vec![0; 4]);
    let err = doc.root().scalar().unwrap_err();
    assert_eq!(err, DocumentError::CorruptString { offset: 100 });
}

#[test]
fn containers_are_not_scalars() {
    let doc = Document::parse("[]").unwrap();
    let err = doc.root().scalar().unwrap_err();
    assert_eq!(
        err,
        DocumentError::NotScalar {
            index: 0,
            found: Kind::Array
        }
    );
}

#[test]
fn node_serializes_its_subtree() {
    let doc = Document::parse(r#"{"a":[1,-2.5,{"b":null}],"c":"x"}"#).unwrap();

    let a = doc.resolve("/a").unwrap();
    insta::assert_snapshot!(serde_json::to_string(&a).unwrap(), @r#"[1,-2.5,{"b":null}]"#);
    insta::assert_snapshot!(serde_json::to_string(&doc.root()).unwrap(), @r#"{"a":[1,-2.5,{"b":null}],"c":"x"}"#);
}

#[test]
fn corrupt_subtree_fails_serialization() {
    let doc = corrupt_array();
    let err = serde_json::to_string(&doc.root()).unwrap_err();
    assert!(err.to_string().contains("unrecognized node kind"));
}

#[test]
fn debug_is_compact() {
    let doc = Document::parse("[1]").unwrap();
    insta::assert_snapshot!(format!("{doc:?}"), @"Document { input_len: 3, tape_len: 4, strings_len: 0 }");
    insta::assert_snapshot!(format!("{:?}", doc.root()), @"Node { id: NodeId(0), kind: Array }");
}
