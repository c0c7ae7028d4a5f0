use versenote_core::{inherit, NoteAttributes};

fn attributes(tags: &[&str], kv: &[(&str, &str)], verses: &[&str], notes: &[&str]) -> NoteAttributes {
    NoteAttributes {
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        kv_tags: kv
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        referenced_verses: verses.iter().map(|verse| verse.to_string()).collect(),
        referenced_notes: notes.iter().map(|note| note.to_string()).collect(),
        ..NoteAttributes::default()
    }
}

#[test]
fn parent_kv_value_wins_over_child() {
    let mut parent = attributes(&[], &[("k", "p")], &[], &[]);
    let child = attributes(&[], &[("k", "c"), ("other", "c")], &[], &[]);

    inherit(&mut parent, "child", &child);

    assert_eq!(parent.kv_tags.get("k").map(String::as_str), Some("p"));
    assert_eq!(parent.kv_tags.get("other").map(String::as_str), Some("c"));
}

#[test]
fn first_child_wins_contested_key() {
    let mut parent = NoteAttributes::default();
    inherit(&mut parent, "first", &attributes(&[], &[("k", "first")], &[], &[]));
    inherit(&mut parent, "second", &attributes(&[], &[("k", "second")], &[], &[]));

    assert_eq!(parent.kv_tags.get("k").map(String::as_str), Some("first"));
}

#[test]
fn sets_are_unioned_and_child_is_linked() {
    let mut parent = attributes(&["own"], &[], &["asv/John/1/1"], &["older"]);
    let child = attributes(&["own", "child"], &[], &["asv/John/1/2"], &["grandchild"]);

    inherit(&mut parent, "child-id", &child);

    assert_eq!(parent.tags.len(), 2);
    assert_eq!(parent.referenced_verses.len(), 2);
    for id in ["older", "grandchild", "child-id"] {
        assert!(parent.referenced_notes.contains(id), "missing {id}");
    }
}

#[test]
fn child_is_left_untouched() {
    let mut parent = attributes(&["p"], &[("k", "p")], &[], &[]);
    let child = attributes(&["c"], &[("k", "c")], &[], &[]);
    let before = child.clone();

    inherit(&mut parent, "child", &child);

    assert_eq!(child, before);
}
