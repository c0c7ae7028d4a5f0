use versenote_core::markup::grammar::{child_ids, self_id, tags, theme, title, verse_refs};
use versenote_core::TagSet;
use versenote_core::markup::extractor::extract_attributes;

#[test]
fn tags_block_splits_plain_and_key_value_tags() {
    let parsed = tags("@tags\nfaith\nkey: value\n@");
    assert_eq!(parsed.tags.len(), 1);
    assert!(parsed.tags.contains("faith"));
    assert_eq!(parsed.kv_tags.len(), 1);
    assert_eq!(parsed.kv_tags.get("key").map(String::as_str), Some("value"));
}

#[test]
fn theme_block_keeps_inner_lines() {
    assert_eq!(
        theme("@theme\nline one\nline two\n@").as_deref(),
        Some("line one\nline two")
    );
}

#[test]
fn duplicate_plain_tags_collapse_and_last_kv_wins() {
    let parsed = tags("@tags\nhope\nhope\nbook: Mark\nbook: John\nempty:\n@");
    assert_eq!(
        parsed.tags.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["empty", "hope"]
    );
    assert_eq!(parsed.kv_tags.get("book").map(String::as_str), Some("John"));
}

#[test]
fn unterminated_blocks_yield_absent_values() {
    let text = "@theme\nnever closed\n\n@tags\nfaith\n";
    assert_eq!(theme(text), None);
    assert!(tags(text).tags.is_empty());

    let attributes = extract_attributes(text, 0);
    assert_eq!(attributes.theme, None);
    assert!(attributes.tags.is_empty());

    let open_theme = "@theme\nnever closed\n\n@tags\nfaith\n@";
    assert_eq!(theme(open_theme), None);
    assert!(tags(open_theme).tags.contains("faith"));

    let open_tags = "@tags\nfaith\n\n@theme\nsummary\n@";
    assert_eq!(tags(open_tags), TagSet::default());
    assert_eq!(theme(open_tags).as_deref(), Some("summary"));
}

#[test]
fn tag_lines_split_on_colon_within_block() {
    let parsed = tags("@tags\n: orphan\nk:\n@");
    assert_eq!(
        parsed.tags.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["k"]
    );
    assert!(parsed.kv_tags.is_empty());
}

#[test]
fn empty_theme_block_is_absent() {
    assert_eq!(theme("@theme\n   \n@"), None);
    assert_eq!(theme("@theme\n@"), None);
}

#[test]
fn verse_references_are_found_inline() {
    let refs = verse_refs("Compare @asv/John/1/1@ with @/kjv/Gen/1/1@ and @asv/John/1/1@.");
    assert_eq!(
        refs.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["asv/John/1/1", "kjv/Gen/1/1"]
    );
}

#[test]
fn id_markers_are_not_verse_references() {
    let text = "@_idabc123@\n@__iddef456@\n@theme\nx\n@";
    assert!(verse_refs(text).is_empty());
    assert_eq!(self_id(text).as_deref(), Some("abc123"));
    assert_eq!(child_ids(text), vec!["def456".to_string()]);
}

#[test]
fn id_markers_must_fill_the_whole_line() {
    assert_eq!(self_id("see @_idabc@ inline"), None);
    assert!(child_ids("prefix @__idabc@").is_empty());
}

#[test]
fn child_ids_keep_document_order_without_duplicates() {
    let text = "@__idb@\n@__ida@\n@__idb@";
    assert_eq!(child_ids(text), vec!["b".to_string(), "a".to_string()]);
}

#[test]
fn title_uses_exact_header_depth() {
    let own = "## @ Second Level\nbody";
    assert_eq!(title(own, 2).as_deref(), Some("Second Level"));
    assert_eq!(title(own, 1), None);
    assert_eq!(title(own, 3), None);
    assert_eq!(title(own, 0), None);
}

#[test]
fn root_never_has_a_title() {
    let attributes = extract_attributes("# @ Looks Like A Header\n@theme\nx\n@", 0);
    assert_eq!(attributes.title, None);
    assert_eq!(attributes.theme.as_deref(), Some("x"));
}
