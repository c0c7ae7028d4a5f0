use versenote_core::db::open_db_in_memory;
use versenote_core::{
    import_cross_references, import_translation, verse_id, SqliteVerseRepository,
    VerseImportError, VerseRecord, VerseRepository,
};

const KEYS: &str = r#"{"resultset":{"keys":[
    {"b":19,"n":"Psalms","t":"OT","g":3},
    {"b":43,"n":"John","t":"NT","g":5}
]}}"#;

const ROWS: &str = r#"{"resultset":{"row":[
    {"field":[19023001,19,23,1,"Jehovah is my shepherd; I shall not want."]},
    {"field":[43001001,43,1,1,"In the beginning was the Word"]},
    {"field":[43001002,43,1,2,"The same was in the beginning with God."]}
]}}"#;

#[test]
fn insert_and_lookup_verses() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteVerseRepository::try_new(&mut conn).unwrap();
    let verse = VerseRecord {
        translation: "kjv".to_string(),
        book: "John".to_string(),
        chapter: 11,
        verse: 35,
        text: "Jesus wept.".to_string(),
    };

    assert_eq!(repo.insert_verses(&[verse.clone()]).unwrap(), 1);

    assert!(repo.verse_exists("kjv/John/11/35").unwrap());
    assert!(!repo.verse_exists("kjv/John/11/36").unwrap());
    assert_eq!(repo.get_verse(&verse.id()).unwrap(), Some(verse));
    assert_eq!(repo.get_verse("asv/John/11/35").unwrap(), None);
}

#[test]
fn reinsert_replaces_text() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteVerseRepository::try_new(&mut conn).unwrap();
    let mut verse = VerseRecord {
        translation: "asv".to_string(),
        book: "John".to_string(),
        chapter: 1,
        verse: 1,
        text: "old".to_string(),
    };
    repo.insert_verses(&[verse.clone()]).unwrap();
    verse.text = "new".to_string();
    repo.insert_verses(&[verse]).unwrap();

    let stored = repo.get_verse("asv/John/1/1").unwrap().unwrap();
    assert_eq!(stored.text, "new");
    assert_eq!(repo.count_verses("asv").unwrap(), 1);
}

#[test]
fn import_stores_every_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteVerseRepository::try_new(&mut conn).unwrap();

    let written = import_translation(&mut repo, "asv", KEYS, ROWS).unwrap();

    assert_eq!(written, 3);
    assert_eq!(repo.count_verses("asv").unwrap(), 3);
    assert_eq!(repo.count_verses("kjv").unwrap(), 0);
    let psalm = repo
        .get_verse(&verse_id("asv", "Psalms", 23, 1))
        .unwrap()
        .unwrap();
    assert!(psalm.text.starts_with("Jehovah is my shepherd"));
}

#[test]
fn malformed_import_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteVerseRepository::try_new(&mut conn).unwrap();
    let rows = r#"{"resultset":{"row":[
        {"field":[43001001,43,1,1,"In the beginning was the Word"]},
        {"field":[66001001,66,1,1,"The Revelation of Jesus Christ"]}
    ]}}"#;

    let err = import_translation(&mut repo, "asv", KEYS, rows).unwrap_err();
    assert!(matches!(err, VerseImportError::UnknownBook(66)));

    let err = import_translation(&mut repo, "asv", KEYS, "{not json").unwrap_err();
    assert!(matches!(err, VerseImportError::Json(_)));

    assert_eq!(repo.count_verses("asv").unwrap(), 0);
}

const CROSS_REFS: &str = r#"{
    "1": {"v": "JOH 1 1", "r": {"1": "JOH 1 2", "2": "PSA 23 1", "3": "GEN 1 1"}},
    "2": {"v": "PSA 23 1"}
}"#;

#[test]
fn cross_references_resolve_in_reading_translation() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteVerseRepository::try_new(&mut conn).unwrap();
    import_translation(&mut repo, "asv", KEYS, ROWS).unwrap();

    assert_eq!(import_cross_references(&mut repo, CROSS_REFS).unwrap(), 2);

    let references = repo.cross_references("asv/John/1/1").unwrap();
    let ids: Vec<String> = references.iter().map(VerseRecord::id).collect();
    assert_eq!(ids, vec!["asv/John/1/2", "asv/Psalms/23/1"]);
    assert!(references[1].text.starts_with("Jehovah is my shepherd"));

    assert!(repo.cross_references("kjv/John/1/1").unwrap().is_empty());
    assert!(repo.cross_references("asv/Psalms/23/1").unwrap().is_empty());
    assert!(repo.cross_references("nonsense").unwrap().is_empty());
}

#[test]
fn reimporting_cross_references_keeps_one_copy() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteVerseRepository::try_new(&mut conn).unwrap();
    import_translation(&mut repo, "asv", KEYS, ROWS).unwrap();
    import_cross_references(&mut repo, CROSS_REFS).unwrap();
    import_cross_references(&mut repo, CROSS_REFS).unwrap();

    assert_eq!(repo.cross_references("asv/John/1/1").unwrap().len(), 2);
}

#[test]
fn unknown_abbreviation_rejects_cross_reference_file() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteVerseRepository::try_new(&mut conn).unwrap();
    import_translation(&mut repo, "asv", KEYS, ROWS).unwrap();
    let json = r#"{"1": {"v": "JOH 1 1", "r": {"1": "JOH 1 2"}}, "2": {"v": "QQQ 1 1"}}"#;

    let err = import_cross_references(&mut repo, json).unwrap_err();

    assert!(matches!(err, VerseImportError::UnknownBookAbbreviation(_)));
    assert!(repo.cross_references("asv/John/1/1").unwrap().is_empty());
}
