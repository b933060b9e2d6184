use codespan_reporting::diagnostic::Severity;

use reservations::target::{Category, DEFAULT_TOPIC_ID, parse_listing};

const LISTING: &str = "\
jmt10cd;JMT 10 C-D kerhohuone;JMT 10 C-D club room
jmt5mekaniikka;JMT 5 mekaniikkapaja;JMT 5 mechanics workshop

tt4soitto;TT4 soittohuone;TT4 music room
jmt10cd;Toinen;Duplicate
rantavarasto;Rantavarasto;Shore storage
puuttuva;Vain suomeksi
kontti;Kontti;Container
";

#[test]
fn parses_targets_in_file_order() {
    let listing = parse_listing(LISTING, 0);
    let prefixes: Vec<&str> = listing
        .targets
        .iter()
        .map(|t| t.email_prefix.as_str())
        .collect();
    assert_eq!(
        prefixes,
        vec!["jmt10cd", "jmt5mekaniikka", "tt4soitto", "rantavarasto", "kontti"]
    );
    let orders: Vec<u32> = listing.targets.iter().map(|t| t.sort_order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
}

#[test]
fn seeded_targets_are_active_with_default_topic() {
    let listing = parse_listing(LISTING, 0);
    for target in &listing.targets {
        assert!(target.active);
        assert_eq!(target.telegram_topic_id.as_deref(), Some(DEFAULT_TOPIC_ID));
    }
}

#[test]
fn categories_follow_prefix() {
    let listing = parse_listing(LISTING, 0);
    let category = |prefix: &str| listing.find(prefix).map(|t| t.category);
    assert_eq!(category("jmt10cd"), Some(Category::ClubRoom));
    assert_eq!(category("jmt5mekaniikka"), Some(Category::Workshop));
    assert_eq!(category("tt4soitto"), Some(Category::MusicRoom));
    assert_eq!(category("rantavarasto"), Some(Category::Storage));
    assert_eq!(category("kontti"), Some(Category::Equipment));
    assert_eq!(Category::from_prefix("puupaja"), Category::Workshop);
}

#[test]
fn first_occurrence_of_a_prefix_wins() {
    let listing = parse_listing(LISTING, 0);
    let target = listing.find("jmt10cd").unwrap();
    assert_eq!(target.label_fi, "JMT 10 C-D kerhohuone");
}

#[test]
fn bad_lines_become_warnings_with_spans() {
    let listing = parse_listing(LISTING, 3);
    assert_eq!(listing.diagnostics.len(), 2);

    let duplicate = &listing.diagnostics[0];
    assert_eq!(duplicate.severity, Severity::Warning);
    assert_eq!(duplicate.file_id, 3);
    assert!(duplicate.message.contains("jmt10cd"));
    assert_eq!(&LISTING[duplicate.span.clone()], "jmt10cd;Toinen;Duplicate");

    let incomplete = &listing.diagnostics[1];
    assert_eq!(&LISTING[incomplete.span.clone()], "puuttuva;Vain suomeksi");
    assert!(!incomplete.notes.is_empty());

    let diagnostic = incomplete.to_diagnostic();
    assert_eq!(diagnostic.labels.len(), 1);
    assert_eq!(diagnostic.labels[0].file_id, 3);
}

#[test]
fn empty_fields_are_skipped() {
    let listing = parse_listing("a;;English\n;Suomi;English\n", 0);
    assert!(listing.targets.is_empty());
    assert_eq!(listing.diagnostics.len(), 2);
}

#[test]
fn fields_are_trimmed_and_crlf_tolerated() {
    let listing = parse_listing(" sauna ; Sauna ; Sauna room \r\n", 0);
    assert_eq!(listing.targets.len(), 1);
    let target = &listing.targets[0];
    assert_eq!(target.email_prefix, "sauna");
    assert_eq!(target.label_fi, "Sauna");
    assert_eq!(target.label_en, "Sauna room");
}

#[test]
fn empty_listing() {
    let listing = parse_listing("\n\n", 0);
    assert!(listing.targets.is_empty());
    assert!(listing.diagnostics.is_empty());
}

#[test]
fn serializes_in_store_shape() {
    let listing = parse_listing("tt4soitto;Soittohuone;Music room\n", 0);
    let value = serde_json::to_value(&listing.targets[0]).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "emailPrefix": "tt4soitto",
            "labelFi": "Soittohuone",
            "labelEn": "Music room",
            "category": "music-room",
            "active": true,
            "sortOrder": 1,
            "telegramTopicId": "1"
        })
    );
}
