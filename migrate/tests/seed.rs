use std::fs;

use serde_json::{Value, json};

use migrate::config::MigrationConfig;
use migrate::seed::{TARGETS_COLLECTION, legacy_pages, seed_pages, seed_targets};
use migrate::store::{CreateRequest, LocalStore, RecordSource, RecordStore};
use reservations::parse_listing;

fn old_site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("saannot.txt"),
        "Yleistä\n\n1. Siivoa jälkesi.\n2. Sammuta valot.",
    )
    .unwrap();
    fs::write(dir.path().join("rules.txt"), "General\n\n1. Clean up.").unwrap();
    fs::write(dir.path().join("avaimellisille.txt"), "Avaimet palautetaan.").unwrap();
    dir
}

#[test]
fn legacy_pages_read_the_old_site() {
    let site = old_site();
    let pages = legacy_pages(site.path(), &site.path().join("content"));

    let slugs: Vec<&str> = pages.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(
        slugs,
        vec!["saannot", "avaimellisille", "tilat", "kayttopyynto", "kalenteri"]
    );
    assert_eq!(pages[1].en.title, "For Key Holders");
    // no translation file: the Finnish text is used
    assert_eq!(pages[1].en.text, "Avaimet palautetaan.");
    // tilat.txt is missing
    assert!(pages[2].fi.text.is_empty());
    assert_eq!(pages[2].fi.layout().unwrap(), json!([]));
}

#[test]
fn translation_file_is_preferred() {
    let site = old_site();
    let content = site.path().join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(content.join("avaimellisille_en.txt"), "Keys are returned.").unwrap();

    let pages = legacy_pages(site.path(), &content);
    assert_eq!(pages[1].en.text, "Keys are returned.");
}

#[test]
fn text_becomes_a_content_block() {
    let site = old_site();
    let pages = legacy_pages(site.path(), &site.path().join("content"));
    let layout = pages[0].fi.layout().unwrap();

    assert_eq!(layout[0]["blockType"], "content");
    assert_eq!(layout[0]["columns"][0]["size"], "full");
    let root = &layout[0]["columns"][0]["richText"]["root"];
    assert_eq!(root["type"], "root");
    assert_eq!(root["children"][0]["type"], "heading");
    assert_eq!(root["children"][0]["children"][0]["text"], "Yleistä");
    assert_eq!(root["children"][1]["type"], "list");
    assert_eq!(root["children"][1]["children"].as_array().unwrap().len(), 2);
}

#[test]
fn form_pages_carry_their_block() {
    let site = old_site();
    let pages = legacy_pages(site.path(), &site.path().join("content"));
    assert_eq!(
        pages[3].en.layout().unwrap(),
        json!([{
            "blockType": "accessRequestForm",
            "language": "en",
            "rulesPageLink": "/saannot",
            "calendarLink": "/kalenteri"
        }])
    );
    assert_eq!(pages[4].fi.layout().unwrap()[0]["height"], 600);
}

#[test]
fn seeds_pages_once() {
    let site = old_site();
    let pages = legacy_pages(site.path(), &site.path().join("content"));
    let config = MigrationConfig::default();
    let mut store = LocalStore::in_memory();

    let created = seed_pages(&mut store, &pages, &config).unwrap();
    assert_eq!(created.len(), 5);
    let again = seed_pages(&mut store, &pages, &config).unwrap();
    assert!(again.is_empty());
    assert_eq!(store.count("pages"), 5);

    let fi: Vec<Value> = store.find("pages", Some("fi"), 10).unwrap();
    let en: Vec<Value> = store.find("pages", Some("en"), 10).unwrap();
    assert_eq!(fi[0]["title"], "Säännöt");
    assert_eq!(fi[0]["_status"], "published");
    assert_eq!(en[0]["title"], "Rules");
    assert_eq!(en[3]["layout"][0]["language"], "en");
}

#[test]
fn existing_slug_is_skipped() {
    let site = old_site();
    let pages = legacy_pages(site.path(), &site.path().join("content"));
    let mut store = LocalStore::in_memory();
    let mut data = serde_json::Map::new();
    data.insert("slug".to_string(), json!("tilat"));
    store.create("pages", CreateRequest::new(data)).unwrap();

    let created = seed_pages(&mut store, &pages, &MigrationConfig::default()).unwrap();
    assert!(!created.contains(&"tilat".to_string()));
    assert_eq!(created.len(), 4);
}

#[test]
fn targets_replace_existing_ones() {
    let mut store = LocalStore::in_memory();
    store
        .create(TARGETS_COLLECTION, CreateRequest::new(serde_json::Map::new()))
        .unwrap();

    let listing = parse_listing("jmt10cd;Kerhohuone;Club room\nkontti;Kontti;Container\n", 0);
    assert_eq!(seed_targets(&mut store, &listing).unwrap(), 2);
    assert_eq!(store.count(TARGETS_COLLECTION), 2);

    let docs = store.find(TARGETS_COLLECTION, None, 10).unwrap();
    assert_eq!(docs[1]["emailPrefix"], "kontti");
    assert_eq!(docs[1]["category"], "equipment");
    assert_eq!(docs[1]["sortOrder"], 2);
}
