use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use migrate::config::MigrationConfig;
use migrate::error::ConfigError;
use migrate::export::ExportFile;
use migrate::import::{ImportReport, Importer, find_source_file};
use migrate::store::{LocalStore, RecordSource};

fn export() -> ExportFile {
    ExportFile::from_value(json!({
        "pages": {
            "fi": [
                {
                    "id": 7,
                    "title": "Etusivu",
                    "slug": "etusivu",
                    "createdAt": "2024-01-01T00:00:00.000Z",
                    "layout": [{"id": "b1", "blockType": "mediaBlock", "media": 5}],
                    "hero": {"links": [{"link": {"reference": {"relationTo": "pages", "value": 7}}}]}
                }
            ],
            "en": [
                {
                    "id": 7,
                    "title": "Home",
                    "slug": "etusivu",
                    "layout": [{"id": "b1", "blockType": "mediaBlock", "media": 5}],
                    "hero": {"links": [{"link": {"reference": {"relationTo": "pages", "value": 7}}}]}
                },
                {"id": 99, "title": "Orphan"}
            ]
        },
        "media": [
            {
                "id": 5,
                "filename": "sauna.jpg",
                "alt": "Sauna",
                "mimeType": "image/jpeg",
                "sizes": {"thumbnail": {"url": "/x"}}
            },
            {"id": 6, "filename": "missing.jpg", "alt": "Gone"}
        ],
        "posts": [{"id": 1}]
    }))
    .unwrap()
}

fn media_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("public/Tilakuvat");
    fs::create_dir_all(&images).unwrap();
    fs::write(images.join("sauna.jpg"), b"jpg").unwrap();
    dir
}

fn run(store: &mut LocalStore, config: &MigrationConfig, root: &Path, file: &ExportFile) -> ImportReport {
    let mut importer = Importer::new(store, config).unwrap().with_media_root(root);
    importer.run(file)
}

#[test]
fn imports_in_dependency_order() {
    let root = media_root();
    let config = MigrationConfig::default();
    let mut store = LocalStore::in_memory();
    let report = run(&mut store, &config, root.path(), &export());

    let media = report.collection("media").unwrap();
    assert_eq!((media.imported, media.skipped, media.failed), (1, 1, 0));
    let pages = report.collection("pages").unwrap();
    assert_eq!(
        (pages.imported, pages.updated, pages.skipped, pages.failed),
        (1, 1, 1, 0)
    );
    assert!(report.collection("posts").is_none());
    assert_eq!(report.total_failed(), 0);
}

#[test]
fn uploads_keep_descriptive_fields_only() {
    let root = media_root();
    let config = MigrationConfig::default();
    let mut store = LocalStore::in_memory();
    run(&mut store, &config, root.path(), &export());

    let media = store.find("media", None, 10).unwrap();
    assert_eq!(media.len(), 1);
    assert_eq!(
        media[0],
        json!({
            "id": 1,
            "alt": "Sauna",
            "filename": "sauna.jpg",
            "mimeType": "image/jpeg",
            "filesize": 3
        })
    );
}

#[test]
fn references_point_at_new_records() {
    let root = media_root();
    let config = MigrationConfig::default();
    let mut store = LocalStore::in_memory();
    run(&mut store, &config, root.path(), &export());

    let fi = &store.find("pages", Some("fi"), 10).unwrap()[0];
    assert_eq!(fi["title"], "Etusivu");
    assert_eq!(fi["layout"], json!([{"blockType": "mediaBlock", "media": 1}]));
    assert!(fi.get("createdAt").is_none());
    // the page was not registered yet while its own primary copy was remapped
    assert_eq!(fi["hero"]["links"][0]["link"]["reference"]["value"], 7);

    let en = &store.find("pages", Some("en"), 10).unwrap()[0];
    assert_eq!(en["title"], "Home");
    assert_eq!(en["hero"]["links"][0]["link"]["reference"]["value"], 1);
}

#[test]
fn mapping_holds_created_records() {
    let root = media_root();
    let config = MigrationConfig::default();
    let mut store = LocalStore::in_memory();
    let mut importer = Importer::new(&mut store, &config)
        .unwrap()
        .with_media_root(root.path());
    importer.run(&export());

    let mapping = importer.mapping();
    assert_eq!(mapping.len(), 2);
    assert_eq!(
        mapping.resolve("media", &json!(5)).map(|id| id.to_string()),
        Some("1".to_string())
    );
    assert!(mapping.resolve("media", &json!(6)).is_none());
    assert!(mapping.resolve("pages", &json!("7")).is_some());
}

#[test]
fn failed_record_does_not_stop_the_batch() {
    let config = MigrationConfig::from_toml_str("[collections]\nplain = [\"notes\"]\n").unwrap();
    let file = ExportFile::from_value(json!({
        "notes": [5, {"id": 1, "text": "ok"}, {"id": 2, "text": "also ok"}]
    }))
    .unwrap();
    let mut store = LocalStore::in_memory();
    let report = run(&mut store, &config, Path::new("."), &file);

    let notes = report.collection("notes").unwrap();
    assert_eq!((notes.imported, notes.failed), (2, 1));
    assert_eq!(store.count("notes"), 2);
    assert_eq!(report.to_string(), "notes: 2 imported, 0 updated, 0 skipped, 1 failed\n");
}

#[test]
fn uploaded_files_are_written_on_save() {
    let root = media_root();
    let out = tempfile::tempdir().unwrap();
    let store_path = out.path().join("store.json");
    let config = MigrationConfig::default();

    let mut store = LocalStore::open(&store_path).unwrap();
    run(&mut store, &config, root.path(), &export());
    store.save().unwrap();

    assert_eq!(fs::read(out.path().join("uploads/sauna.jpg")).unwrap(), b"jpg");
    let reopened = LocalStore::open(&store_path).unwrap();
    assert_eq!(reopened.count("pages"), 1);
    assert_eq!(reopened.count("media"), 1);
}

#[test]
fn sources_are_searched_in_order() {
    let root = media_root();
    fs::write(root.path().join("public/sauna.jpg"), b"other").unwrap();
    fs::write(root.path().join("public/logo.png"), b"png").unwrap();
    let sources = MigrationConfig::default().media.sources;

    let found = find_source_file(root.path(), &sources, "sauna.jpg").unwrap();
    assert!(found.ends_with("Tilakuvat/sauna.jpg"));
    let found = find_source_file(root.path(), &sources, "logo.png").unwrap();
    assert!(found.ends_with("public/logo.png"));
    assert_eq!(find_source_file(root.path(), &sources, "nope.png"), None);
}

#[test]
fn shared_collection_in_localized_slot() {
    let config = MigrationConfig::default();
    let file = ExportFile::from_value(json!({"pages": [{"id": 1, "title": "Vain yksi"}]})).unwrap();
    let mut store = LocalStore::in_memory();
    let report = run(&mut store, &config, Path::new("."), &file);

    assert_eq!(report.collection("pages").unwrap().imported, 1);
    let docs: Vec<Value> = store.find("pages", Some("fi"), 10).unwrap();
    assert_eq!(docs[0]["title"], "Vain yksi");
}

#[test]
fn importer_rejects_media_outside_uploads() {
    let mut config = MigrationConfig::default();
    config.collections.uploads = vec!["images".to_string()];
    let mut store = LocalStore::in_memory();
    assert!(matches!(
        Importer::new(&mut store, &config),
        Err(ConfigError::MediaNotUploaded(c)) if c == "media"
    ));
}
