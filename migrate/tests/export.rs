use serde_json::{Map, Value, json};

use migrate::config::MigrationConfig;
use migrate::error::MigrateError;
use migrate::export::{CollectionRecords, ExportFile, export_snapshot, merge_global_locales};
use migrate::store::{CreateRequest, LocalStore, RecordStore};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[test]
fn merges_nav_labels_and_site_title() {
    let fi = json!({
        "id": 1,
        "globalType": "header",
        "updatedAt": "2024-01-01",
        "navItems": [
            {
                "id": "n1",
                "link": {
                    "type": "reference",
                    "newTab": false,
                    "reference": {"relationTo": "pages", "value": 3},
                    "label": "Tilat"
                }
            },
            {"id": "n2", "link": {"type": "custom", "url": "/kalenteri", "label": "Kalenteri"}}
        ],
        "siteTitle": "OtaHoas",
        "logo": 4
    });
    let en = json!({
        "navItems": [
            {"link": {"label": "Spaces"}},
            {"link": {"label": ""}}
        ],
        "siteTitle": "OtaHoas (en)"
    });

    assert_eq!(
        merge_global_locales(("fi", &fi), &[("en", &en)]),
        json!({
            "navItems": [
                {
                    "id": "n1",
                    "link": {
                        "type": "reference",
                        "newTab": false,
                        "reference": {"relationTo": "pages", "value": 3},
                        "label": {"fi": "Tilat", "en": "Spaces"}
                    }
                },
                {
                    "id": "n2",
                    "link": {
                        "type": "custom",
                        "url": "/kalenteri",
                        "label": {"fi": "Kalenteri", "en": "Kalenteri"}
                    }
                }
            ],
            "siteTitle": {"fi": "OtaHoas", "en": "OtaHoas (en)"},
            "logo": 4
        })
    );
}

#[test]
fn missing_secondary_copy_falls_back_to_primary() {
    let fi = json!({"navItems": [{"link": {"label": "Säännöt"}}]});
    let merged = merge_global_locales(("fi", &fi), &[("en", &json!({}))]);
    assert_eq!(merged["navItems"][0]["link"]["label"], json!({"fi": "Säännöt", "en": "Säännöt"}));
}

#[test]
fn parses_collections_and_globals() {
    let file = ExportFile::from_value(json!({
        "pages": {"fi": [{"id": 1}], "en": [{"id": 1}, {"id": 2}]},
        "media": [{"id": 3}],
        "global_header": {"navItems": []}
    }))
    .unwrap();

    assert_eq!(file.collection_names().collect::<Vec<_>>(), vec!["pages", "media"]);
    assert_eq!(file.global_slugs().collect::<Vec<_>>(), vec!["header"]);
    let pages = file.collection("pages").unwrap();
    assert_eq!(pages.locale("en").len(), 2);
    assert_eq!(pages.total(), 3);
    assert!(matches!(file.collection("media"), Some(CollectionRecords::Shared(_))));
    assert_eq!(file.global("header"), Some(&json!({"navItems": []})));
}

#[test]
fn to_value_keeps_layout() {
    let source = json!({
        "pages": {"fi": [{"id": 1}], "en": []},
        "media": [],
        "global_footer": {"navItems": []}
    });
    let file = ExportFile::from_value(source.clone()).unwrap();
    let keys: Vec<String> = object(file.to_value()).keys().cloned().collect();
    assert_eq!(keys, vec!["pages", "media", "global_footer"]);
    assert_eq!(file.to_value(), source);
}

#[test]
fn malformed_exports_are_rejected() {
    for bad in [json!([]), json!({"pages": 5}), json!({"pages": {"fi": {}}})] {
        assert!(matches!(
            ExportFile::from_value(bad),
            Err(MigrateError::MalformedExport(_))
        ));
    }
}

#[test]
fn missing_export_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed-data.json");
    assert!(matches!(
        ExportFile::load(&path),
        Err(MigrateError::MissingExport(p)) if p == path
    ));
}

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/seed-data.json");
    let file = ExportFile::from_value(json!({"media": [{"id": 1, "alt": "ä"}]})).unwrap();
    file.save(&path).unwrap();
    assert_eq!(ExportFile::load(&path).unwrap(), file);
}

#[test]
fn snapshot_of_local_store() {
    let mut store = LocalStore::in_memory();
    let id = store
        .create(
            "pages",
            CreateRequest::new(object(json!({"title": "Tilat", "slug": "tilat"}))).in_locale("fi"),
        )
        .unwrap();
    store
        .update("pages", &id, Some("en"), object(json!({"title": "Spaces"})))
        .unwrap();
    store
        .create("media", CreateRequest::new(object(json!({"alt": "Kuva"}))))
        .unwrap();
    store.set_global("header", "fi", object(json!({"siteTitle": "OtaHoas"})));
    store.set_global("header", "en", object(json!({"siteTitle": "OtaHoas EN"})));

    let file = export_snapshot(&store, &MigrationConfig::default()).unwrap();

    let pages = file.collection("pages").unwrap();
    assert_eq!(pages.locale("fi")[0]["title"], "Tilat");
    assert_eq!(pages.locale("en")[0]["title"], "Spaces");
    assert_eq!(file.collection("media").unwrap().records()[0]["alt"], "Kuva");
    assert_eq!(
        file.global("header"),
        Some(&json!({"siteTitle": {"fi": "OtaHoas", "en": "OtaHoas EN"}}))
    );
    assert!(file.global("footer").is_none());
}
