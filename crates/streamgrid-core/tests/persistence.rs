//! Load / save behaviour of the document file.

use std::fs;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use streamgrid_core::{
    AudioPatch, Change, Document, DocumentStore, LayoutPatch, OverlayPosition, ParsedSource, Platform,
    TextOverlayPatch, WindowPatch,
};
use tempfile::TempDir;

fn source(id: &str) -> ParsedSource {
    ParsedSource {
        id: format!("url:{id}"),
        platform: Platform::Url,
        embed_url: format!("https://media.example.com/{id}.mp4"),
        original_url: format!("https://media.example.com/{id}.mp4"),
    }
}

#[test]
fn test_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");

    let before = {
        let store = DocumentStore::initialize(&path).unwrap();
        store.add_source(source("one")).unwrap();
        store.add_source(source("two")).unwrap();
        store
            .update_layout(LayoutPatch { rows: Some(1), columns: Some(2) })
            .unwrap();
        store
            .update_audio("url:two", AudioPatch { volume: Some(0.5), muted: Some(true) })
            .unwrap();
        store
            .update_window("url:one", WindowPatch { width: Some(0.5), ..Default::default() })
            .unwrap();
        store
            .update_text_overlay(TextOverlayPatch {
                text: Some("hello".into()),
                position: Some(OverlayPosition::Left),
                scrolling: Some(true),
            })
            .unwrap();
        store.update_show_ids(true).unwrap();
        store.snapshot()
    };

    let reopened = DocumentStore::initialize(&path).unwrap();
    assert_eq!(reopened.snapshot(), before);
    assert!(reopened.load_warnings().is_empty());
}

#[test]
fn test_file_is_pretty_camel_case_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    let store = DocumentStore::initialize(&path).unwrap();
    store.add_source(source("one")).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains('\n'));

    let json: Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["youtubeNoCookie"], true);
    assert_eq!(json["textOverlay"]["position"], "bottom");
    assert_eq!(json["sources"][0]["embedUrl"], "https://media.example.com/one.mp4");
    assert!(json["sources"][0]["addedAt"].is_i64());
    assert_eq!(json["audio"]["url:one"]["volume"], 1.0);
}

#[test]
fn test_partial_file_takes_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    fs::write(&path, r#"{"version":1,"sources":[]}"#).unwrap();

    let store = DocumentStore::initialize(&path).unwrap();
    assert_eq!(store.snapshot(), Document::default());
}

#[test]
fn test_bad_field_does_not_discard_the_rest() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    fs::write(
        &path,
        r#"{
            "version": 1,
            "sources": [
                {"id":"url:a","platform":"url","embedUrl":"https://a","originalUrl":"https://a","addedAt":1},
                {"id":"broken"}
            ],
            "layout": "three by three",
            "audio": {"url:a": {"volume": 7}, "url:gone": {"volume": 0.5}},
            "showIds": true
        }"#,
    )
    .unwrap();

    let store = DocumentStore::initialize(&path).unwrap();
    let doc = store.snapshot();

    assert_eq!(doc.source_ids(), vec!["url:a"]);
    assert_eq!(doc.layout, Document::default().layout);
    assert!(doc.show_ids);
    assert_eq!(doc.audio["url:a"].volume, 1.0);
    assert!(!doc.audio.contains_key("url:gone"));
    // One dropped source and one reset field
    assert_eq!(store.load_warnings().len(), 2);
}

#[test]
fn test_non_object_document_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let store = DocumentStore::initialize(&path).unwrap();
    assert_eq!(store.snapshot(), Document::default());
    assert!(!store.load_warnings().is_empty());
}

#[test]
fn test_mutation_after_corrupt_load_rewrites_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    fs::write(&path, "garbage").unwrap();

    let store = DocumentStore::initialize(&path).unwrap();
    store.update_hide_cursor(true).unwrap();

    let (doc, warnings) = Document::from_json_lenient(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(warnings.is_empty());
    assert!(doc.hide_cursor);
}

#[test]
fn test_independent_stores_do_not_share_state() {
    let temp = TempDir::new().unwrap();
    let first = DocumentStore::initialize(temp.path().join("a.json")).unwrap();
    let second = DocumentStore::initialize(temp.path().join("b.json")).unwrap();

    first.add_source(source("only-first")).unwrap();

    assert_eq!(first.sources().len(), 1);
    assert!(second.sources().is_empty());
}

#[test]
fn test_reload_picks_up_external_edit() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    let store = DocumentStore::initialize(&path).unwrap();

    let mut edited = store.snapshot();
    edited.show_ids = true;
    fs::write(&path, serde_json::to_string_pretty(&edited).unwrap()).unwrap();

    assert!(store.reload_from_disk().unwrap());
    assert!(store.snapshot().show_ids);
    // Same content again is not a change
    assert!(!store.reload_from_disk().unwrap());
}

#[test]
fn test_reload_keeps_live_document_on_half_written_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    let store = DocumentStore::initialize(&path).unwrap();
    store.add_source(source("keep")).unwrap();

    fs::write(&path, r#"{"version":1,"sources":["#).unwrap();

    assert!(!store.reload_from_disk().unwrap());
    assert_eq!(store.sources().len(), 1);
}

#[test]
fn test_floats_survive_restart_exactly() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");

    let before = {
        let store = DocumentStore::initialize(&path).unwrap();
        store.add_source(source("geo")).unwrap();
        store
            .update_window(
                "url:geo",
                WindowPatch {
                    x: Some(90.08966719419209),
                    y: Some(365.87992443022756),
                    width: Some(0.1 + 0.2),
                    height: Some(1.0 / 3.0),
                },
            )
            .unwrap();
        store
            .update_audio("url:geo", AudioPatch { volume: Some(std::f64::consts::FRAC_1_SQRT_2), muted: None })
            .unwrap();
        store.snapshot()
    };

    let reopened = DocumentStore::initialize(&path).unwrap();
    let rect = reopened.snapshot().windows["url:geo"];
    assert_eq!(rect.x.to_bits(), 90.08966719419209_f64.to_bits());
    assert_eq!(rect.y.to_bits(), 365.87992443022756_f64.to_bits());
    assert_eq!(reopened.snapshot(), before);
}

#[test]
fn test_external_privacy_toggle_rewrites_embeds_and_asks_for_reload() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    let store = DocumentStore::initialize(&path).unwrap();
    store.add_url("https://youtu.be/dQw4w9WgXcQ").unwrap();
    assert!(store.sources()[0].embed_url.contains("youtube-nocookie.com"));

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    store.subscribe(move |n| {
        sink.lock().unwrap().push(n.change.clone());
        Ok(())
    });

    // Hand edit flips the flag but leaves the embed URL alone
    let mut edited = store.snapshot();
    edited.youtube_no_cookie = false;
    fs::write(&path, serde_json::to_string_pretty(&edited).unwrap()).unwrap();

    assert!(store.reload_from_disk().unwrap());

    let doc = store.snapshot();
    assert!(!doc.youtube_no_cookie);
    assert_eq!(
        doc.sources[0].embed_url,
        "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1&mute=1"
    );
    let changes = changes.lock().unwrap();
    assert_eq!(*changes, vec![Change::YoutubeNoCookie { value: false }]);
    assert!(changes[0].requires_reload());

    // The rewritten embeds are persisted
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(on_disk["sources"][0]["embedUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://www.youtube.com/"));
}
