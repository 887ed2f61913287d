//! The persisted state document and its partial-update types.
//!
//! Every field carries a default so that older or hand-trimmed files upgrade
//! cleanly: [`Document::from_json_lenient`] merges whatever it can parse over
//! [`Document::default`] one top-level field at a time.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// Current schema tag written to new documents.
pub const SCHEMA_VERSION: u32 = 1;

/// Upper bound for grid rows and columns.
pub const MAX_GRID_DIMENSION: u32 = 16;

/// Streaming platform a source was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Twitch,
    Nicovideo,
    Vimeo,
    /// HLS playlist (`.m3u8`) played through a media element
    Hls,
    /// Any other http(s) media URL
    Url,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Twitch => "twitch",
            Platform::Nicovideo => "nicovideo",
            Platform::Vimeo => "vimeo",
            Platform::Hls => "hls",
            Platform::Url => "url",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered stream, unique by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSource {
    /// `<platform>:<extracted id>`, e.g. `youtube:dQw4w9WgXcQ`
    pub id: String,
    pub platform: Platform,
    pub embed_url: String,
    pub original_url: String,
    /// Milliseconds since the Unix epoch
    pub added_at: i64,
}

/// Desired grid shape. Advisory: viewers may recompute it from the source count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub rows: u32,
    pub columns: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            rows: 2,
            columns: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Linear volume in `[0, 1]`
    pub volume: f64,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

/// Window geometry override, in grid-relative units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlay {
    pub text: String,
    pub position: OverlayPosition,
    pub scrolling: bool,
}

/// The single canonical state aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub version: u32,
    /// Grid order; reordering mutates this sequence only
    pub sources: Vec<StreamSource>,
    pub layout: Layout,
    pub audio: BTreeMap<String, AudioSettings>,
    pub windows: BTreeMap<String, WindowRect>,
    pub text_overlay: TextOverlay,
    pub show_ids: bool,
    pub youtube_no_cookie: bool,
    pub hide_cursor: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            sources: Vec::new(),
            layout: Layout::default(),
            audio: BTreeMap::new(),
            windows: BTreeMap::new(),
            text_overlay: TextOverlay::default(),
            show_ids: false,
            youtube_no_cookie: true,
            hide_cursor: false,
        }
    }
}

impl Document {
    /// Parse a persisted document, merging every usable top-level field over
    /// the defaults.
    ///
    /// Fields with the wrong shape are dropped and described in the returned
    /// warnings; so are individual malformed entries of `sources`. Only text
    /// that is not JSON, or JSON that is not an object, is an error.
    pub fn from_json_lenient(input: &str) -> Result<(Self, Vec<String>)> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value_lenient(value)
    }

    /// [`Document::from_json_lenient`] for an already-parsed value.
    pub fn from_value_lenient(value: Value) -> Result<(Self, Vec<String>)> {
        let Value::Object(fields) = value else {
            return Err(StoreError::Json(serde::de::Error::custom(
                "state document must be a JSON object",
            )));
        };

        let mut warnings = Vec::new();
        let mut merged: Map<String, Value> = match serde_json::to_value(Document::default())? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (key, value) in fields {
            if !merged.contains_key(&key) {
                warnings.push(format!("ignoring unknown field '{key}'"));
                continue;
            }

            let value = if key == "sources" {
                match value {
                    Value::Array(items) => Value::Array(keep_valid_sources(items, &mut warnings)),
                    other => other,
                }
            } else {
                value
            };

            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<Document>(Value::Object(candidate)) {
                Ok(_) => {
                    merged.insert(key, value);
                }
                Err(e) => warnings.push(format!("field '{key}' reset to default: {e}")),
            }
        }

        let mut document: Document = serde_json::from_value(Value::Object(merged))?;
        let grid = 1..=MAX_GRID_DIMENSION;
        if !grid.contains(&document.layout.rows) || !grid.contains(&document.layout.columns) {
            warnings.push(format!(
                "field 'layout' reset to default: {}x{} is outside 1..={MAX_GRID_DIMENSION}",
                document.layout.rows, document.layout.columns
            ));
            document.layout = Layout::default();
        }
        document.normalize();
        Ok((document, warnings))
    }

    /// Restore the document invariants after loading foreign data.
    ///
    /// Duplicate source ids collapse onto the first position with the last
    /// entry's data, volumes are clamped to `[0, 1]`, and `audio`/`windows`
    /// entries without a live source are dropped.
    pub fn normalize(&mut self) {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut unique: Vec<StreamSource> = Vec::with_capacity(self.sources.len());
        for source in self.sources.drain(..) {
            let existing = positions.get(&source.id).copied();
            match existing {
                Some(index) => unique[index] = source,
                None => {
                    positions.insert(source.id.clone(), unique.len());
                    unique.push(source);
                }
            }
        }
        self.sources = unique;

        self.audio.retain(|id, _| positions.contains_key(id));
        self.windows.retain(|id, _| positions.contains_key(id));
        for settings in self.audio.values_mut() {
            if !settings.volume.is_finite() {
                settings.volume = AudioSettings::default().volume;
            }
            settings.volume = settings.volume.clamp(0.0, 1.0);
        }
    }

    pub fn contains_source(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id == id)
    }

    pub fn source_position(&self, id: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.id == id)
    }

    /// Source ids in grid order.
    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id.clone()).collect()
    }
}

fn keep_valid_sources(items: Vec<Value>, warnings: &mut Vec<String>) -> Vec<Value> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            match serde_json::from_value::<StreamSource>(item.clone()) {
                Ok(_) => Some(item),
                Err(e) => {
                    warnings.push(format!("dropping malformed source #{index}: {e}"));
                    None
                }
            }
        })
        .collect()
}

/// Re-sort `sources` so ids listed in `order` come first, in that order.
///
/// Sources missing from `order` keep their relative order after the listed
/// ones. Ids in `order` that match nothing are ignored; a repeated id counts
/// at its first occurrence.
pub fn reorder_sources(sources: &mut [StreamSource], order: &[String]) {
    let mut rank: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for (index, id) in order.iter().enumerate() {
        rank.entry(id.as_str()).or_insert(index);
    }
    // sort_by_key is stable, which keeps unlisted entries in original order
    sources.sort_by_key(|s| rank.get(s.id.as_str()).copied().unwrap_or(usize::MAX));
}

// ============================================================================
// Partial updates: an absent field leaves the stored value unchanged
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPatch {
    pub rows: Option<u32>,
    pub columns: Option<u32>,
}

impl LayoutPatch {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("rows", self.rows), ("columns", self.columns)] {
            if let Some(value) = value {
                if !(1..=MAX_GRID_DIMENSION).contains(&value) {
                    return Err(StoreError::invalid(
                        field,
                        format!("{value} is outside 1..={MAX_GRID_DIMENSION}"),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn apply_to(&self, layout: &mut Layout) {
        if let Some(rows) = self.rows {
            layout.rows = rows;
        }
        if let Some(columns) = self.columns {
            layout.columns = columns;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPatch {
    pub volume: Option<f64>,
    pub muted: Option<bool>,
}

impl AudioPatch {
    pub fn validate(&self) -> Result<()> {
        match self.volume {
            Some(volume) if !volume.is_finite() => {
                Err(StoreError::invalid("volume", "must be a finite number"))
            }
            _ => Ok(()),
        }
    }

    pub fn apply_to(&self, audio: &mut AudioSettings) {
        if let Some(volume) = self.volume {
            audio.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(muted) = self.muted {
            audio.muted = muted;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl WindowPatch {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ];
        for (field, value) in fields {
            let Some(value) = value else { continue };
            if !value.is_finite() {
                return Err(StoreError::invalid(field, "must be a finite number"));
            }
            if matches!(field, "width" | "height") && value < 0.0 {
                return Err(StoreError::invalid(field, "must not be negative"));
            }
        }
        Ok(())
    }

    pub fn apply_to(&self, rect: &mut WindowRect) {
        if let Some(x) = self.x {
            rect.x = x;
        }
        if let Some(y) = self.y {
            rect.y = y;
        }
        if let Some(width) = self.width {
            rect.width = width;
        }
        if let Some(height) = self.height {
            rect.height = height;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlayPatch {
    pub text: Option<String>,
    pub position: Option<OverlayPosition>,
    pub scrolling: Option<bool>,
}

impl TextOverlayPatch {
    pub fn apply_to(&self, overlay: &mut TextOverlay) {
        if let Some(text) = &self.text {
            overlay.text = text.clone();
        }
        if let Some(position) = self.position {
            overlay.position = position;
        }
        if let Some(scrolling) = self.scrolling {
            overlay.scrolling = scrolling;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str) -> StreamSource {
        StreamSource {
            id: id.to_string(),
            platform: Platform::Url,
            embed_url: format!("https://example.com/{id}"),
            original_url: format!("https://example.com/{id}"),
            added_at: 0,
        }
    }

    fn ids(sources: &[StreamSource]) -> Vec<&str> {
        sources.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_default_document() {
        let doc = Document::default();
        assert_eq!(doc.version, 1);
        assert!(doc.sources.is_empty());
        assert_eq!(doc.layout, Layout { rows: 2, columns: 2 });
        assert_eq!(doc.text_overlay.position, OverlayPosition::Bottom);
        assert!(doc.youtube_no_cookie);
        assert!(!doc.show_ids);
        assert!(!doc.hide_cursor);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Document::default()).unwrap();
        for key in [
            "version",
            "sources",
            "layout",
            "audio",
            "windows",
            "textOverlay",
            "showIds",
            "youtubeNoCookie",
            "hideCursor",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let (doc, warnings) = Document::from_json_lenient(r#"{"version":1,"sources":[]}"#).unwrap();
        assert_eq!(doc, Document::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_bad_field_does_not_poison_others() {
        let (doc, warnings) =
            Document::from_json_lenient(r#"{"layout":"wide","showIds":true}"#).unwrap();
        assert_eq!(doc.layout, Layout::default());
        assert!(doc.show_ids);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("layout"));
    }

    #[test]
    fn test_out_of_range_layout_is_reset() {
        let (doc, warnings) = Document::from_json_lenient(
            r#"{"layout":{"rows":0,"columns":0},"hideCursor":true}"#,
        )
        .unwrap();
        assert_eq!(doc.layout, Layout::default());
        assert!(doc.hide_cursor);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("layout"));

        let (doc, warnings) =
            Document::from_json_lenient(r#"{"layout":{"rows":3,"columns":17}}"#).unwrap();
        assert_eq!(doc.layout, Layout::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_malformed_source_entry_dropped() {
        let input = r#"{"sources":[
            {"id":"url:a","platform":"url","embedUrl":"e","originalUrl":"o","addedAt":1},
            {"id":"broken"}
        ]}"#;
        let (doc, warnings) = Document::from_json_lenient(input).unwrap();
        assert_eq!(ids(&doc.sources), vec!["url:a"]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_non_object_is_error() {
        assert!(Document::from_json_lenient("[1,2]").is_err());
        assert!(Document::from_json_lenient("{not json").is_err());
    }

    #[test]
    fn test_normalize_dedupes_and_prunes() {
        let mut doc = Document::default();
        let mut replacement = source("a");
        replacement.added_at = 99;
        doc.sources = vec![source("a"), source("b"), replacement];
        doc.audio.insert("ghost".into(), AudioSettings::default());
        doc.audio.insert(
            "a".into(),
            AudioSettings {
                volume: 4.0,
                muted: false,
            },
        );
        doc.windows.insert("ghost".into(), WindowRect::default());

        doc.normalize();

        assert_eq!(ids(&doc.sources), vec!["a", "b"]);
        assert_eq!(doc.sources[0].added_at, 99);
        assert!(!doc.audio.contains_key("ghost"));
        assert!(!doc.windows.contains_key("ghost"));
        assert_eq!(doc.audio["a"].volume, 1.0);
    }

    #[test]
    fn test_reorder_stable_tail() {
        let mut sources = vec![source("a"), source("b"), source("c"), source("d")];
        reorder_sources(&mut sources, &["c".into(), "a".into()]);
        assert_eq!(ids(&sources), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_reorder_empty_and_unknown() {
        let mut sources = vec![source("a"), source("b")];
        reorder_sources(&mut sources, &[]);
        assert_eq!(ids(&sources), vec!["a", "b"]);

        reorder_sources(&mut sources, &["zzz".into(), "b".into(), "b".into()]);
        assert_eq!(ids(&sources), vec!["b", "a"]);
    }

    #[test]
    fn test_patch_explicit_falsy_values_overwrite() {
        let mut audio = AudioSettings {
            volume: 0.7,
            muted: true,
        };
        AudioPatch {
            volume: Some(0.0),
            muted: Some(false),
        }
        .apply_to(&mut audio);
        assert_eq!(audio, AudioSettings { volume: 0.0, muted: false });

        let mut overlay = TextOverlay {
            text: "hello".into(),
            position: OverlayPosition::Top,
            scrolling: true,
        };
        let patch: TextOverlayPatch = serde_json::from_str(r#"{"text":""}"#).unwrap();
        patch.apply_to(&mut overlay);
        assert_eq!(overlay.text, "");
        assert_eq!(overlay.position, OverlayPosition::Top);
        assert!(overlay.scrolling);
    }

    #[test]
    fn test_layout_patch_validation() {
        assert!(LayoutPatch { rows: Some(0), columns: None }.validate().is_err());
        assert!(LayoutPatch { rows: None, columns: Some(17) }.validate().is_err());
        assert!(LayoutPatch { rows: Some(3), columns: Some(4) }.validate().is_ok());
        assert!(LayoutPatch::default().validate().is_ok());
    }

    #[test]
    fn test_window_patch_validation() {
        let negative = WindowPatch {
            width: Some(-1.0),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let offscreen = WindowPatch {
            x: Some(-0.5),
            ..Default::default()
        };
        assert!(offscreen.validate().is_ok());
    }
}
