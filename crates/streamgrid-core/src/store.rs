//! The persisted document store and its mutation API.
//!
//! One [`DocumentStore`] owns one document file. Every mutation runs the same
//! protocol under a single lock: validate, apply in memory, persist, notify.
//! Holding the lock across all four steps keeps mutations from interleaving
//! and keeps notifications in the order the mutations completed.
//!
//! If persisting fails the change stays applied and is still published; the
//! I/O error is then returned to the caller.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::bus::{Change, ChangeBus, ListenerClosed, Notification, SubscriptionId};
use crate::document::{
    AudioPatch, AudioSettings, Document, Layout, LayoutPatch, Platform, StreamSource, TextOverlay,
    TextOverlayPatch, WindowPatch, WindowRect, reorder_sources,
};
use crate::error::{Result, StoreError};
use crate::resolve::{self, EmbedOptions, ParsedSource};

struct StoreState {
    document: Document,
    /// Exact bytes of our most recent save, used to recognise our own writes
    /// when the file watcher fires.
    last_written: Option<String>,
}

/// Single owner of the canonical [`Document`].
///
/// Shared as `Arc<DocumentStore>` by every transport; there is no global
/// instance, so independent stores can coexist in one process.
pub struct DocumentStore {
    path: PathBuf,
    state: Mutex<StoreState>,
    bus: ChangeBus,
    load_warnings: Vec<String>,
}

impl DocumentStore {
    /// Open the document at `path`, creating it with defaults if missing.
    ///
    /// An unreadable or unparseable file is not fatal: the store starts from
    /// defaults and the problem is logged and kept in [`Self::load_warnings`].
    ///
    /// # Errors
    ///
    /// Fails only if the parent directory cannot be created or the initial
    /// default document cannot be written.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Arc<Self>> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut load_warnings = Vec::new();
        let mut state = StoreState {
            document: Document::default(),
            last_written: None,
        };

        if !path.exists() {
            info!(path = %path.display(), "creating default state document");
            let contents = serialize(&state.document)?;
            write_atomic(&path, &contents).map_err(|source| StoreError::Persist {
                path: path.clone(),
                source,
            })?;
            state.last_written = Some(contents);
        } else {
            match fs::read_to_string(&path) {
                Ok(contents) => match Document::from_json_lenient(&contents) {
                    Ok((document, warnings)) => {
                        for warning in &warnings {
                            warn!(path = %path.display(), "{warning}");
                        }
                        load_warnings = warnings;
                        state.document = document;
                        state.last_written = Some(contents);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "state file unreadable, using defaults");
                        load_warnings.push(format!("using defaults: {e}"));
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read state file, using defaults");
                    load_warnings.push(format!("using defaults: {e}"));
                }
            }
            debug!(
                path = %path.display(),
                sources = state.document.sources.len(),
                "loaded state document"
            );
        }

        Ok(Arc::new(Self {
            path,
            state: Mutex::new(state),
            bus: ChangeBus::new(),
            load_warnings,
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Problems found while loading the file at startup.
    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }

    /// Deep, independent copy of the current document.
    pub fn snapshot(&self) -> Document {
        self.state.lock().document.clone()
    }

    /// Run `f` against the live document while no mutation can run.
    ///
    /// `f` must not call back into this store.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.state.lock().document)
    }

    pub fn sources(&self) -> Vec<StreamSource> {
        self.state.lock().document.sources.clone()
    }

    pub fn embed_options(&self) -> EmbedOptions {
        EmbedOptions {
            youtube_no_cookie: self.state.lock().document.youtube_no_cookie,
        }
    }

    /// Write the full document to disk, replacing the file atomically.
    pub fn save(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.persist_locked(&mut state)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register a change listener. See [`ChangeBus`] for delivery rules; a
    /// listener must never call back into this store.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification) -> std::result::Result<(), ListenerClosed> + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Subscribe and snapshot in one step: the listener receives exactly the
    /// changes made after the returned document.
    pub fn subscribe_with_snapshot<F>(&self, listener: F) -> (SubscriptionId, Document)
    where
        F: Fn(&Notification) -> std::result::Result<(), ListenerClosed> + Send + Sync + 'static,
    {
        let state = self.state.lock();
        let id = self.bus.subscribe(listener);
        (id, state.document.clone())
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.len()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert a source, or replace the entry with the same id in place.
    pub fn add_source(&self, parsed: ParsedSource) -> Result<StreamSource> {
        if parsed.id.trim().is_empty() {
            return Err(StoreError::invalid("id", "must not be empty"));
        }
        if parsed.embed_url.trim().is_empty() {
            return Err(StoreError::invalid("embedUrl", "must not be empty"));
        }

        let mut state = self.state.lock();
        self.upsert_locked(&mut state, parsed)
    }

    /// Resolve `url` against the current embed options and upsert it.
    ///
    /// Resolution happens under the document lock so a concurrent privacy
    /// toggle cannot leave the new source with a stale embed host.
    pub fn add_url(&self, url: &str) -> Result<StreamSource> {
        let mut state = self.state.lock();
        let options = EmbedOptions {
            youtube_no_cookie: state.document.youtube_no_cookie,
        };
        let parsed = resolve::parse(url, &options)?;
        self.upsert_locked(&mut state, parsed)
    }

    /// Remove a source with its audio and window entries.
    ///
    /// Returns `false` (and changes nothing) if no source has this id.
    pub fn remove_source(&self, id: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let document = &mut state.document;
        let Some(index) = document.source_position(id) else {
            debug!(source_id = id, "remove ignored, no such source");
            return Ok(false);
        };

        document.sources.remove(index);
        document.audio.remove(id);
        document.windows.remove(id);
        info!(source_id = id, "source removed");

        self.commit(&mut state, Change::Removed { id: id.to_string() })?;
        Ok(true)
    }

    pub fn update_layout(&self, patch: LayoutPatch) -> Result<Layout> {
        patch.validate()?;

        let mut state = self.state.lock();
        patch.apply_to(&mut state.document.layout);
        let layout = state.document.layout;
        debug!(rows = layout.rows, columns = layout.columns, "layout updated");

        self.commit(&mut state, Change::Layout { layout })?;
        Ok(layout)
    }

    pub fn update_audio(&self, id: &str, patch: AudioPatch) -> Result<AudioSettings> {
        patch.validate()?;

        let mut state = self.state.lock();
        if !state.document.contains_source(id) {
            return Err(StoreError::UnknownSource(id.to_string()));
        }
        let settings = state.document.audio.entry(id.to_string()).or_default();
        patch.apply_to(settings);
        let settings = *settings;

        self.commit(
            &mut state,
            Change::Audio {
                id: id.to_string(),
                settings,
            },
        )?;
        Ok(settings)
    }

    pub fn update_window(&self, id: &str, patch: WindowPatch) -> Result<WindowRect> {
        patch.validate()?;

        let mut state = self.state.lock();
        if !state.document.contains_source(id) {
            return Err(StoreError::UnknownSource(id.to_string()));
        }
        let rect = state.document.windows.entry(id.to_string()).or_default();
        patch.apply_to(rect);
        let rect = *rect;

        self.commit(
            &mut state,
            Change::Window {
                id: id.to_string(),
                rect,
            },
        )?;
        Ok(rect)
    }

    /// Move the listed sources to the front in the given order; the rest
    /// follow in their previous relative order. Returns the resulting order.
    pub fn reorder(&self, order: &[String]) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        reorder_sources(&mut state.document.sources, order);
        let order = state.document.source_ids();
        debug!(?order, "sources reordered");

        self.commit(
            &mut state,
            Change::Reordered {
                order: order.clone(),
            },
        )?;
        Ok(order)
    }

    pub fn update_text_overlay(&self, patch: TextOverlayPatch) -> Result<TextOverlay> {
        let mut state = self.state.lock();
        patch.apply_to(&mut state.document.text_overlay);
        let overlay = state.document.text_overlay.clone();

        self.commit(
            &mut state,
            Change::TextOverlay {
                overlay: overlay.clone(),
            },
        )?;
        Ok(overlay)
    }

    pub fn update_show_ids(&self, value: bool) -> Result<bool> {
        let mut state = self.state.lock();
        state.document.show_ids = value;
        self.commit(&mut state, Change::ShowIds { value })?;
        Ok(value)
    }

    /// Switch YouTube embeds between the regular and privacy-enhanced host,
    /// rewriting the embed URL of every stored YouTube source.
    pub fn update_youtube_no_cookie(&self, value: bool) -> Result<bool> {
        let mut state = self.state.lock();
        state.document.youtube_no_cookie = value;
        rewrite_youtube_embeds(&mut state.document);
        info!(enabled = value, "youtube privacy mode changed");

        self.commit(&mut state, Change::YoutubeNoCookie { value })?;
        Ok(value)
    }

    pub fn update_hide_cursor(&self, value: bool) -> Result<bool> {
        let mut state = self.state.lock();
        state.document.hide_cursor = value;
        self.commit(&mut state, Change::HideCursor { value })?;
        Ok(value)
    }

    // ------------------------------------------------------------------
    // External edits
    // ------------------------------------------------------------------

    /// Re-read the file and adopt its content if someone else changed it.
    ///
    /// Content identical to our own last save is ignored. Unparseable content
    /// keeps the live document (an editor may be mid-save). Returns whether a
    /// notification was published: [`Change::Reloaded`], or
    /// [`Change::YoutubeNoCookie`] when the edit flipped privacy mode, in which
    /// case YouTube embed URLs are re-derived and the file is rewritten.
    pub fn reload_from_disk(&self) -> Result<bool> {
        let mut state = self.state.lock();

        // Read under the lock so a concurrent save cannot slip between the
        // read and the comparison below.
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file missing, keeping live document");
                return Ok(false);
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if state.last_written.as_deref() == Some(contents.as_str()) {
            return Ok(false);
        }

        let document = match Document::from_json_lenient(&contents) {
            Ok((document, warnings)) => {
                for warning in &warnings {
                    warn!(path = %self.path.display(), "{warning}");
                }
                document
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unparseable external edit");
                return Ok(false);
            }
        };

        state.last_written = Some(contents);
        if document == state.document {
            return Ok(false);
        }

        info!(path = %self.path.display(), "state file changed externally, reloading");
        let privacy_changed = document.youtube_no_cookie != state.document.youtube_no_cookie;
        state.document = document;

        if privacy_changed {
            // Embed URLs in the edited file may still point at the old host
            rewrite_youtube_embeds(&mut state.document);
            let value = state.document.youtube_no_cookie;
            info!(enabled = value, "youtube privacy mode changed by external edit");
            self.commit(&mut state, Change::YoutubeNoCookie { value })?;
        } else {
            self.bus.publish(&Change::Reloaded, &state.document);
        }
        Ok(true)
    }

    /// Watch the document file for edits made outside this process.
    ///
    /// Events are debounced on the trailing edge and then handled by
    /// [`Self::reload_from_disk`] on a background thread. Watching stops when
    /// the returned [`DocumentWatcher`] is dropped.
    pub fn watch_for_external_changes(self: &Arc<Self>, debounce: Duration) -> Result<DocumentWatcher> {
        // Watch the directory: editors often save by renaming over the file,
        // which a watch on the file itself would lose.
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let (tx, rx) = std_mpsc::channel::<()>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "file watcher error");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            if event
                .paths
                .iter()
                .any(|p| p.file_name() == file_name.as_deref())
            {
                let _ = tx.send(());
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let store = Arc::downgrade(self);
        std::thread::Builder::new()
            .name("streamgrid-watch".into())
            .spawn(move || reload_loop(store, rx, debounce))
            .map_err(|e| StoreError::Watch(notify::Error::io(e)))?;

        info!(path = %self.path.display(), "watching state file for external edits");
        Ok(DocumentWatcher {
            _watcher: watcher,
            path: self.path.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn upsert_locked(&self, state: &mut StoreState, parsed: ParsedSource) -> Result<StreamSource> {
        let source = StreamSource {
            id: parsed.id,
            platform: parsed.platform,
            embed_url: parsed.embed_url,
            original_url: parsed.original_url,
            added_at: Utc::now().timestamp_millis(),
        };

        let document = &mut state.document;
        match document.source_position(&source.id) {
            Some(index) => {
                debug!(source_id = %source.id, index, "replacing existing source in place");
                document.sources[index] = source.clone();
            }
            None => document.sources.push(source.clone()),
        }
        document.audio.entry(source.id.clone()).or_default();
        info!(source_id = %source.id, platform = %source.platform, "source added");

        self.commit(
            state,
            Change::Added {
                source: source.clone(),
            },
        )?;
        Ok(source)
    }

    /// Persist then publish. Publication happens even when persisting fails.
    fn commit(&self, state: &mut StoreState, change: Change) -> Result<()> {
        let persisted = self.persist_locked(state);
        if let Err(e) = &persisted {
            error!(error = %e, "failed to persist state; change kept in memory");
        }
        self.bus.publish(&change, &state.document);
        persisted
    }

    fn persist_locked(&self, state: &mut StoreState) -> Result<()> {
        let contents = serialize(&state.document)?;
        write_atomic(&self.path, &contents).map_err(|source| StoreError::Persist {
            path: self.path.clone(),
            source,
        })?;
        state.last_written = Some(contents);
        Ok(())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("path", &self.path)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// Handle for an active file watch; dropping it stops watching.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl DocumentWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Point every YouTube embed at the host selected by `youtube_no_cookie`.
fn rewrite_youtube_embeds(document: &mut Document) {
    let no_cookie = document.youtube_no_cookie;
    for source in document
        .sources
        .iter_mut()
        .filter(|s| s.platform == Platform::Youtube)
    {
        if let Some(video) = resolve::youtube_video_id(&source.id) {
            source.embed_url = resolve::youtube_embed_url(video, no_cookie);
        }
    }
}

fn reload_loop(store: Weak<DocumentStore>, rx: std_mpsc::Receiver<()>, debounce: Duration) {
    // Exits once the watcher (and with it the sender) is dropped.
    while rx.recv().is_ok() {
        // Trailing edge: wait until the burst of events goes quiet
        loop {
            match rx.recv_timeout(debounce) {
                Ok(()) => continue,
                Err(std_mpsc::RecvTimeoutError::Timeout) => break,
                Err(std_mpsc::RecvTimeoutError::Disconnected) => return,
            }
        }

        let Some(store) = store.upgrade() else {
            return;
        };
        if let Err(e) = store.reload_from_disk() {
            warn!(error = %e, "failed to reload state file");
        }
    }
}

fn serialize(document: &Document) -> Result<String> {
    let mut contents = serde_json::to_string_pretty(document)?;
    contents.push('\n');
    Ok(contents)
}

/// Write through a temp file in the same directory, then rename over `path`,
/// so readers never observe a partially written document.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
