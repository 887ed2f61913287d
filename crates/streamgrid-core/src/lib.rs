//! Streamgrid state core.
//!
//! Owns the single source of truth for a local multi-stream dashboard: the
//! ordered list of stream sources plus per-source audio and window settings,
//! layout, overlay and display flags.
//!
//! - [`document`] - the persisted data model and partial-update types
//! - [`resolve`] - recognising stream URLs and deriving ids and embed URLs
//! - [`bus`] - typed publish/subscribe fan-out of changes
//! - [`store`] - the persisted document store and its mutation API
//!
//! Transports (HTTP, WebSocket, JSON-RPC) live in `streamgrid-cli` and hold
//! an `Arc<DocumentStore>` handed to them at construction time.
//!
//! # Example
//!
//! ```no_run
//! use streamgrid_core::{DocumentStore, LayoutPatch};
//!
//! # fn main() -> streamgrid_core::Result<()> {
//! let store = DocumentStore::initialize("/tmp/streamgrid/state.json")?;
//! store.subscribe(|n| {
//!     println!("{:?}", n.change);
//!     Ok(())
//! });
//! store.add_url("https://youtu.be/dQw4w9WgXcQ")?;
//! store.update_layout(LayoutPatch { rows: Some(1), columns: None })?;
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod document;
pub mod error;
pub mod resolve;
pub mod store;

pub use bus::{Change, ChangeBus, ListenerClosed, Notification, SubscriptionId};
pub use document::{
    AudioPatch, AudioSettings, Document, Layout, LayoutPatch, OverlayPosition, Platform,
    StreamSource, TextOverlay, TextOverlayPatch, WindowPatch, WindowRect,
};
pub use error::{ResolveError, Result, StoreError};
pub use resolve::{EmbedOptions, ParsedSource};
pub use store::{DocumentStore, DocumentWatcher};
