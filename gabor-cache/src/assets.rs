use crate::cache::{get_source, intern_source};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tiny_skia::{ColorU8, Pixmap};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("data uri has no payload")]
    MalformedDataUri,
    #[error("only base64 data uris are supported")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    Empty,
}

/// Where an image is in its single load attempt.
#[derive(Debug, Clone)]
pub enum AssetState {
    Pending,
    Ready(Arc<Pixmap>),
    Failed,
}

impl AssetState {
    pub fn ready(&self) -> Option<&Arc<Pixmap>> {
        match self {
            AssetState::Ready(p) => Some(p),
            _ => None,
        }
    }
}

/// Non-blocking image lookup, polled once per display refresh. Sources are
/// interned once up front with [`intern_source`] and fetched by ID; the
/// first fetch of an ID starts its load, later fetches only report progress.
pub trait AssetSource {
    fn fetch(&self, id: usize) -> AssetState;
}

/// Decodes each distinct source once on a worker thread. Entries are keyed
/// by interned source ID and never evicted.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: Arc<Mutex<HashMap<usize, AssetState>>>,
    loads: Arc<AtomicUsize>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `source` and starts loading it unless it was requested
    /// before. Returns the ID to fetch it by.
    pub fn request(&self, source: &str) -> usize {
        let id = intern_source(source);
        self.request_id(id);
        id
    }

    /// Starts loading an interned source unless it was requested before.
    pub fn request_id(&self, id: usize) {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if entries.contains_key(&id) {
                return;
            }
            entries.insert(id, AssetState::Pending);
        }
        self.loads.fetch_add(1, Ordering::Relaxed);

        let entries = Arc::clone(&self.entries);
        let spawned = std::thread::Builder::new()
            .name(format!("image-decode-{id}"))
            .spawn(move || {
                let state = load(id);
                entries
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(id, state);
            });
        if let Err(e) = spawned {
            warn!(id, error = %e, "could not start image decode");
            self.set(id, AssetState::Failed);
        }
    }

    /// `None` until the ID has been requested.
    pub fn state(&self, id: usize) -> Option<AssetState> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    /// Number of load attempts started so far.
    pub fn loads_started(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn set(&self, id: usize, state: AssetState) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, state);
    }
}

impl AssetSource for ImageCache {
    fn fetch(&self, id: usize) -> AssetState {
        if let Some(state) = self.state(id) {
            return state;
        }
        self.request_id(id);
        self.state(id).unwrap_or(AssetState::Pending)
    }
}

fn load(id: usize) -> AssetState {
    let Some(source) = get_source(id) else {
        return AssetState::Failed;
    };
    match decode_source(&source) {
        Ok(pixmap) => {
            debug!(
                source = %short(&source),
                width = pixmap.width(),
                height = pixmap.height(),
                "image decoded"
            );
            AssetState::Ready(Arc::new(pixmap))
        }
        Err(e) => {
            warn!(source = %short(&source), error = %e, "image failed to load");
            AssetState::Failed
        }
    }
}

/// Data URIs can be megabytes long; keep log lines readable.
fn short(source: &str) -> &str {
    match source.char_indices().nth(64) {
        Some((i, _)) => &source[..i],
        None => source,
    }
}

/// Reads a file path or `data:` URI and decodes it into a premultiplied
/// pixmap.
pub fn decode_source(source: &str) -> Result<Pixmap, AssetError> {
    let bytes = match source.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest.split_once(',').ok_or(AssetError::MalformedDataUri)?;
            if !meta.ends_with(";base64") {
                return Err(AssetError::NotBase64);
            }
            STANDARD.decode(payload.trim())?
        }
        None => std::fs::read(source).map_err(|e| AssetError::Read {
            path: source.to_string(),
            source: e,
        })?,
    };

    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let mut pixmap = Pixmap::new(rgba.width(), rgba.height()).ok_or(AssetError::Empty)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Assets that are already in memory, keyed by interned source ID.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    map: HashMap<usize, AssetState>,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: &str, pixmap: Pixmap) {
        self.map
            .insert(intern_source(source), AssetState::Ready(Arc::new(pixmap)));
    }

    pub fn fail(&mut self, source: &str) {
        self.map.insert(intern_source(source), AssetState::Failed);
    }
}

impl AssetSource for StaticAssets {
    fn fetch(&self, id: usize) -> AssetState {
        self.map.get(&id).cloned().unwrap_or(AssetState::Pending)
    }
}
