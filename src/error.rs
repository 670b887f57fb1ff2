use thiserror::Error;

/// Errors surfaced by constructors and loaders.
///
/// Per-frame rendering never returns these: missing sprites, malformed
/// animation frames and cap overflows are isolated per item and logged.
#[derive(Debug, Error)]
pub enum Error {
    /// The lighting pass could not acquire its worker pool. The scene still
    /// renders, just unlit.
    #[error("lighting acceleration unavailable: {0}")]
    AccelerationUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("asset error: {0}")]
    Asset(String),

    /// Window surface / GPU device setup failed in the viewer.
    #[error("surface error: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Remembers which keys were already reported so a per-frame failure is
/// logged once per session instead of sixty times a second.
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: std::collections::HashSet<String>,
}

impl WarnOnce {
    /// True the first time `key` is seen.
    pub fn first(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string());
        true
    }
}
