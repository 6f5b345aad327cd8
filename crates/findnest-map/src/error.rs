use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// The map could not be created, even with the fallback style.
    #[error("map initialization failed: {reason}")]
    Init { reason: String },

    /// The rendering backend refused a style document.
    #[error("style '{style}' rejected by map backend: {reason}")]
    StyleRejected { style: String, reason: String },

    #[error("map already initialized")]
    AlreadyInitialized,

    #[error("map not initialized")]
    NotInitialized,

    #[error("map destroyed")]
    Destroyed,
}
