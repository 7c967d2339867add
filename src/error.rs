//! Error taxonomy shared by the whole crate

use thiserror::Error;

/// Errors surfaced by geometry, resources, the scene stack and the driver.
///
/// A scene finishing is not an error: that is reported through
/// [`crate::scene::Flow::Complete`] and never leaves the driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("resource store queried before an archive was loaded")]
    StoreUninitialized,

    #[error("scene stack is empty")]
    EmptyStack,

    #[error("no scene registered under '{0}'")]
    UnknownScene(String),

    #[error("failed to decode '{name}'")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
