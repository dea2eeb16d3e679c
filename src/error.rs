use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Library error type for slideshow sessions.
#[derive(Debug, Error)]
pub enum Error {
    /// The picture database could not answer a query. Fatal to the session.
    #[error("picture database unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Filter settings that cannot be honoured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A full pass over the pool produced no displayable picture.
    #[error("no displayable pictures in the picture database")]
    NothingToShow,
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

/// Problems with the filter settings. The session reports these once and
/// falls back to date grouping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("filter mode is enabled but no filter name was given")]
    EmptyFilterName,

    #[error("filter '{0}' was not found in the picture database")]
    UnknownFilter(String),

    #[error("no displayable pictures match filter '{0}'")]
    EmptyFilter(String),
}
