use thiserror::Error;

/// Fallback message when a failed response carries no readable `{ "error": ... }` body.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("could not obtain identity token: {0}")]
    TokenUnavailable(String),
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("could not encode request: {0}")]
    Encode(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("selection incomplete: length, shape, style and color (with a base color for Select) are required")]
    IncompleteSelection,
    #[error("no designs were produced by any model")]
    NoResultsProduced,
    #[error("unknown design: {0}")]
    UnknownDesign(String),
    #[error("unknown image: {0}")]
    UnknownImage(String),
    #[error("failed to {action} {id}: {source}")]
    OptimisticUpdate {
        action: &'static str,
        id: String,
        #[source]
        source: Box<DesignError>,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DesignError {
    /// Transport failures, non-2xx responses, timeouts and unreadable bodies.
    pub fn is_network_or_server(&self) -> bool {
        matches!(
            self,
            DesignError::Transport(_)
                | DesignError::Server { .. }
                | DesignError::Timeout
                | DesignError::Decode(_)
        )
    }

    pub(crate) fn optimistic(action: &'static str, id: &str, source: DesignError) -> Self {
        DesignError::OptimisticUpdate { action, id: id.to_string(), source: Box::new(source) }
    }
}

pub type Result<T, E = DesignError> = std::result::Result<T, E>;
