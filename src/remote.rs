use crate::api::ApiResponse;
use crate::errors::FetchError;

/// Remotely loaded value: not loaded yet, loaded, or failed with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remote<T> {
    Pending,
    Loaded(T),
    Failed(String),
}

impl<T> Default for Remote<T> {
    fn default() -> Self {
        Remote::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent<T> {
    Issued,
    Resolved(Result<T, FetchError>),
}

impl<T> Remote<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Remote::Pending)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Remote::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Remote::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Next state given an event and whether its scope was still the live one.
    /// Events from dead scopes leave the state untouched.
    pub fn transition(self, event: RemoteEvent<T>, accepted: bool) -> Self {
        if !accepted {
            return self;
        }
        match event {
            RemoteEvent::Issued => Remote::Pending,
            RemoteEvent::Resolved(Ok(value)) => Remote::Loaded(value),
            RemoteEvent::Resolved(Err(err)) => Remote::Failed(err.to_string()),
        }
    }
}

/// Whether a parameter change starts a new fetch scope.
pub fn needs_refetch<P: PartialEq>(previous: &P, next: &P) -> bool {
    previous != next
}

/// Picks the expected variant out of a response; any other variant is a decode failure.
pub fn narrow<T>(
    result: Result<ApiResponse, FetchError>,
    pick: impl FnOnce(ApiResponse) -> Result<T, ApiResponse>,
) -> Result<T, FetchError> {
    pick(result?).map_err(|other| FetchError::Decode(format!("unexpected response: {other:?}")))
}
