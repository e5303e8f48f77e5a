use thiserror::Error;

use crate::provider::ProviderError;

/// Errors surfaced to callers of the routing engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("MissingParameter: {0}")]
    MissingParameter(String),
    #[error("InvalidParamerer: {0}")]
    InvalidParameter(String),
    #[error(
        "SnappingError: can not link ({lat},{lon}) to the network (max. distance: {max_distance}m)"
    )]
    Snapping {
        lat: f64,
        lon: f64,
        max_distance: f64,
    },
    #[error("CanNotCompute: {0}")]
    CanNotCompute(String),
}

/// Error category as understood by clients of the routing protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingParameter,
    InvalidParameter,
    Snapping,
    CanNotCompute,
}

impl ErrorKind {
    /// Literal transmitted in the `type` field of error responses.
    ///
    /// `InvalidParamerer` is what deployed clients match on.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingParameter => "MissingParameter",
            ErrorKind::InvalidParameter => "InvalidParamerer",
            ErrorKind::Snapping => "SnappingError",
            ErrorKind::CanNotCompute => "CanNotCompute",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingParameter(_) => ErrorKind::MissingParameter,
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Error::Snapping { .. } => ErrorKind::Snapping,
            Error::CanNotCompute(_) => ErrorKind::CanNotCompute,
        }
    }

    /// Message without the kind prefix
    pub fn text(&self) -> String {
        match self {
            Error::MissingParameter(text)
            | Error::InvalidParameter(text)
            | Error::CanNotCompute(text) => text.clone(),
            Error::Snapping {
                lat,
                lon,
                max_distance,
            } => format!(
                "can not link ({lat},{lon}) to the network (max. distance: {max_distance}m)"
            ),
        }
    }

    pub(crate) fn no_path() -> Self {
        Error::CanNotCompute("no path found between the requested points".to_string())
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        Error::CanNotCompute(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_wire_kind() {
        let err = Error::InvalidParameter("from is not a 2D point".to_string());
        assert_eq!(err.to_string(), "InvalidParamerer: from is not a 2D point");
        assert_eq!(err.kind().as_str(), "InvalidParamerer");
        assert_eq!(err.text(), "from is not a 2D point");
    }

    #[test]
    fn snapping_error_names_coordinate_and_threshold() {
        let err = Error::Snapping {
            lat: 46.0,
            lon: 1.5,
            max_distance: 100.0,
        };
        let text = err.to_string();
        assert!(text.starts_with("SnappingError"));
        assert!(text.contains("(46,1.5)"));
        assert!(text.contains("100m"));
    }

    #[test]
    fn provider_failures_become_can_not_compute() {
        let err: Error = ProviderError::UnknownTable("public.nowhere".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::CanNotCompute);
    }
}
