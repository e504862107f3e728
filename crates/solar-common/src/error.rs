//! Error types for the solar overlay pipeline.

use thiserror::Error;

/// Result type alias using SolarError.
pub type SolarResult<T> = Result<T, SolarError>;

/// Primary error type for raster acquisition, decoding and rendering.
///
/// Errors are never retried or swallowed inside the pipeline; whatever the
/// upstream reported travels to the caller intact.
#[derive(Debug, Error)]
pub enum SolarError {
    // === Acquisition Errors ===
    /// Transport failure or non-success HTTP status. `payload` is the body
    /// returned by the remote service, unmodified.
    #[error("failed to fetch {url}: {payload}")]
    Fetch {
        url: String,
        status: Option<u16>,
        payload: String,
    },

    /// Error response from the Solar API glue endpoints.
    #[error("solar API request failed with status {status}: {payload}")]
    Api { status: u16, payload: String },

    // === Data Errors ===
    #[error("invalid raster payload: {0}")]
    Decode(String),

    #[error("reprojection failed: {0}")]
    Reprojection(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    // === Request Errors ===
    #[error("invalid layer id '{requested}'; available types are: {valid}")]
    InvalidLayer { requested: String, valid: String },

    #[error("invalid value range: {0}")]
    Arithmetic(String),

    #[error("invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

impl SolarError {
    pub fn fetch(url: impl Into<String>, status: Option<u16>, payload: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            status,
            payload: payload.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn reprojection(msg: impl Into<String>) -> Self {
        Self::Reprojection(msg.into())
    }

    pub fn arithmetic(msg: impl Into<String>) -> Self {
        Self::Arithmetic(msg.into())
    }

    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// HTTP status a glue layer should answer with for this error.
    ///
    /// Upstream statuses are passed through so the caller sees what the
    /// provider reported (e.g. 404 when no imagery covers the location).
    pub fn http_status_code(&self) -> u16 {
        match self {
            SolarError::Fetch {
                status: Some(status),
                ..
            } => *status,
            SolarError::Api { status, .. } => *status,
            SolarError::Fetch { status: None, .. } => 502,

            SolarError::InvalidLayer { .. } | SolarError::InvalidParameter { .. } => 400,

            SolarError::Decode(_)
            | SolarError::Reprojection(_)
            | SolarError::Encode(_)
            | SolarError::Arithmetic(_) => 500,
        }
    }
}

impl From<std::io::Error> for SolarError {
    fn from(err: std::io::Error) -> Self {
        SolarError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for SolarError {
    fn from(err: serde_json::Error) -> Self {
        SolarError::Decode(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_keeps_payload() {
        let payload = r#"{"error":{"code":404,"message":"Requested entity was not found."}}"#;
        let err = SolarError::fetch("https://solar.googleapis.com/v1/geoTiff:get?id=x", Some(404), payload);

        assert!(err.to_string().contains(payload));
        assert_eq!(err.http_status_code(), 404);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(SolarError::fetch("u", None, "connection refused").http_status_code(), 502);
        assert_eq!(SolarError::decode("bad").http_status_code(), 500);
        assert_eq!(
            SolarError::invalid_parameter("month", "out of range").http_status_code(),
            400
        );
    }
}
