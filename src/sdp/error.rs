//! SDP rewrite error types

/// Error type for session-description rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdpError {
    /// `payload.sdp` is present but not a string
    NotText,
    /// An fmtp parameter is not of the form `key=value`
    MalformedFmtp {
        payload_type: String,
        param: String,
    },
}

impl std::fmt::Display for SdpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdpError::NotText => write!(f, "Session description is not text"),
            SdpError::MalformedFmtp {
                payload_type,
                param,
            } => write!(
                f,
                "Malformed fmtp parameter for payload {}: {:?}",
                payload_type, param
            ),
        }
    }
}

impl std::error::Error for SdpError {}
