//! Format-parameter (fmtp) editing
//!
//! An fmtp line carries codec parameters for one payload type:
//! `a=fmtp:111 minptime=10;useinbandfec=1`. Parameters keep their order;
//! a key that is set for the first time goes last.

use super::codec::find_codec_id;
use super::error::SdpError;
use super::try_rewrite_lines;

/// Ordered `key=value` parameters of an fmtp line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FmtpParams {
    params: Vec<(String, String)>,
}

impl FmtpParams {
    /// Parse a `;`-separated parameter list
    ///
    /// Whitespace around separators is ignored, as are empty entries. An
    /// entry without `=` is rejected.
    pub fn parse(payload_type: &str, config: &str) -> Result<Self, SdpError> {
        let mut params = Vec::new();

        for raw in config.split(';') {
            let param = raw.trim();
            if param.is_empty() {
                continue;
            }

            let (key, value) = param.split_once('=').ok_or_else(|| SdpError::MalformedFmtp {
                payload_type: payload_type.to_string(),
                param: param.to_string(),
            })?;

            params.push((key.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self { params })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite `key` in place, or append it
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.params.push((key.to_string(), value)),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl std::fmt::Display for FmtpParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Split `a=fmtp:<pt> <config>` into `(pt, config)`
fn parse_fmtp_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("a=fmtp:")?;
    match rest.split_once(' ') {
        Some((pt, config)) => Some((pt, config)),
        None => Some((rest, "")),
    }
}

/// Set one parameter on every fmtp line for `payload_type`
///
/// Lines for other payload types are untouched. No fmtp line for the
/// payload type leaves the SDP unchanged.
pub fn set_fmtp_param(
    sdp: &str,
    payload_type: &str,
    key: &str,
    value: &str,
) -> Result<String, SdpError> {
    try_rewrite_lines(sdp, |line| {
        let Some((pt, config)) = parse_fmtp_line(line) else {
            return Ok(None);
        };
        if pt != payload_type {
            return Ok(None);
        }

        let mut params = FmtpParams::parse(pt, config)?;
        params.set(key, value);
        Ok(Some(format!("a=fmtp:{} {}", pt, params)))
    })
}

/// Cap the opus average bitrate, failing on a malformed opus fmtp line
///
/// A cap of 0 disables the rewrite and returns the SDP byte for byte.
pub fn try_cap_opus_bitrate(sdp: &str, max_average_bitrate: u64) -> Result<String, SdpError> {
    if max_average_bitrate == 0 {
        return Ok(sdp.to_string());
    }

    match find_codec_id(sdp, "opus") {
        Some(pt) => set_fmtp_param(
            sdp,
            pt,
            "maxaveragebitrate",
            &max_average_bitrate.to_string(),
        ),
        None => Ok(sdp.to_string()),
    }
}

/// Cap the opus average bitrate, returning the input if it cannot be edited
pub fn cap_opus_bitrate(sdp: &str, max_average_bitrate: u64) -> String {
    try_cap_opus_bitrate(sdp, max_average_bitrate).unwrap_or_else(|_| sdp.to_string())
}
