//! Payload-level SDP rewriting policy

use serde_json::Value;

use super::codec::{prioritize_video_codecs, DEFAULT_CODEC_PRIORITY};
use super::error::SdpError;
use super::fmtp::try_cap_opus_bitrate;

/// Codec and bitrate policy applied to relayed session descriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpPolicy {
    /// Preferred video codecs, highest priority first
    pub codec_priority: Vec<String>,

    /// Opus `maxaveragebitrate` in bits/sec (0 = leave untouched)
    pub max_average_bitrate: u64,
}

impl Default for SdpPolicy {
    fn default() -> Self {
        Self {
            codec_priority: DEFAULT_CODEC_PRIORITY.iter().map(|c| c.to_string()).collect(),
            max_average_bitrate: 0,
        }
    }
}

impl SdpPolicy {
    /// Set the video codec priority
    pub fn codec_priority<I, S>(mut self, codecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codec_priority = codecs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the opus average bitrate cap
    pub fn max_average_bitrate(mut self, bitrate: u64) -> Self {
        self.max_average_bitrate = bitrate;
        self
    }
}

/// Applies an [`SdpPolicy`]: codec prioritization, then the bitrate cap
#[derive(Debug, Clone, Default)]
pub struct SdpRewriter {
    policy: SdpPolicy,
}

impl SdpRewriter {
    pub fn new(policy: SdpPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SdpPolicy {
        &self.policy
    }

    /// Rewrite one session description
    pub fn rewrite(&self, sdp: &str) -> Result<String, SdpError> {
        let prioritized = prioritize_video_codecs(sdp, &self.policy.codec_priority);
        try_cap_opus_bitrate(&prioritized, self.policy.max_average_bitrate)
    }

    /// Rewrite `payload.sdp` in place
    ///
    /// Returns whether the payload changed. A payload without an `sdp` field
    /// is left alone. On error the payload is not modified.
    pub fn rewrite_payload(&self, payload: &mut Value) -> Result<bool, SdpError> {
        let rewritten = match payload.get("sdp") {
            None => return Ok(false),
            Some(Value::String(sdp)) => {
                let rewritten = self.rewrite(sdp)?;
                if rewritten == *sdp {
                    return Ok(false);
                }
                rewritten
            }
            Some(_) => return Err(SdpError::NotText),
        };

        payload["sdp"] = Value::String(rewritten);
        Ok(true)
    }
}
