//! SDP negotiation rewriting
//!
//! Pure functions over session-description text. Only the lines being
//! rewritten change; every other line, and every line ending (`\r\n` or
//! `\n`), is copied through byte for byte.
//!
//! - [`prioritize_video_codecs`] reorders the payload types of the first
//!   `m=video` line so preferred codecs come first.
//! - [`cap_opus_bitrate`] sets `maxaveragebitrate` in the opus fmtp line.
//! - [`SdpRewriter`] chains both according to an [`SdpPolicy`] and applies
//!   them to a signaling payload.

pub mod codec;
pub mod error;
pub mod fmtp;
pub mod rewriter;

pub use codec::{find_codec_id, prioritize_video_codecs, DEFAULT_CODEC_PRIORITY};
pub use error::SdpError;
pub use fmtp::{cap_opus_bitrate, set_fmtp_param, try_cap_opus_bitrate, FmtpParams};
pub use rewriter::{SdpPolicy, SdpRewriter};

use std::convert::Infallible;

/// Split a line into its content and its line ending
fn split_ending(line: &str) -> (&str, &str) {
    let content = line.trim_end_matches(&['\r', '\n'][..]);
    (content, &line[content.len()..])
}

/// Rebuild `sdp`, replacing each line for which `f` returns a new content
///
/// Stops at the first error.
fn try_rewrite_lines<E>(
    sdp: &str,
    mut f: impl FnMut(&str) -> Result<Option<String>, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(sdp.len() + 32);

    for line in sdp.split_inclusive('\n') {
        let (content, ending) = split_ending(line);
        match f(content)? {
            Some(replacement) => {
                out.push_str(&replacement);
                out.push_str(ending);
            }
            None => out.push_str(line),
        }
    }

    Ok(out)
}

fn rewrite_lines(sdp: &str, mut f: impl FnMut(&str) -> Option<String>) -> String {
    let result: Result<String, Infallible> = try_rewrite_lines(sdp, |line| Ok(f(line)));
    match result {
        Ok(out) => out,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_preserves_endings() {
        let sdp = "v=0\r\na=x\nb=y";
        let out = rewrite_lines(sdp, |line| (line == "a=x").then(|| "a=z".to_string()));
        assert_eq!(out, "v=0\r\na=z\nb=y");
    }

    #[test]
    fn test_rewrite_identity() {
        let sdp = "v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\n\r\n";
        assert_eq!(rewrite_lines(sdp, |_| None), sdp);
    }

    #[test]
    fn test_try_rewrite_stops_on_error() {
        let result: Result<String, &str> =
            try_rewrite_lines("a\nb\n", |line| if line == "b" { Err("bad") } else { Ok(None) });
        assert_eq!(result, Err("bad"));
    }
}
