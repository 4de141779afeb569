//! Video codec prioritization
//!
//! A browser lists the payload types it offers for video on the `m=video`
//! line, most preferred first. Moving a codec's payload type to the front
//! makes the answering side pick it.

use super::rewrite_lines;

/// Codec order used when no priority is configured
pub const DEFAULT_CODEC_PRIORITY: [&str; 3] = ["H264", "VP8", "VP9"];

/// Payload type of the first `a=rtpmap:<pt> <codec>/<clock>` line for `codec`
///
/// The codec name is matched case-sensitively.
pub fn find_codec_id<'a>(sdp: &'a str, codec: &str) -> Option<&'a str> {
    sdp.lines().find_map(|line| match parse_rtpmap(line) {
        Some((pt, name)) if name == codec => Some(pt),
        _ => None,
    })
}

/// Parse `a=rtpmap:<pt> <name>/<clock>[/<channels>]` into `(pt, name)`
fn parse_rtpmap(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_end_matches('\r').strip_prefix("a=rtpmap:")?;
    let (pt, encoding) = rest.split_once(char::is_whitespace)?;
    if !is_payload_type(pt) {
        return None;
    }

    let (name, clock) = encoding.split_once('/')?;
    if !clock.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    Some((pt, name))
}

fn is_payload_type(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Tokens of an `m=video <port> <proto> <pt>...` line
struct VideoLine<'a> {
    port: &'a str,
    proto: &'a str,
    formats: Vec<&'a str>,
    trailing: Vec<&'a str>,
}

impl<'a> VideoLine<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let mut tokens = line.strip_prefix("m=video ")?.split(' ');

        let port = tokens.next().filter(|t| is_payload_type(t))?;
        let proto = tokens
            .next()
            .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_uppercase() || b == b'/'))?;

        let mut formats = Vec::new();
        let mut trailing = Vec::new();
        for token in tokens {
            if trailing.is_empty() && is_payload_type(token) {
                formats.push(token);
            } else if !token.is_empty() {
                trailing.push(token);
            }
        }

        if formats.is_empty() {
            return None;
        }

        Some(Self {
            port,
            proto,
            formats,
            trailing,
        })
    }

    fn render(&self, formats: &[&str]) -> String {
        let mut line = format!("m=video {} {} {}", self.port, self.proto, formats.join(" "));
        for token in &self.trailing {
            line.push(' ');
            line.push_str(token);
        }
        line
    }
}

/// Move the payload types of preferred codecs to the front of the video line
///
/// Payload types are looked up in priority order; names with no rtpmap are
/// skipped. The remaining payload types of the first `m=video` line follow
/// in their original order. If nothing matches, or there is no video line,
/// the SDP is returned unchanged. Applying this twice gives the same result
/// as applying it once.
pub fn prioritize_video_codecs<S: AsRef<str>>(sdp: &str, priority: &[S]) -> String {
    let mut preferred: Vec<&str> = Vec::with_capacity(priority.len());
    for codec in priority {
        if let Some(pt) = find_codec_id(sdp, codec.as_ref()) {
            if !preferred.contains(&pt) {
                preferred.push(pt);
            }
        }
    }

    if preferred.is_empty() {
        return sdp.to_string();
    }

    let mut done = false;
    rewrite_lines(sdp, |line| {
        if done {
            return None;
        }
        let video = VideoLine::parse(line)?;
        done = true;

        let mut ordered: Vec<&str> = preferred.clone();
        for &pt in &video.formats {
            if !ordered.contains(&pt) {
                ordered.push(pt);
            }
        }

        Some(video.render(&ordered))
    })
}
