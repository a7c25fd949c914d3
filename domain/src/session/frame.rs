//! Server-sent-event framing for streamed chat completions.
//!
//! The body of a streaming completion is a sequence of lines. Lines of the
//! form `data: {json}` carry a content delta, `data: [DONE]` ends the
//! stream, and everything else (comments, `event:`/`id:` fields, blank
//! keep-alive lines) is ignored. Network chunks do not respect line or
//! UTF-8 boundaries, so [`FrameDecoder`] buffers bytes until a full line is
//! available.

use serde::Deserialize;

/// Interpretation of one line of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A content fragment to append.
    Delta(String),
    /// End-of-stream sentinel.
    Done,
    /// Valid line with nothing to append.
    Ignored,
    /// A `data:` line whose payload is not a completion chunk.
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct ChunkFrame {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkContent>,
    message: Option<ChunkContent>,
}

#[derive(Debug, Deserialize)]
struct ChunkContent {
    content: Option<String>,
}

/// Parse a single line (without its terminator).
///
/// ```
/// use tutor_domain::session::frame::{Frame, parse_frame};
///
/// let line = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;
/// assert_eq!(parse_frame(line), Frame::Delta("Hi".to_string()));
/// assert_eq!(parse_frame("data: [DONE]"), Frame::Done);
/// assert_eq!(parse_frame(": keep-alive"), Frame::Ignored);
/// ```
pub fn parse_frame(line: &str) -> Frame {
    let line = line.trim_end_matches('\r');
    let Some(data) = line.strip_prefix("data:") else {
        return Frame::Ignored;
    };
    let data = data.trim();
    if data.is_empty() {
        return Frame::Ignored;
    }
    if data == "[DONE]" {
        return Frame::Done;
    }

    let chunk: ChunkFrame = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => return Frame::Malformed(e.to_string()),
    };
    let content = chunk.choices.into_iter().next().and_then(|choice| {
        choice
            .delta
            .and_then(|delta| delta.content)
            .or_else(|| choice.message.and_then(|message| message.content))
    });

    match content {
        Some(text) if !text.is_empty() => Frame::Delta(text),
        _ => Frame::Ignored,
    }
}

/// Reassembles lines from arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|&b| b == b'\n') {
            let line = &self.buffer[consumed..consumed + offset];
            lines.push(String::from_utf8_lossy(line).into_owned());
            consumed += offset + 1;
        }
        self.buffer.drain(..consumed);
        lines
    }

    /// Flush a trailing line that never got its terminator.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Some(line)
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parse_frame ====================

    #[test]
    fn test_delta_and_message_fallback() {
        assert_eq!(
            parse_frame(r#"data:{"choices":[{"delta":{"content":"a"}}]}"#),
            Frame::Delta("a".to_string())
        );
        assert_eq!(
            parse_frame(r#"data: {"choices":[{"message":{"content":"b"}}]}"#),
            Frame::Delta("b".to_string())
        );
    }

    #[test]
    fn test_ignored_lines() {
        for line in [
            "",
            "\r",
            ": comment",
            "event: message",
            "id: 7",
            "data: ",
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[]}"#,
        ] {
            assert_eq!(parse_frame(line), Frame::Ignored, "{line:?}");
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_frame("data: {not json"), Frame::Malformed(_)));
    }

    #[test]
    fn test_done_with_carriage_return() {
        assert_eq!(parse_frame("data: [DONE]\r"), Frame::Done);
    }

    // ==================== FrameDecoder ====================

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"cho").is_empty());
        let lines = decoder.push(b"ices\":[]}\n\ndata: [DO");
        assert_eq!(lines, vec![r#"data: {"choices":[]}"#.to_string(), String::new()]);
        assert_eq!(decoder.push(b"NE]\n"), vec!["data: [DONE]".to_string()]);
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"célula\"}}]}\n";
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1;

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        let lines = decoder.push(&bytes[split..]);
        assert_eq!(parse_frame(&lines[0]), Frame::Delta("célula".to_string()));
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"data: [DONE]");
        assert_eq!(decoder.finish().as_deref(), Some("data: [DONE]"));
        assert_eq!(decoder.finish(), None);
    }
}
