//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes are buffered until a blank-line frame delimiter appears, so a
//! multi-byte UTF-8 character split across two network chunks is only decoded
//! once the frame is complete and never corrupts.

/// One framed server-sent event before payload interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` line, when present.
    pub event: Option<String>,
    /// Concatenated `data:` line contents (prefix stripped, trimmed).
    pub data: String,
}

/// Stateful chunk-to-frame decoder.
///
/// Feed raw response chunks with [`SseDecoder::push_chunk`]; complete frames
/// are returned in arrival order and any trailing partial frame is retained
/// for the next chunk.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf) {
            let frame_bytes = self.buf[..idx].to_vec();
            self.buf.drain(..idx + delim_len);
            if let Some(frame) = parse_frame(&frame_bytes) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn find_frame_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len()
            && buf[i] == b'\r'
            && buf[i + 1] == b'\n'
            && buf[i + 2] == b'\r'
            && buf[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

fn parse_frame(bytes: &[u8]) -> Option<SseFrame> {
    if bytes.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(bytes);
    let mut event: Option<String> = None;
    let mut data = String::new();
    for raw_line in text.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data.push_str(rest.trim());
        }
        // Lines matching neither prefix are ignored.
    }
    if event.is_none() && data.is_empty() {
        return None;
    }
    Some(SseFrame { event, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_complete_frame() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"event: delta\ndata: {\"text\":\"hi\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("delta"));
        assert_eq!(frames[0].data, "{\"text\":\"hi\"}");
    }

    #[test]
    fn retains_partial_frame_across_chunk_boundaries() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(b"event: delta\ndata: {\"text\":\"hel").is_empty());
        let frames = decoder.push_chunk(b"lo\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"text\":\"hello\"}");
    }

    #[test]
    fn multibyte_utf8_split_across_chunks_decodes_correctly() {
        // U+D55C (한) is 0xED 0x95 0x9C; split mid-character.
        let full = "event: delta\ndata: {\"text\":\"한\"}\n\n".as_bytes();
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(&full[..20]).is_empty());
        let frames = decoder.push_chunk(&full[20..]);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].data.contains('한'));
    }

    #[test]
    fn concatenates_multiple_data_lines() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"event: delta\ndata: {\"text\":\ndata: \"x\"}\n\n");
        assert_eq!(frames[0].data, "{\"text\":\"x\"}");
    }

    #[test]
    fn ignores_comments_and_malformed_lines() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b": keepalive\nnonsense line\nevent: end\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("end"));
        assert_eq!(frames[0].data, "{}");
    }

    #[test]
    fn handles_crlf_delimiters() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"event: end\r\ndata: {}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("end"));
    }

    #[test]
    fn splits_multiple_frames_in_one_chunk() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("a"));
        assert_eq!(frames[1].event.as_deref(), Some("b"));
    }

    #[test]
    fn empty_frames_between_delimiters_are_skipped() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"\n\nevent: end\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
    }
}
