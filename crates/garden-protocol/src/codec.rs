//! Line-based codec for the sensor stream.
//!
//! The board prints one message per line terminated with `\n` (Arduino's
//! `println` adds `\r\n`, which is handled by trimming). Reads from a serial
//! port arrive in arbitrary chunks, so bytes are accumulated until a newline
//! shows up.

use bytes::{Buf, BytesMut};

/// Initial buffer capacity. The buffer grows as needed; there is no upper bound.
pub const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Line delimiter used by the board.
pub const LINE_DELIMITER: u8 = b'\n';

/// A codec that splits a byte stream into trimmed text lines.
///
/// Bytes are buffered raw and decoded one line at a time, so a multi-byte
/// character split across two reads is reassembled before decoding. Trailing
/// text without a newline stays buffered for the next [`push`](Self::push).
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode one complete line from the buffer.
    ///
    /// Returns the whitespace-trimmed text before the next newline and removes
    /// it (newline included) from the buffer, or `None` if no complete line is
    /// buffered yet. Lines that are empty after trimming are still returned.
    pub fn decode_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == LINE_DELIMITER)?;

        let line_data = self.buffer.split_to(end);
        self.buffer.advance(1);

        let line = String::from_utf8_lossy(&line_data).trim().to_string();
        log::trace!("decoded line {:?} ({} bytes still buffered)", line, self.buffer.len());
        Some(line)
    }

    /// Push a chunk and return every line it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.push(chunk);
        let mut lines = Vec::new();
        while let Some(line) = self.decode_line() {
            lines.push(line);
        }
        lines
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer, dropping any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the current buffer contents as a string (for debugging).
    pub fn buffer_as_str(&self) -> String {
        String::from_utf8_lossy(&self.buffer).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line() {
        let mut codec = LineCodec::new();
        codec.push(b"512,300,1\n700,400,0\n");

        assert_eq!(codec.decode_line(), Some("512,300,1".to_string()));
        assert_eq!(codec.decode_line(), Some("700,400,0".to_string()));
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_partial_line_stays_buffered() {
        let mut codec = LineCodec::new();
        codec.push(b"512,3");

        assert!(codec.decode_line().is_none());
        assert_eq!(codec.buffer_as_str(), "512,3");

        codec.push(b"00,1\n");
        assert_eq!(codec.decode_line(), Some("512,300,1".to_string()));
    }

    #[test]
    fn test_crlf_is_trimmed() {
        let mut codec = LineCodec::new();
        let lines = codec.feed(b"  1,2,0\r\n");
        assert_eq!(lines, vec!["1,2,0".to_string()]);
    }

    #[test]
    fn test_empty_lines_are_emitted() {
        let mut codec = LineCodec::new();
        let lines = codec.feed(b"\n\r\n1,2,3\n");
        assert_eq!(lines, vec!["".to_string(), "".to_string(), "1,2,3".to_string()]);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let mut codec = LineCodec::new();
        let text = "température\n".as_bytes();
        // Split inside the two-byte 'é'
        let split = 5;
        assert!(codec.feed(&text[..split]).is_empty());
        assert_eq!(codec.feed(&text[split..]), vec!["température".to_string()]);
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let stream = b"512,300,1\n700,400,0\r\ngarbage\n\n1023,0,1\npartial";

        let mut whole = LineCodec::new();
        let expected = whole.feed(stream);
        assert_eq!(expected.len(), 5);

        for chunk_size in 1..stream.len() {
            let mut codec = LineCodec::new();
            let mut lines = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                lines.extend(codec.feed(chunk));
            }
            assert_eq!(lines, expected, "chunk size {}", chunk_size);
            assert_eq!(codec.buffer_as_str(), "partial");
        }
    }

    #[test]
    fn test_clear_drops_partial_line() {
        let mut codec = LineCodec::new();
        codec.push(b"12,3");
        codec.clear();
        assert_eq!(codec.buffered_len(), 0);
        assert_eq!(codec.feed(b"4,5,6\n"), vec!["4,5,6".to_string()]);
    }
}
