use std::char::REPLACEMENT_CHARACTER;

/// Incremental UTF-8 decoder for chunked response bodies
///
/// A multi-byte sequence split across two chunks is held back until the rest
/// arrives. Invalid bytes decode to U+FFFD, one per maximal invalid subpart,
/// which matches what a browser `TextDecoder` produces in streaming mode.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` as possible
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush a dangling partial sequence at end of stream
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT_CHARACTER.to_string()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"Halo, "), "Halo, ");
        assert_eq!(decoder.decode(b"dunia"), "dunia");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_multibyte_sequence() {
        // "é" = C3 A9, "🙂" = F0 9F 99 82
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'c', b'a', b'f', 0xC3]), "caf");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&[0xA9, b' ', 0xF0, 0x9F]), "é ");
        assert_eq!(decoder.decode(&[0x99]), "");
        assert_eq!(decoder.decode(&[0x82, b'!']), "🙂!");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_every_split_point() {
        let text = "Selamat pagi ☀️ — naïve café 🙂";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = Utf8Decoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());
            assert_eq!(out, text, "split at byte {}", split);
        }
    }

    #[test]
    fn test_invalid_bytes_become_replacement() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
        // Lone continuation byte
        assert_eq!(decoder.decode(&[0x80, b'c']), "\u{FFFD}c");
    }

    #[test]
    fn test_truncated_sequence_at_end() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }
}
