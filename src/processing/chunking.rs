//! Fixed-size character chunking with overlap.
//!
//! Text is cut purely on character count (Unicode scalar values), ignoring token, word and
//! sentence boundaries. Each window starts `chunk_size - chunk_overlap` characters after the
//! previous one, so the last `chunk_overlap` characters of a full chunk reappear at the head
//! of the next. The final window is the first one that reaches the end of the text.

use super::types::ChunkingError;

/// Character splitter configured with a window size and overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Validate and build a splitter; overlap must be strictly smaller than the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: chunk_overlap,
                chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by adjacent chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into overlapping windows.
    ///
    /// Returns an empty vector when the input is empty or whitespace only.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every character plus the end of the string.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = offsets.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::with_capacity(char_count / step + 1);
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(text[offsets[start]..offsets[end]].to_string());
            if end == char_count {
                break;
            }
            start += step;
        }
        chunks
    }
}

/// Concatenate page texts in order, separated by a newline.
pub fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(len: usize) -> String {
        "abcdefghijklmnopqrstuvwxyz0123456789"
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            TextSplitter::new(0, 0),
            Err(ChunkingError::InvalidChunkSize)
        );
        assert_eq!(
            TextSplitter::new(100, 100),
            Err(ChunkingError::OverlapTooLarge {
                overlap: 100,
                chunk_size: 100
            })
        );
        assert!(TextSplitter::new(100, 99).is_ok());
    }

    #[test]
    fn three_thousand_characters_yield_eight_chunks() {
        let splitter = TextSplitter::new(512, 100).unwrap();
        let chunks = splitter.split(&sample_text(3000));
        assert_eq!(chunks.len(), 8);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 512));
        assert_eq!(chunks.last().unwrap().chars().count(), 3000 - 7 * 412);
    }

    #[test]
    fn adjacent_chunks_share_overlap() {
        let splitter = TextSplitter::new(50, 12).unwrap();
        let chunks = splitter.split(&sample_text(517));
        for pair in chunks.windows(2) {
            let previous: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(previous[previous.len() - 12..], next[..12]);
        }
    }

    #[test]
    fn splitting_is_deterministic() {
        let splitter = TextSplitter::new(64, 16).unwrap();
        let text = sample_text(1000);
        assert_eq!(splitter.split(&text), splitter.split(&text));
    }

    #[test]
    fn zero_overlap_partitions_text() {
        let splitter = TextSplitter::new(7, 0).unwrap();
        let text = sample_text(30);
        let chunks = splitter.split(&text);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::new(512, 100).unwrap();
        assert_eq!(splitter.split("short page"), vec!["short page".to_string()]);
    }

    #[test]
    fn blank_text_yields_nothing() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split(" \n\t ").is_empty());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let splitter = TextSplitter::new(4, 1).unwrap();
        let chunks = splitter.split("héllo wörld");
        assert_eq!(chunks, vec!["héll", "lo w", "wörl", "ld"]);
    }

    #[test]
    fn pages_are_joined_in_order() {
        let pages = vec!["first".to_string(), "second".to_string()];
        assert_eq!(join_pages(&pages), "first\nsecond");
    }
}
