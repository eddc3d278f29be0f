//! Recursive character text splitting
//!
//! Text is split on the first separator in `["\n\n", "\n", " ", ""]` that occurs in it,
//! pieces that are still too large are split again with the remaining separators, and
//! small pieces are merged back together up to `chunk_size` characters while carrying
//! roughly `chunk_overlap` characters from the end of one chunk into the next.
//! Separators stay attached to the start of the piece that follows them.

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Chunk, Document};

const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Text chunker with configurable size and overlap (both in characters)
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        if overlap >= chunk_size {
            tracing::warn!(
                "chunk overlap {} is not smaller than chunk size {}, clamping",
                overlap,
                chunk_size
            );
        }
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Split every page record into chunks
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.chunk_document(doc)).collect()
    }

    /// Split a single page record into chunks
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        self.split_text(&doc.content)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(doc, i as u32, text))
            .collect()
    }

    /// Split raw text into chunk strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Pick the first separator present in the text; "" always matches
        let (separator, remaining) = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
            .map(|i| (separators[i], &separators[i + 1..]))
            .unwrap_or(("", &[][..]));

        let mut chunks = Vec::new();
        let mut good_splits: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                if let Some(piece) = trimmed(piece) {
                    chunks.push(piece);
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            chunks.extend(self.merge_splits(&good_splits));
        }

        chunks
    }

    /// Greedily merge small pieces into chunks, keeping an overlapping tail
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: std::collections::VecDeque<(&str, usize)> = Default::default();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_window(&window) {
                    chunks.push(chunk);
                }

                // Drop from the front until only the overlap remains and the next piece fits
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if let Some(chunk) = join_window(&window) {
            chunks.push(chunk);
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn trimmed(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn join_window(window: &std::collections::VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    trimmed(&joined)
}

/// Split on `separator`, attaching each separator to the start of the following piece.
/// The empty separator splits into grapheme clusters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.graphemes(true).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a\n\nb\n\nc", "\n\n"),
            vec!["a", "\n\nb", "\n\nc"]
        );
        assert_eq!(split_keeping_separator("\n\nlead", "\n\n"), vec!["\n\nlead"]);
        assert_eq!(split_keeping_separator("héllo", ""), vec!["h", "é", "l", "l", "o"]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(1000, 200);
        let chunks = chunker.split_text("  Revenue grew 6.8% year on year.  ");
        assert_eq!(chunks, vec!["Revenue grew 6.8% year on year."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = TextChunker::default();
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text(" \n\n \n ").is_empty());
    }

    #[test]
    fn test_paragraphs_merge_until_full() {
        let chunker = TextChunker::new(8, 0);
        let chunks = chunker.split_text("aaaa\n\nbbbb\n\ncccc");
        assert_eq!(chunks, vec!["aaaa", "bbbb", "cccc"]);

        let chunker = TextChunker::new(12, 0);
        let chunks = chunker.split_text("aaaa\n\nbbbb\n\ncccc");
        assert_eq!(chunks, vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn test_words_overlap() {
        let chunker = TextChunker::new(10, 5);
        let chunks = chunker.split_text("one two three four five");
        assert_eq!(chunks, vec!["one two", "two three", "four five"]);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let chunker = TextChunker::new(4, 0);
        let chunks = chunker.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunk_document_keeps_source() {
        let chunker = TextChunker::new(8, 0);
        let doc = Document::new("tcs.pdf", Some(4), "aaaa\n\nbbbb\n\ncccc");
        let chunks = chunker.chunk_document(&doc);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.source == "tcs.pdf" && c.page == Some(4)));
        assert_eq!(
            chunks.iter().map(|c| c.chunk_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    proptest! {
        #[test]
        fn chunks_never_exceed_size(text in "[a-z \\n]{0,400}", size in 5usize..60, overlap in 0usize..30) {
            let chunker = TextChunker::new(size, overlap);
            for chunk in chunker.split_text(&text) {
                prop_assert!(char_len(&chunk) <= size, "chunk {:?} longer than {}", chunk, size);
                prop_assert!(!chunk.is_empty());
                prop_assert_eq!(chunk.trim(), chunk.as_str());
            }
        }

        #[test]
        fn every_word_survives(words in proptest::collection::vec("[a-z]{1,8}", 1..40)) {
            let text = words.join(" ");
            let chunker = TextChunker::new(20, 5);
            let joined = chunker.split_text(&text).join(" ");
            for word in &words {
                prop_assert!(joined.contains(word.as_str()));
            }
        }
    }
}
