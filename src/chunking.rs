//! Sentence-greedy document chunking with word-level overlap.
//!
//! Documents are split on sentence terminators, then sentences are packed
//! greedily into chunks bounded by a character budget. When a chunk closes,
//! the trailing words of the closed chunk seed the next one so neighbouring
//! chunks share context across the boundary.

/// Default chunk budget in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

/// Default overlap target in characters (approximated in words, see
/// [`Chunker::split`]).
pub const DEFAULT_OVERLAP_SIZE: usize = 100;

/// Splits text into overlapping chunks.
///
/// A `Chunker` is cheap to construct and stateless; one instance can be
/// reused across documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunker {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
        }
    }
}

impl Chunker {
    /// Creates a chunker with explicit bounds.
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size,
            overlap_size,
        }
    }

    /// Maximum chunk length in characters. A chunk may still exceed this when
    /// a single sentence alone does.
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Overlap target in characters.
    pub fn overlap_size(&self) -> usize {
        self.overlap_size
    }

    /// Splits `text` into an ordered sequence of chunks.
    ///
    /// The algorithm:
    ///
    /// 1. Split on `.`, `!` and `?`, dropping empty fragments. Each surviving
    ///    sentence is trimmed and normalized with a trailing `.` (original
    ///    terminator identity is lost on purpose).
    /// 2. Pack sentences greedily: a sentence joins the current chunk while
    ///    the result stays within the character budget, otherwise the chunk
    ///    is emitted and a new one starts.
    /// 3. A new chunk is seeded with the trailing words of the one just
    ///    emitted, bounded by `min(overlap_size / 10, word_count / 2)` words.
    ///    The word-count heuristic approximates the character overlap target.
    ///
    /// Whitespace-only input yields an empty sequence. A sentence longer than
    /// the budget becomes its own oversized chunk; sentences are never split.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let sentences: Vec<String> = text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .map(|fragment| format!("{fragment}."))
            .collect();

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in sentences {
            if current.is_empty() {
                current = sentence;
                continue;
            }

            // Budget is in characters, not bytes; +1 for the joining space.
            if current.chars().count() + 1 + sentence.chars().count() <= self.max_chunk_size {
                current.push(' ');
                current.push_str(&sentence);
                continue;
            }

            let overlap = self.overlap_words(&current);
            chunks.push(current);
            current = match overlap {
                Some(seed) => format!("{seed} {sentence}"),
                None => sentence,
            };
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Trailing words of `chunk` used to seed the next chunk.
    fn overlap_words(&self, chunk: &str) -> Option<String> {
        let words: Vec<&str> = chunk.split_whitespace().collect();
        let take = (self.overlap_size / 10).min(words.len() / 2);
        if take == 0 {
            return None;
        }
        Some(words[words.len() - take..].join(" "))
    }
}

/// Convenience wrapper around [`Chunker::split`] with explicit parameters.
pub fn split_text(text: &str, max_chunk_size: usize, overlap_size: usize) -> Vec<String> {
    Chunker::new(max_chunk_size, overlap_size).split(text)
}
