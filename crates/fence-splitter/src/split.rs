use crate::fence::{contains_fence, rebalance_fences, FENCE_RESERVE};
use crate::{SplitError, SplitResult};

/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 1900;

/// Cuts text into chunks of at most `max_len` characters.
///
/// Each chunk is the longest prefix that fits, shortened to end before the
/// last newline inside the bound when there is one. The newline itself
/// starts the following chunk, so concatenating the chunks yields the
/// input unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splitter {
    max_len: usize,
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_CHUNK_LEN,
        }
    }
}

impl Splitter {
    pub fn new(max_len: usize) -> SplitResult<Self> {
        if max_len == 0 {
            return Err(SplitError::ZeroLength);
        }
        Ok(Self { max_len })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Whether `text` fits in a single chunk.
    pub fn fits(&self, text: &str) -> bool {
        text.chars().nth(self.max_len).is_none()
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let (head, tail) = rest.split_at(self.cut_point(rest));
            chunks.push(head.to_string());
            rest = tail;
        }

        chunks
    }

    /// Byte offset at which to cut `rest`. Always greater than zero for
    /// non-empty input.
    fn cut_point(&self, rest: &str) -> usize {
        let Some((bound, _)) = rest.char_indices().nth(self.max_len) else {
            return rest.len();
        };

        if rest[bound..].starts_with('\n') {
            return bound;
        }

        match rest[..bound].rfind('\n') {
            Some(pos) if pos > 0 => pos,
            _ => bound,
        }
    }
}

/// Splitter whose chunks stay within `max_len` characters after fence
/// repair.
///
/// Text containing a fence line is cut with [`FENCE_RESERVE`] characters
/// held back for the markers that [`rebalance_fences`] may add. Text
/// without fences is cut at the full length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancedSplitter {
    full: Splitter,
    reserved: Splitter,
}

impl BalancedSplitter {
    pub fn new(max_len: usize) -> SplitResult<Self> {
        if max_len <= FENCE_RESERVE {
            return Err(SplitError::NoRoomForFences {
                max_len,
                reserve: FENCE_RESERVE,
            });
        }
        Ok(Self {
            full: Splitter::new(max_len)?,
            reserved: Splitter::new(max_len - FENCE_RESERVE)?,
        })
    }

    pub fn max_len(&self) -> usize {
        self.full.max_len()
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        if contains_fence(text) {
            rebalance_fences(self.reserved.split(text))
        } else {
            self.full.split(text)
        }
    }
}
