//! Line-aware splitting of long messages into bounded chunks.
//!
//! Messages headed for a chat webhook have a hard length limit. This crate
//! cuts long text on line boundaries and then repairs fenced code blocks
//! (```` ``` ````) that a cut left open, so every chunk renders on its own:
//!
//! ```text
//! "```js\na\nb\nc\n```"  --split-->  "```js\na"  "\nb"  "\nc\n```"
//!                      --rebalance--> "```js\na\n```"  "```js\nb\n```"  "```js\nc\n```"
//! ```
//!
//! Lengths are counted in `char`s and cuts never land inside a character.

mod error;
mod fence;
mod seam;
mod split;

pub use error::{SplitError, SplitResult};
pub use fence::{ends_inside_fence, rebalance_fences, FENCE, FENCE_RESERVE, MAX_OPENER_LEN};
pub use seam::{normalize_seams, DEFAULT_FENCE_LANG};
pub use split::{BalancedSplitter, Splitter, DEFAULT_MAX_CHUNK_LEN};
