/// Code fence marker.
pub const FENCE: &str = "```";

/// Openers longer than this are re-inserted as a bare [`FENCE`].
pub const MAX_OPENER_LEN: usize = 24;

/// Characters held back per chunk for a re-inserted opener line plus an
/// appended closer.
pub const FENCE_RESERVE: usize = 32;

fn is_fence_line(line: &str) -> bool {
    line.trim_start_matches([' ', '\t']).starts_with(FENCE)
}

/// Scans `text` line by line from outside any fence. Returns the opener
/// line of the fence still open at the end, if any.
fn open_fence(text: &str) -> Option<&str> {
    let mut open = None;
    for line in text.split('\n') {
        if is_fence_line(line) {
            open = match open {
                Some(_) => None,
                None => Some(line.trim()),
            };
        }
    }
    open
}

/// Whether any line of `text` is a fence line.
pub(crate) fn contains_fence(text: &str) -> bool {
    text.split('\n').any(is_fence_line)
}

/// Whether `text` leaves a code fence open.
pub fn ends_inside_fence(text: &str) -> bool {
    open_fence(text).is_some()
}

fn reopener(opener: &str) -> String {
    if opener.chars().count() > MAX_OPENER_LEN {
        FENCE.to_string()
    } else {
        opener.to_string()
    }
}

/// Repairs fences across a sequence of chunks, left to right.
///
/// A chunk that starts inside a fence gets the opener prepended; a chunk
/// that ends inside one gets a closing fence appended and the open state
/// carries into the next chunk.
pub fn rebalance_fences(chunks: Vec<String>) -> Vec<String> {
    let mut carried: Option<String> = None;

    chunks
        .into_iter()
        .map(|chunk| {
            let mut text = String::with_capacity(chunk.len() + FENCE_RESERVE);
            if let Some(opener) = carried.take() {
                text.push_str(&opener);
                if !chunk.starts_with('\n') {
                    text.push('\n');
                }
            }
            text.push_str(&chunk);

            carried = open_fence(&text).map(reopener);
            if carried.is_some() {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(FENCE);
            }
            text
        })
        .collect()
}
