use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());

/// Splits `text` into fragments of at most `max_size` characters.
///
/// Fragments break on whitespace runs, and the run at a break is not kept in
/// either neighbour. Whitespace inside a fragment is preserved as-is. A word
/// longer than `max_size` is cut into `max_size`-character pieces. Text that
/// already fits is returned whole; blank text yields no fragments.
pub fn split(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut gap_start = 0;

    for word in WORD.find_iter(text) {
        let gap = &text[gap_start..word.start()];
        gap_start = word.end();
        let word_len = word.as_str().chars().count();

        if !current.is_empty() {
            let gap_len = gap.chars().count();
            if current_len + gap_len + word_len <= max_size {
                current.push_str(gap);
                current.push_str(word.as_str());
                current_len += gap_len + word_len;
                continue;
            }
            chunks.push(std::mem::take(&mut current));
        }

        if word_len <= max_size {
            current.push_str(word.as_str());
            current_len = word_len;
        } else {
            let chars: Vec<char> = word.as_str().chars().collect();
            let mut pieces: Vec<String> = chars
                .chunks(max_size)
                .map(|piece| piece.iter().collect())
                .collect();
            // the tail piece may still absorb following words
            let tail = pieces.pop().unwrap_or_default();
            chunks.extend(pieces);
            current_len = tail.chars().count();
            current = tail;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
