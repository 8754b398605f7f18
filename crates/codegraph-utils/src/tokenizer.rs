//! Token counting for the indexing pipeline's token-aware chunking.
//!
//! Uses `cl100k_base`, the same BPE used by OpenAI's embedding and chat
//! models, so `chunk_max_tokens`/`chunk_overlap_tokens` budgets line up
//! with what the embedding provider actually bills and truncates on.

use tiktoken_rs::CoreBPE;

/// A reusable BPE token counter.
///
/// Construction loads the `cl100k_base` merge table, so callers should
/// build one `TokenCounter` per pipeline run rather than per chunk.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Load the `cl100k_base` encoder.
    ///
    /// # Panics
    ///
    /// Panics if the bundled merge table fails to load, which would
    /// indicate a corrupted `tiktoken-rs` install rather than a runtime
    /// condition callers can recover from.
    #[must_use]
    pub fn new() -> Self {
        let bpe = tiktoken_rs::cl100k_base().expect("cl100k_base BPE table must load");
        Self { bpe }
    }

    /// Number of tokens `text` encodes to.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Split `text` into line-wise sub-chunks so that each encodes to at
    /// most `max_tokens` tokens, carrying the last `overlap_tokens` worth
    /// of lines from the end of each chunk into the start of the next.
    ///
    /// Returns a single-element vector unchanged if `text` already fits.
    #[must_use]
    pub fn split_with_overlap(&self, text: &str, max_tokens: usize, overlap_tokens: usize) -> Vec<String> {
        if self.count(text) <= max_tokens {
            return vec![text.to_owned()];
        }

        let lines: Vec<&str> = text.lines().collect();
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;
        let mut idx = 0usize;

        while idx < lines.len() {
            let line = lines[idx];
            let line_tokens = self.count(line);

            if !current.is_empty() && current_tokens + line_tokens > max_tokens {
                chunks.push(current.join("\n"));
                if current.len() == 1 && current_tokens > max_tokens {
                    // `current` is a single line that alone exceeds the budget
                    // (e.g. a minified bundle). Carrying it over would just
                    // regenerate the same over-budget chunk forever, so drop
                    // it and let the next line start a fresh chunk.
                    current = Vec::new();
                    current_tokens = 0;
                } else {
                    current = carry_over(&current, overlap_tokens, |s| self.count(s));
                    current_tokens = current.iter().map(|s| self.count(s)).sum();
                }
                continue;
            }

            current.push(line);
            current_tokens += line_tokens;
            idx += 1;
        }

        if !current.is_empty() {
            chunks.push(current.join("\n"));
        }

        chunks
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Return the trailing lines of `lines` whose combined token count is
/// closest to (without exceeding) `overlap_tokens`, read from the end.
fn carry_over<'a>(lines: &[&'a str], overlap_tokens: usize, count: impl Fn(&str) -> usize) -> Vec<&'a str> {
    let mut carried = Vec::new();
    let mut total = 0usize;

    for line in lines.iter().rev() {
        let tokens = count(line);
        if total + tokens > overlap_tokens && !carried.is_empty() {
            break;
        }
        carried.push(*line);
        total += tokens;
    }

    carried.reverse();
    carried
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_in_one_chunk_when_under_budget() {
        let counter = TokenCounter::new();
        let chunks = counter.split_with_overlap("fn main() {}", 1000, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "fn main() {}");
    }

    #[test]
    fn splits_long_text_into_multiple_chunks_under_the_limit() {
        let counter = TokenCounter::new();
        let body: String = (0..500).map(|i| format!("let line_{i} = {i};\n")).collect();
        let chunks = counter.split_with_overlap(&body, 50, 10);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(counter.count(chunk) <= 50 + 10, "chunk exceeded budget plus carry-over slack");
        }
    }

    #[test]
    fn oversized_single_line_followed_by_another_line_does_not_hang() {
        let counter = TokenCounter::new();
        let giant_line: String = (0..2000).map(|i| format!("token_{i} ")).collect();
        let body = format!("{giant_line}\ntrailing line\n");

        let chunks = counter.split_with_overlap(&body, 50, 10);

        assert!(chunks.len() >= 2);
        assert!(chunks.iter().any(|c| c.contains("trailing line")));
    }

    #[test]
    fn consecutive_chunks_share_carried_over_lines() {
        let counter = TokenCounter::new();
        let body: String = (0..200).map(|i| format!("value_{i}\n")).collect();
        let chunks = counter.split_with_overlap(&body, 30, 15);

        assert!(chunks.len() >= 2);
        let first_last_line = chunks[0].lines().last().unwrap();
        assert!(chunks[1].lines().any(|line| line == first_last_line));
    }
}
