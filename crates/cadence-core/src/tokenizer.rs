//! Token counting is an opaque dependency behind a single interface —
//! phases that need exact BPE counts inject their own `TokenCounter`.

pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str, encoding_hint: Option<&str>) -> usize;
}

/// Character-count heuristic, banded by encoding hint. Good enough for
/// budget bookkeeping (`token_usage` vs. `token_limit`); not a substitute
/// for a real tokenizer when exactness matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str, encoding_hint: Option<&str>) -> usize {
        let chars_per_token: f64 = match encoding_hint {
            Some("cl100k_base") | Some("o200k_base") => 4.0,
            Some("gpt2") | Some("r50k_base") => 3.5,
            _ => 4.0,
        };
        ((text.chars().count() as f64) / chars_per_token).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_tokens() {
        let counter = HeuristicTokenCounter;
        assert_eq!(counter.count_tokens("", None), 0);
    }

    #[test]
    fn longer_text_counts_more_tokens() {
        let counter = HeuristicTokenCounter;
        let short = counter.count_tokens("hello", None);
        let long = counter.count_tokens(&"hello world ".repeat(50), None);
        assert!(long > short);
    }

    #[test]
    fn encoding_hint_changes_the_ratio() {
        let counter = HeuristicTokenCounter;
        let text = "a".repeat(100);
        let cl100k = counter.count_tokens(&text, Some("cl100k_base"));
        let gpt2 = counter.count_tokens(&text, Some("gpt2"));
        assert!(gpt2 >= cl100k);
    }
}
