use regex::Regex;

// Emoticons first so ":)" is not split into punctuation.
const TOKEN_PATTERN: &str = r"(?x)
    [:;=][\-o\*']?[\)\]\(\[dp/\\\|@3]+   # emoticons, input is lowercased
  | [\)\(]{2,}                              # bracket runs, common in chat
  | [\p{L}\p{N}]+(?:[\-'][\p{L}\p{N}]+)*    # words with inner hyphens or apostrophes
  | [!?]+                                   # emphasis
";

/// Lowercasing regex tokenizer for chat messages.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    re: Regex,
}

impl RegexTokenizer {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            re: Regex::new(TOKEN_PATTERN)?,
        })
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.re
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Unigrams followed by word n-grams up to `n`, joined with a space.
    pub fn features(&self, text: &str, n: usize) -> Vec<String> {
        let tokens = self.tokenize(text);
        let mut out = tokens.clone();
        for size in 2..=n.max(1) {
            for window in tokens.windows(size) {
                out.push(window.join(" "));
            }
        }
        out
    }
}
