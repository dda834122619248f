//! Label normalization and word-prefix matching.
//!
//! Flow steps reference diagram nodes by label. Rendered labels often carry
//! decoration the author of a step leaves out (emoji, extra words, different
//! case), so a step label matches a rendered label when, after normalization,
//! its words are a word-for-word prefix of the rendered label's words:
//!
//! - `"Client"` matches `"Client React SPA"`
//! - `"client"` matches `"🖥️ Client Browser"`
//! - `"Chat"` does not match `"Channels Group Chat"`

/// Returns whether a character is an emoji glyph or an emoji joiner/modifier.
fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF   // pictographs, emoticons, transport, flags
        | 0x00A9 | 0x00AE   // copyright and registered signs
        | 0x203C | 0x2049
        | 0x2122 | 0x2139   // trade mark and information source
        | 0x2194..=0x2199   // arrows
        | 0x21A9..=0x21AA
        | 0x24C2
        | 0x25AA..=0x25AB | 0x25B6 | 0x25C0 | 0x25FB..=0x25FE
        | 0x2300..=0x23FF   // technical symbols such as watches and hourglasses
        | 0x2600..=0x27BF   // miscellaneous symbols and dingbats
        | 0x2B00..=0x2BFF   // stars, squares and arrows
        | 0x3030 | 0x303D | 0x3297 | 0x3299
        | 0x200D            // zero width joiner
        | 0x20E3            // combining keycap
        | 0xFE00..=0xFE0F   // variation selectors
        | 0xE0020..=0xE007F // tag sequences
    )
}

/// Normalizes a label: strips emoji, lower-cases, and collapses whitespace.
pub fn normalize(label: &str) -> String {
    tokens(label).join(" ")
}

/// Splits a label into normalized words.
pub fn tokens(label: &str) -> Vec<String> {
    let stripped: String = label.chars().filter(|c| !is_emoji(*c)).collect();
    stripped
        .trim()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Returns whether `query` is a word-for-word prefix of `candidate`.
///
/// An empty query matches nothing.
pub fn matches_prefix(query: &str, candidate: &str) -> bool {
    LabelQuery::new(query).matches(candidate)
}

/// A normalized step label, reusable across many candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelQuery {
    raw: String,
    tokens: Vec<String>,
}

impl LabelQuery {
    /// Normalizes and tokenizes a query label.
    pub fn new(label: &str) -> Self {
        Self {
            raw: label.to_owned(),
            tokens: tokens(label),
        }
    }

    /// Returns the label as authored.
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns whether the label has no words after normalization.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns whether this query is a word-for-word prefix of `candidate`.
    pub fn matches(&self, candidate: &str) -> bool {
        if self.is_empty() {
            return false;
        }

        let candidate = tokens(candidate);
        candidate.len() >= self.tokens.len()
            && self.tokens.iter().zip(&candidate).all(|(q, c)| q == c)
    }

    /// Returns the index of the first matching candidate, in iteration order.
    pub fn find<'a, I>(&self, candidates: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates
            .into_iter()
            .position(|candidate| self.matches(candidate))
    }
}
