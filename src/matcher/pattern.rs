//! Word-set pattern matching implementation.

use std::collections::HashSet;
use std::str::FromStr;

use serde::Deserialize;

/// How an address is tested against the word set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Both ends of the address, cut at a common word length, are words
    DualEnds,
    /// The address ends with the filler character followed by a word
    SuffixWithPrefixChar,
    /// The address starts or ends with a word
    StartOrEnd,
    /// A word occurs anywhere in the address
    Contains,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dual-ends" | "dualends" | "both" => Ok(MatchMode::DualEnds),
            "suffix-with-prefix-char" | "suffix" | "filler-suffix" => {
                Ok(MatchMode::SuffixWithPrefixChar)
            }
            "start-or-end" | "either" => Ok(MatchMode::StartOrEnd),
            "contains" | "anywhere" | "any" => Ok(MatchMode::Contains),
            _ => Err(format!("Unknown match mode: {}", s)),
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::DualEnds => write!(f, "dual-ends"),
            MatchMode::SuffixWithPrefixChar => write!(f, "suffix-with-prefix-char"),
            MatchMode::StartOrEnd => write!(f, "start-or-end"),
            MatchMode::Contains => write!(f, "contains"),
        }
    }
}

/// The acceptable words, normalized once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSet {
    words: HashSet<String>,
    /// Distinct word lengths, ascending
    lengths: Vec<usize>,
    case_insensitive: bool,
}

impl WordSet {
    /// Builds the set, lowercasing every word when `case_insensitive`.
    pub fn new<I, S>(words: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: HashSet<String> = words
            .into_iter()
            .map(|w| normalize(w.as_ref(), case_insensitive))
            .collect();

        let mut lengths: Vec<usize> = words.iter().map(String::len).collect();
        lengths.sort_unstable();
        lengths.dedup();

        Self {
            words,
            lengths,
            case_insensitive,
        }
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Number of words exactly `len` characters long.
    pub fn count_of_len(&self, len: usize) -> usize {
        self.words.iter().filter(|w| w.len() == len).count()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Applies the set's normalization rule to an address.
    pub fn normalize<'a>(&self, address: &'a str) -> std::borrow::Cow<'a, str> {
        if self.case_insensitive && address.bytes().any(|b| b.is_ascii_uppercase()) {
            std::borrow::Cow::Owned(address.to_ascii_lowercase())
        } else {
            std::borrow::Cow::Borrowed(address)
        }
    }
}

fn normalize(word: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        word.to_ascii_lowercase()
    } else {
        word.to_string()
    }
}

/// A compiled word-set pattern.
///
/// Cloned by value into every worker; matching never mutates it.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    words: WordSet,
    mode: MatchMode,
    filler: char,
}

impl PatternMatcher {
    /// Creates a matcher. `filler` is only consulted by
    /// [`MatchMode::SuffixWithPrefixChar`].
    pub fn new(words: WordSet, mode: MatchMode, filler: char) -> Self {
        let filler = if words.case_insensitive() {
            filler.to_ascii_lowercase()
        } else {
            filler
        };
        Self {
            words,
            mode,
            filler,
        }
    }

    pub fn words(&self) -> &WordSet {
        &self.words
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn filler(&self) -> char {
        self.filler
    }

    /// Tests an address given without its `0x` marker.
    ///
    /// Already-normalized input is compared without copying.
    #[inline]
    pub fn matches(&self, address: &str) -> bool {
        let address = self.words.normalize(address);
        let address = address.as_ref();

        match self.mode {
            MatchMode::DualEnds => self.words.lengths().iter().any(|&len| {
                match (head(address, len), tail(address, len)) {
                    (Some(prefix), Some(suffix)) => {
                        self.words.contains(prefix) && self.words.contains(suffix)
                    }
                    _ => false,
                }
            }),
            MatchMode::SuffixWithPrefixChar => self.words.iter().any(|word| {
                address.len() > word.len()
                    && address.ends_with(word)
                    && address[..address.len() - word.len()].ends_with(self.filler)
            }),
            MatchMode::StartOrEnd => self
                .words
                .iter()
                .any(|word| address.starts_with(word) || address.ends_with(word)),
            MatchMode::Contains => self.words.iter().any(|word| address.contains(word)),
        }
    }

    /// Returns the rough number of attempts expected per match.
    ///
    /// Every hex character has 16 possible values; the shortest words drive
    /// the estimate, twice over for dual-ends. Longer words are rare enough
    /// to be left out.
    pub fn estimated_difficulty(&self) -> u64 {
        let shortest = self.words.lengths().first().copied().unwrap_or(0);
        let count = self.words.count_of_len(shortest).max(1) as u64;

        let single = 16u64.saturating_pow(shortest as u32) / count;
        match self.mode {
            MatchMode::DualEnds => single.saturating_mul(single).max(1),
            MatchMode::SuffixWithPrefixChar => single.saturating_mul(16).max(1),
            MatchMode::StartOrEnd => (single / 2).max(1),
            MatchMode::Contains => (single / 40).max(1),
        }
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        match self.estimated_difficulty() {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

#[inline]
fn head(address: &str, len: usize) -> Option<&str> {
    address.get(..len)
}

#[inline]
fn tail(address: &str, len: usize) -> Option<&str> {
    address.len().checked_sub(len).and_then(|start| address.get(start..))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros(n: usize) -> String {
        "0".repeat(n)
    }

    fn matcher(words: &[&str], mode: MatchMode, case_insensitive: bool) -> PatternMatcher {
        PatternMatcher::new(WordSet::new(words, case_insensitive), mode, 'a')
    }

    #[test]
    fn test_dual_ends_match() {
        let m = matcher(&["DEAD", "BEEF"], MatchMode::DualEnds, false);
        let addr = format!("DEAD{}BEEF", zeros(32));
        assert_eq!(addr.len(), 40);
        assert!(m.matches(&addr));
    }

    #[test]
    fn test_dual_ends_no_match() {
        let m = matcher(&["DEAD", "BEEF"], MatchMode::DualEnds, false);
        let addr = format!("AAAA{}BEEF", zeros(32));
        assert!(!m.matches(&addr));
    }

    #[test]
    fn test_dual_ends_same_word_both_ends() {
        let m = matcher(&["C0DE"], MatchMode::DualEnds, false);
        assert!(m.matches(&format!("C0DE{}C0DE", zeros(32))));
    }

    #[test]
    fn test_dual_ends_requires_common_length() {
        // "DEAD" at the front and "C0FFEE" at the back never share a cut length
        let m = matcher(&["DEAD", "C0FFEE"], MatchMode::DualEnds, false);
        assert!(!m.matches(&format!("DEAD{}C0FFEE", zeros(30))));
    }

    #[test]
    fn test_dual_ends_order_invariant() {
        let words = ["BEEF", "DEAD", "C0FFEE", "B00B", "12345", "F00D"];
        let addrs = [
            format!("DEAD{}BEEF", zeros(32)),
            format!("C0FFEE{}F00D", zeros(30)),
            format!("12345{}C0FFEE", zeros(29)),
            format!("B00B{}12345", zeros(31)),
        ];

        let mut permuted = words;
        for rotation in 0..words.len() {
            permuted.rotate_left(1);
            let mut reversed = permuted;
            reversed.reverse();
            for addr in &addrs {
                let base = matcher(&words, MatchMode::DualEnds, false).matches(addr);
                assert_eq!(matcher(&permuted, MatchMode::DualEnds, false).matches(addr), base);
                assert_eq!(
                    matcher(&reversed, MatchMode::DualEnds, false).matches(addr),
                    base,
                    "rotation {}",
                    rotation
                );
            }
        }
    }

    #[test]
    fn test_case_insensitive_equivalence() {
        let words = ["DeAd", "BEEF", "c0de"];
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let addrs = [
            format!("dEaD{}BeEf", zeros(32)),
            format!("C0DE{}dead", zeros(32)),
            format!("AAAA{}BEEF", zeros(32)),
        ];

        for mode in [
            MatchMode::DualEnds,
            MatchMode::SuffixWithPrefixChar,
            MatchMode::StartOrEnd,
            MatchMode::Contains,
        ] {
            let insensitive = matcher(&words, mode, true);
            let reference =
                PatternMatcher::new(WordSet::new(&lowered, false), mode, 'a');
            for addr in &addrs {
                assert_eq!(
                    insensitive.matches(addr),
                    reference.matches(&addr.to_lowercase()),
                    "{} {}",
                    mode,
                    addr
                );
            }
        }
    }

    #[test]
    fn test_case_sensitive_rejects_wrong_case() {
        let m = matcher(&["DEAD", "BEEF"], MatchMode::DualEnds, false);
        assert!(!m.matches(&format!("dead{}beef", zeros(32))));
    }

    #[test]
    fn test_suffix_with_prefix_char() {
        let m = matcher(&["BEEF", "F00D"], MatchMode::SuffixWithPrefixChar, false);
        assert!(m.matches(&format!("{}aBEEF", zeros(35))));
        assert!(!m.matches(&format!("{}0BEEF", zeros(35))));
        assert!(!m.matches(&format!("{}aBEE0", zeros(35))));
    }

    #[test]
    fn test_suffix_filler_follows_case_rule() {
        let m = PatternMatcher::new(
            WordSet::new(["beef"], true),
            MatchMode::SuffixWithPrefixChar,
            'A',
        );
        assert_eq!(m.filler(), 'a');
        assert!(m.matches(&format!("{}ABEEF", zeros(35))));
    }

    #[test]
    fn test_start_or_end() {
        let m = matcher(&["dead"], MatchMode::StartOrEnd, true);
        assert!(m.matches(&format!("dead{}", zeros(36))));
        assert!(m.matches(&format!("{}dead", zeros(36))));
        assert!(!m.matches(&format!("00dead{}", zeros(34))));
    }

    #[test]
    fn test_contains() {
        let m = matcher(&["cafe"], MatchMode::Contains, true);
        assert!(m.matches("000000000000000000cafe000000000000000000"));
        assert!(!m.matches(&zeros(40)));
    }

    #[test]
    fn test_word_longer_than_address() {
        let long = "A".repeat(41);
        for mode in [
            MatchMode::DualEnds,
            MatchMode::SuffixWithPrefixChar,
            MatchMode::StartOrEnd,
            MatchMode::Contains,
        ] {
            let m = matcher(&[long.as_str()], mode, false);
            assert!(!m.matches("AAAA"), "{}", mode);
        }
    }

    #[test]
    fn test_empty_word_set_never_matches() {
        let empty: [&str; 0] = [];
        for mode in [
            MatchMode::DualEnds,
            MatchMode::SuffixWithPrefixChar,
            MatchMode::StartOrEnd,
            MatchMode::Contains,
        ] {
            assert!(!matcher(&empty, mode, true).matches(&zeros(40)));
        }
    }

    #[test]
    fn test_word_set_normalized_once() {
        let set = WordSet::new(["DEAD", "dead", "Beef"], true);
        assert_eq!(set.len(), 2);
        assert!(set.contains("dead"));
        assert!(set.contains("beef"));
        assert_eq!(set.lengths(), &[4]);
    }

    #[test]
    fn test_match_mode_parsing() {
        assert_eq!("dual-ends".parse::<MatchMode>().unwrap(), MatchMode::DualEnds);
        assert_eq!(
            "suffix".parse::<MatchMode>().unwrap(),
            MatchMode::SuffixWithPrefixChar
        );
        assert!("sideways".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_difficulty_ordering() {
        let easy = matcher(&["0"], MatchMode::StartOrEnd, true);
        let hard = matcher(&["dead"], MatchMode::DualEnds, true);
        assert!(easy.estimated_difficulty() < hard.estimated_difficulty());
        assert_eq!(hard.estimated_difficulty(), 65536 * 65536);
    }

    #[test]
    fn test_difficulty_counts_only_shortest_words() {
        let set = WordSet::new(["DEAD", "BEEF", "C0FFEE"], true);
        assert_eq!(set.count_of_len(4), 2);
        assert_eq!(set.count_of_len(6), 1);

        let mixed = matcher(&["DEAD", "BEEF", "C0FFEE"], MatchMode::DualEnds, true);
        assert_eq!(mixed.estimated_difficulty(), 32768 * 32768);

        let mixed = matcher(&["DEAD", "BEEF", "C0FFEE"], MatchMode::StartOrEnd, true);
        assert_eq!(mixed.estimated_difficulty(), 16384);
    }
}
