//! Pattern matching for Ethereum addresses against a set of words.
//!
//! Supports multiple matching strategies:
//! - DualEnds: both ends of the address are words of the same length
//! - SuffixWithPrefixChar: the address ends with a filler character and a word
//! - StartOrEnd: the address starts or ends with a word
//! - Contains: a word occurs anywhere in the address

mod pattern;

pub use pattern::{MatchMode, PatternMatcher, WordSet};
