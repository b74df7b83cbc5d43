//! # wordvanity
//!
//! Parallel Ethereum vanity address search against a set of acceptable words.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation and address derivation
//! - `matcher`: Word-set matching strategies
//! - `worker`: Worker loops, candidate sources and the search coordinator
//! - `config`: Runtime configuration and profiles
//! - `deploy`: Polling contract for running the search on a remote endpoint

pub mod config;
pub mod crypto;
pub mod deploy;
pub mod matcher;
pub mod worker;

pub use config::{Config, ConfigError, PowerPolicy, SearchConfig};
pub use crypto::{Address, Keypair};
pub use matcher::{MatchMode, PatternMatcher, WordSet};
pub use worker::{
    run_search, Candidate, CandidateSource, Coordinator, KeypairSource, MatchResult,
    SearchError, SearchOutcome, SearchSummary,
};
