//! End-to-end searches with real secp256k1 keypairs.

use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secp256k1::Secp256k1;

use wordvanity::config::Profile;
use wordvanity::{
    run_search, Config, Coordinator, Keypair, MatchMode, PowerPolicy, SearchConfig, SearchOutcome,
};

const HEX_DIGITS: [&str; 16] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b", "c", "d", "e", "f",
];

fn easy_config(mode: MatchMode) -> SearchConfig {
    SearchConfig::builder(HEX_DIGITS.iter().map(|s| s.to_string()).collect(), mode)
        .case_insensitive(true)
        .batch_size(64)
        .progress_interval(32)
        .worker_count(2)
        .with_mnemonic(true)
        .report_interval(Duration::from_millis(50))
        .build()
        .unwrap()
}

fn profiles_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("profiles")
}

#[test]
fn dual_ends_single_hex_words_match_immediately() {
    let outcome = run_search(easy_config(MatchMode::DualEnds)).unwrap();

    let SearchOutcome::Found { result, summary } = outcome else {
        panic!("expected a match");
    };
    assert_eq!(result.total_attempts, 1);
    assert!(summary.total_attempts >= 1);
    assert_eq!(summary.crashed, 0);
}

#[test]
fn found_candidate_is_consistent_with_its_key() {
    let outcome = run_search(easy_config(MatchMode::SuffixWithPrefixChar)).unwrap();
    let result = outcome.result().expect("a match").clone();
    let candidate = result.candidate;

    let secp = Secp256k1::new();
    let keypair = Keypair::from_secret_key(&secp, candidate.private_key).unwrap();
    assert_eq!(candidate.address, keypair.address().to_hex());
    assert_eq!(&candidate.address[38..39], "a");

    let mnemonic = candidate.mnemonic.expect("mnemonic requested");
    assert_eq!(Some(mnemonic), keypair.mnemonic().ok());
}

#[test]
fn case_sensitive_search_matches_checksum_casing() {
    // Every checksum character is either a digit or a letter in some case,
    // so upper and lower hex letters plus digits cover every address
    let mut words: Vec<String> = HEX_DIGITS.iter().map(|s| s.to_string()).collect();
    words.extend(["A", "B", "C", "D", "E", "F"].iter().map(|s| s.to_string()));

    let config = SearchConfig::builder(words, MatchMode::StartOrEnd)
        .worker_count(1)
        .build()
        .unwrap();
    let result = run_search(config).unwrap().result().cloned().expect("a match");

    let secp = Secp256k1::new();
    let keypair = Keypair::from_secret_key(&secp, result.candidate.private_key).unwrap();
    assert_eq!(result.candidate.address, keypair.address().to_checksum_hex());
}

#[test]
fn external_abort_returns_no_result() {
    let config = SearchConfig::builder(vec!["DEADBEEFDEADBEEF".into()], MatchMode::DualEnds)
        .worker_count(2)
        .report_interval(Duration::from_millis(20))
        .build()
        .unwrap();
    let coordinator = Coordinator::new(config);

    let cancel = coordinator.cancel_token();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        cancel.cancel();
    });

    let outcome = coordinator.run_search().unwrap();
    stopper.join().unwrap();

    assert!(matches!(outcome, SearchOutcome::Aborted { .. }));
    assert!(outcome.summary().total_attempts > 0);
}

#[test]
fn bundled_profiles_resolve() {
    let expected = [
        ("cluster-dual-ends.toml", MatchMode::DualEnds, PowerPolicy::Half),
        ("cluster-suffix.toml", MatchMode::SuffixWithPrefixChar, PowerPolicy::Half),
        ("gpu-both-ends.toml", MatchMode::DualEnds, PowerPolicy::Reserve(4)),
        ("low-power-either-end.toml", MatchMode::StartOrEnd, PowerPolicy::Low),
    ];

    for (file, mode, power) in expected {
        let path = profiles_dir().join(file);
        let profile = Profile::load(path.clone()).unwrap();
        assert_eq!(profile.mode, Some(mode), "{}", file);
        assert_eq!(profile.power, Some(power), "{}", file);

        let flags = Config {
            profile: Some(path),
            ..Config::default()
        };
        let config = flags.resolve().unwrap();
        assert_eq!(config.mode(), mode);
        assert_eq!(config.worker_count(), power.worker_count(num_cpus::get()));
    }
}

#[test]
fn both_ends_profile_pairs_only_equal_length_words() {
    let flags = Config {
        profile: Some(profiles_dir().join("gpu-both-ends.toml")),
        ..Config::default()
    };
    let config = flags.resolve().unwrap();
    let matcher = config.matcher();

    let middle = "0".repeat(32);
    assert!(matcher.matches(&format!("C0DE{}BEEF", middle)));

    let middle = "0".repeat(30);
    assert!(!matcher.matches(&format!("C0FFEE{}BEEF", middle)));
    assert!(!matcher.matches(&format!("BEEF{}C0FFEE", middle)));
}
