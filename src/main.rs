//! Word-list Ethereum Vanity Address Search CLI
//!
//! Usage:
//!   wordvanity -w DEAD,BEEF -m dual-ends            # both ends are words
//!   wordvanity -w C0FFEE,F00D -m suffix -i -p half  # ends with "a" + word
//!   wordvanity --profile profiles/gpu-both-ends.toml --mnemonic

use std::process;

use clap::Parser;
use log::{error, info};

use wordvanity::worker::format_number;
use wordvanity::{Config, Coordinator, MatchResult, SearchOutcome, SearchSummary};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let flags = Config::parse();

    if flags.print_profile {
        print!("{}", wordvanity::config::template());
        return;
    }

    let config = match flags.resolve() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let matcher = config.matcher();
    println!("Ethereum Vanity Address Search");
    println!("==============================");
    println!("Words:      {}", config.words().join(", "));
    println!(
        "Mode:       {}{}",
        matcher.mode(),
        if config.case_insensitive() { " (case-insensitive)" } else { "" }
    );
    println!("Difficulty: {}", matcher.difficulty_description());
    println!("Workers:    {}", config.worker_count());
    println!("Batch:      {}", config.batch_size());
    println!();

    let coordinator = Coordinator::new(config);

    let cancel = coordinator.cancel_token();
    if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
        error!("Error setting Ctrl-C handler: {}", e);
    }

    info!("Searching... (Press Ctrl+C to stop)");

    let outcome = match coordinator.run_search() {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    match &outcome {
        SearchOutcome::Found { result, summary } => print_result(result, summary),
        SearchOutcome::Aborted { summary } => {
            println!("\nNo result: search aborted.");
            print_summary(summary);
        }
        SearchOutcome::Exhausted { summary } => {
            println!("\nNo result: every worker crashed.");
            print_summary(summary);
            process::exit(2);
        }
    }
}

fn print_result(result: &MatchResult, summary: &SearchSummary) {
    let candidate = &result.candidate;
    println!("\n=== Match ===");
    println!("Address:     {}", candidate.address_prefixed());
    println!("Private Key: 0x{}", candidate.private_key_hex());
    if let Some(mnemonic) = &candidate.mnemonic {
        println!("Mnemonic:    {}", mnemonic);
    }
    println!("Worker:      {}", result.worker_id);
    println!(
        "Found after: {} attempts in {:.2}s",
        format_number(result.total_attempts),
        result.elapsed.as_secs_f64()
    );
    print_summary(summary);
}

fn print_summary(summary: &SearchSummary) {
    println!("\n--- Final Statistics ---");
    println!("Total attempts: {}", format_number(summary.total_attempts));
    println!("Time elapsed:   {:.2}s", summary.elapsed.as_secs_f64());
    println!("Average speed:  {}/s", format_number(summary.rate() as u64));
    if summary.crashed > 0 {
        println!("Crashed:        {} of {} workers", summary.crashed, summary.workers);
    }
}
