//! `avail` CLI -- point-in-time availability checks against rule profiles.
//!
//! ## Usage
//!
//! ```sh
//! # Decide availability now (profile from stdin)
//! cat listing.json | avail check
//!
//! # Decide availability at a specific moment
//! avail check -p listing.json --at 2025-06-04T17:00:00Z
//!
//! # List the rules the engine will visit, with resolution status
//! avail rules -p listing.json
//!
//! # Show every rule's verdict and the running state
//! avail explain -p listing.json --at 2025-06-04T17:00:00Z
//!
//! # Supply an engine configuration block
//! avail check -p listing.json --config engine.json
//! ```
//!
//! Exit codes: 0 when the subject is available, 1 when it is not, 2 on any
//! error (unreadable input, invalid profile, invalid moment, resolver
//! failure).

use std::io::Read;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use avail_core::inventory::NullProvider;
use avail_core::{AvailabilityEngine, EngineConfig, StepOutcome, SubjectProfile};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "avail",
    version,
    about = "Point-in-time availability decisions from rule profiles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration JSON file (default effect, rule types,
    /// inventory resolvers)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide availability for a subject profile at a moment
    Check {
        /// Profile JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        profile: Option<String>,
        /// Moment to evaluate, RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// List the profile's rules as the engine will visit them
    Rules {
        /// Profile JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Evaluate like `check` but print each rule's outcome
    Explain {
        /// Profile JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        profile: Option<String>,
        /// Moment to evaluate, RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    let engine = AvailabilityEngine::from_config(&config, Arc::new(NullProvider));

    match cli.command {
        Commands::Check { profile, at } => {
            let subject = load_profile(profile.as_deref())?;
            let moment = parse_moment(at.as_deref())?;
            let available = engine.is_available(&subject, moment)?;
            println!("{}", if available { "allow" } else { "deny" });
            Ok(if available { 0 } else { 1 })
        }
        Commands::Rules { profile } => {
            let subject = load_profile(profile.as_deref())?;
            for rule in subject.rules.snapshot() {
                let status = match engine.registry().get(&rule.rule_type)? {
                    Some(_) => "resolved",
                    None => "unresolved",
                };
                println!(
                    "{:>6}  {:<16} {:<5} {}",
                    rule.priority,
                    rule.rule_type,
                    effect_name(rule.effect),
                    status
                );
            }
            Ok(0)
        }
        Commands::Explain { profile, at } => {
            let subject = load_profile(profile.as_deref())?;
            let moment = parse_moment(at.as_deref())?;
            let trace = engine.trace(&subject, moment)?;

            println!("timezone: {}", trace.timezone);
            println!("initial:  {}", state_name(trace.initial));
            for step in &trace.steps {
                let outcome = match step.outcome {
                    StepOutcome::Matched => "matched",
                    StepOutcome::NotMatched => "no match",
                    StepOutcome::SkippedUnknownType => "skipped (unknown type)",
                };
                println!(
                    "{:>6}  {:<16} {:<5} {:<22} -> {}",
                    step.priority,
                    step.rule_type,
                    effect_name(step.effect),
                    outcome,
                    state_name(step.state_after)
                );
            }
            println!("verdict:  {}", state_name(trace.verdict));
            Ok(if trace.verdict { 0 } else { 1 })
        }
    }
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid engine configuration in {path}"))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_profile(path: Option<&str>) -> Result<SubjectProfile> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile file {path}"))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read profile from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&text).context("invalid subject profile")
}

fn parse_moment(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("invalid --at moment `{raw}` (expected RFC 3339)"))?;
            Ok(parsed.with_timezone(&Utc))
        }
        None => Ok(Utc::now()),
    }
}

fn effect_name(effect: avail_core::Effect) -> &'static str {
    if effect.allows() {
        "allow"
    } else {
        "deny"
    }
}

fn state_name(allowed: bool) -> &'static str {
    if allowed {
        "allow"
    } else {
        "deny"
    }
}
