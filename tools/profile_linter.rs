//! Profile Linter: validates profiles and reports slot coverage problems.
//!
//! Usage: profile_linter <profile_dir_or_file> [--prefix <prefix>]

use std::collections::HashSet;
use std::path::Path;
use std::process;
use zeroprompt::store::loader::{ProfileDir, ProfileSource};
use zeroprompt::core::template::is_slot_name;
use zeroprompt::Profile;

/// Pools smaller than this get a low-variety warning.
const MIN_POOL_ENTRIES: usize = 3;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: profile_linter <profile_dir_or_file> [--prefix <prefix>]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let mut prefix = String::new();

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--prefix" && i + 1 < args.len() {
            i += 1;
            prefix = args[i].clone();
        }
        i += 1;
    }

    let (source, names) = if target.is_file() {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        (ProfileDir::new(dir), vec![name])
    } else if target.is_dir() {
        let source = ProfileDir::new(target);
        let names: Vec<String> = source
            .discover(&prefix)
            .into_iter()
            .filter(|name| target.join(name).is_file())
            .collect();
        (source, names)
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for name in &names {
        match source.load(name) {
            Ok(profile) => {
                println!("  Loaded: {} ({} combinations)", name, profile.total_combinations());
                lint_profile(name, &profile, &mut warnings);
            }
            Err(e) => errors.push(format!("{}", e)),
        }
    }

    println!("\n=== Profile Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} profiles, {} errors, {} warnings",
        names.len(),
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_profile(name: &str, profile: &Profile, warnings: &mut Vec<String>) {
    let mut referenced = HashSet::new();

    for template in profile.templates() {
        for slot in template.slots() {
            referenced.insert(slot.to_string());
            if !profile.pools().contains_key(slot) {
                warnings.push(undefined_slot_warning(name, template.source(), slot));
            }
        }
    }

    for (pool_name, entries) in profile.pools() {
        if !referenced.contains(pool_name) {
            warnings.push(format!(
                "{}: pool '{}' is not referenced by any template",
                name, pool_name
            ));
        }
        if entries.len() < MIN_POOL_ENTRIES {
            warnings.push(format!(
                "{}: pool '{}' has only {} entries (minimum {} recommended)",
                name,
                pool_name,
                entries.len(),
                MIN_POOL_ENTRIES
            ));
        }

        let unique: HashSet<&String> = entries.iter().collect();
        if unique.len() != entries.len() {
            warnings.push(format!(
                "{}: pool '{}' contains duplicate entries",
                name, pool_name
            ));
        }
    }
}

fn undefined_slot_warning(name: &str, template: &str, slot: &str) -> String {
    let rendering = if is_slot_name(slot) {
        format!("renders as [{}]", slot)
    } else {
        format!("left verbatim as {{{}}}", slot)
    };
    format!(
        "{}: template '{}' references undefined pool '{}' ({})",
        name, template, slot, rendering
    )
}
