//! Preview: interactive generation shell for trying out profiles.
//!
//! Usage: preview [--profiles <dir>] [--generator <id>] [--seed <n>]
//!
//! Commands:
//!   gen [index]        render at the current (or given) index
//!   next               advance the index and render
//!   batch <n>          render n prompts from the current index
//!   explain            show which template and pool items were chosen
//!   bulk <n>           render n prompts and print variety statistics
//!   seed <n>           set the seed
//!   index <n>          set the position index
//!   profile <name>     switch profile
//!   mix <a> [b c d]    mix seeds and make the result current
//!   info               profile statistics
//!   list               profiles available to the generator
//!   help               list commands
//!   quit               exit

use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Write};
use zeroprompt::core::hash::MIX_SEED_COUNT;
use zeroprompt::core::render::select;
use zeroprompt::core::service::DEFAULT_PROFILES_DIR;
use zeroprompt::{mix_seeds, BatchRequest, ProfileCache, PromptService, RenderRequest};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        print_usage();
        return;
    }

    let mut profiles_dir = DEFAULT_PROFILES_DIR.to_string();
    let mut generator_id: Option<String> = None;
    let mut seed: u32 = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--profiles" if i + 1 < args.len() => {
                i += 1;
                profiles_dir = args[i].clone();
            }
            "--generator" if i + 1 < args.len() => {
                i += 1;
                generator_id = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = PromptService::builder().profiles_dir(&profiles_dir);
    if let Some(ref id) = generator_id {
        builder = builder.generator_id(id);
    }
    let service = match builder.build() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    // Session state
    let mut cache = ProfileCache::new();
    let mut index: u32 = 0;
    let mut profile = service.config().default_profile.clone();

    println!("Generator: {} ({})", service.config().display_name, service.config().id);
    println!("Profiles: {}", profiles_dir);
    println!("Profile: {}  Seed: {}", profile, seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "gen" | "next" => {
                if cmd == "next" {
                    index = index.wrapping_add(1);
                } else if let Some(arg) = parts.get(1) {
                    match arg.parse::<u32>() {
                        Ok(n) => index = n,
                        Err(_) => {
                            println!("Invalid index: {}", arg);
                            continue;
                        }
                    }
                }
                let request = RenderRequest::new(seed, index).profile(profile.as_str());
                println!("[{}] {}", index, service.generate_or_message(&mut cache, &request));
            }
            "batch" => {
                let count: u32 = match parts.get(1).map(|s| s.parse()) {
                    Some(Ok(n)) => n,
                    _ => {
                        println!("Usage: batch <n>");
                        continue;
                    }
                };
                let request = BatchRequest::new(seed, index, count).profile(profile.as_str());
                match service.batch(&mut cache, &request) {
                    Ok(out) => println!("{}", out.indexed_list),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "explain" => {
                let loaded = match cache.get(&profile) {
                    Some(p) => p,
                    None => {
                        // Populate the cache through the service, then retry
                        let request = RenderRequest::new(seed, index).profile(profile.as_str());
                        if let Err(e) = service.generate(&mut cache, &request) {
                            println!("ERROR: {}", e);
                            continue;
                        }
                        match cache.get(&profile) {
                            Some(p) => p,
                            None => continue,
                        }
                    }
                };
                let selection = select(seed, index, &loaded);
                println!(
                    "template #{}: {}",
                    selection.template_index,
                    selection.template.source()
                );
                for (pool, (item_index, item)) in &selection.components {
                    println!("  {} [{}] = {}", pool, item_index, item);
                }
                println!("=> {}", selection.fill());
            }
            "bulk" => {
                let count: u32 = match parts.get(1).map(|s| s.parse()) {
                    Some(Ok(n)) if n > 0 => n,
                    _ => {
                        println!("Usage: bulk <n>");
                        continue;
                    }
                };
                print_bulk_stats(&service, &mut cache, &profile, seed, index, count);
            }
            "seed" => match parts.get(1).map(|s| s.parse::<u32>()) {
                Some(Ok(s)) => {
                    seed = s;
                    println!("Seed set to {}", seed);
                }
                Some(Err(_)) => println!("Invalid seed: {}", parts[1]),
                None => println!("Current seed: {}", seed),
            },
            "index" => match parts.get(1).map(|s| s.parse::<u32>()) {
                Some(Ok(n)) => {
                    index = n;
                    println!("Index set to {}", index);
                }
                Some(Err(_)) => println!("Invalid index: {}", parts[1]),
                None => println!("Current index: {}", index),
            },
            "profile" => match parts.get(1) {
                Some(name) => {
                    profile = name.to_string();
                    println!("Profile set to {}", profile);
                }
                None => println!("Current profile: {}", profile),
            },
            "mix" => {
                let seeds: Result<Vec<u32>, _> = parts[1..].iter().map(|s| s.parse::<u32>()).collect();
                match seeds {
                    Ok(seeds) if !seeds.is_empty() && seeds.len() <= MIX_SEED_COUNT => {
                        seed = mix_seeds(&seeds);
                        println!("Mixed seed: {}", seed);
                    }
                    _ => println!("Usage: mix <a> [b c d]"),
                }
            }
            "info" => match service.profile_info(Some(&profile)) {
                Ok(summary) => println!("{}", summary),
                Err(e) => println!("ERROR: {}", e),
            },
            "list" => {
                for name in service.discover() {
                    let marker = if name == profile { "*" } else { " " };
                    println!(" {} {}", marker, name);
                }
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn print_bulk_stats(
    service: &PromptService,
    cache: &mut ProfileCache,
    profile: &str,
    seed: u32,
    start: u32,
    count: u32,
) {
    let mut prompts = Vec::with_capacity(count as usize);
    let mut errors = 0;
    for offset in 0..count {
        let request = RenderRequest::new(seed, start.wrapping_add(offset)).profile(profile);
        match service.generate(cache, &request) {
            Ok(text) => prompts.push(text),
            Err(_) => errors += 1,
        }
    }

    println!("\n=== Bulk Generation: {} prompts ({} errors) ===\n", prompts.len(), errors);

    let unique: HashSet<&String> = prompts.iter().collect();
    println!("Unique prompts: {} / {}", unique.len(), prompts.len());

    let avg_len: f64 = if prompts.is_empty() {
        0.0
    } else {
        prompts.iter().map(|p| p.len() as f64).sum::<f64>() / prompts.len() as f64
    };
    println!("Average length: {:.0} chars", avg_len);

    if let Some(loaded) = cache.get(profile) {
        let mut template_counts: HashMap<usize, u32> = HashMap::new();
        for offset in 0..count {
            let selection = select(seed, start.wrapping_add(offset), &loaded);
            *template_counts.entry(selection.template_index).or_insert(0) += 1;
        }
        println!("\nTemplate usage:");
        for (i, template) in loaded.templates().iter().enumerate() {
            let used = template_counts.get(&i).copied().unwrap_or(0);
            println!("  #{:<3} {:>5}  {}", i, used, template.source());
        }
    }
    println!();
}

fn print_usage() {
    println!("Usage: preview [--profiles <dir>] [--generator <id>] [--seed <n>]");
    println!();
    println!("Interactive shell for rendering prompts from vocabulary profiles.");
}

fn print_help() {
    println!("Commands:");
    println!("  gen [index]        Render at the current (or given) index");
    println!("  next               Advance the index and render");
    println!("  batch <n>          Render n prompts from the current index");
    println!("  explain            Show the template and pool items chosen");
    println!("  bulk <n>           Render n prompts with variety statistics");
    println!("  seed <n>           Set the seed");
    println!("  index <n>          Set the position index");
    println!("  profile <name>     Switch profile");
    println!("  mix <a> [b c d]    Mix seeds into a new current seed");
    println!("  info               Profile statistics");
    println!("  list               Profiles available to this generator");
    println!("  help               Show this help");
    println!("  quit               Exit");
}
