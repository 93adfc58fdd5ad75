use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use tracing::info;

use morph_cli::{generate_from_file, write_variants, DriverOptions};
use morph_core::init_tracing;

fn main() -> Result<()> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let matches = Command::new("morph-cli")
        .version(morph_core::VERSION)
        .about("Generates behaviorally-equivalent program variants by mutating syntax trees")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Source file to generate variants from")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .help("Seed for every mutation unit and the driver's own picks")
                .default_value("0"),
        )
        .arg(
            Arg::new("variants")
                .long("variants")
                .value_name("K")
                .help("Number of variants to emit")
                .default_value("1"),
        )
        .arg(
            Arg::new("mutations")
                .long("mutations")
                .value_name("M")
                .help("Mutations applied per variant")
                .default_value("3"),
        )
        .arg(
            Arg::new("only")
                .long("only")
                .value_name("NAME")
                .help("Restrict the catalog to one entry (e.g. neutral-element)"),
        )
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .value_name("DIR")
                .help("Write variants to DIR instead of stdout"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("FILE")
                .help("Write a JSON report of every applied mutation to FILE"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Attach diff and post-mutation snapshot to each result")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let file = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .context("FILE is required")?;
    let options = DriverOptions {
        seed: matches
            .get_one::<String>("seed")
            .map(String::as_str)
            .unwrap_or("0")
            .parse()
            .context("--seed must be an integer")?,
        variants: matches
            .get_one::<String>("variants")
            .map(String::as_str)
            .unwrap_or("1")
            .parse()
            .context("--variants must be an integer")?,
        mutations: matches
            .get_one::<String>("mutations")
            .map(String::as_str)
            .unwrap_or("3")
            .parse()
            .context("--mutations must be an integer")?,
        only: matches.get_one::<String>("only").cloned(),
        debug: matches.get_flag("debug"),
    };
    let out_dir = matches.get_one::<String>("out-dir").map(PathBuf::from);
    let report = matches.get_one::<String>("report").map(PathBuf::from);

    info!(
        seed = options.seed,
        variants = options.variants,
        mutations = options.mutations,
        "generating variants"
    );

    let variants = generate_from_file(&file, &options)?;

    for variant in &variants {
        if options.debug {
            for record in &variant.records {
                if let Some(artifacts) = &record.debug {
                    eprintln!(
                        "--- {} (variant {})\n{}",
                        record.name, variant.index, artifacts.diff
                    );
                }
            }
        }
        if out_dir.is_none() {
            println!(
                "// ===== variant {} (seed {}) =====",
                variant.index, variant.seed
            );
            print!("{}", variant.source);
        }
    }

    if let Some(dir) = &out_dir {
        write_variants(dir, &variants)?;
    }

    if let Some(path) = &report {
        let records: Vec<_> = variants
            .iter()
            .flat_map(|variant| variant.records.iter())
            .collect();
        let json =
            serde_json::to_string_pretty(&records).context("serializing mutation report")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), count = records.len(), "report written");
    }

    Ok(())
}
