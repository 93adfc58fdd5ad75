//! Variant-generation driver: owns the registry, picks catalog entries at
//! random, and applies them to copies of a parsed unit until each variant
//! carries the requested number of mutations.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use morph_core::{parse_unit, MorphConfig, MutationRecord, Outcome, SyntaxTree, ToSource};

/// Driver knobs, one level above the per-unit configuration
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Top-level seed; variant `k` runs under `seed + k`
    pub seed: u64,
    /// Number of variants to generate
    pub variants: usize,
    /// Mutations applied per variant
    pub mutations: usize,
    /// Restrict the catalog to one entry name
    pub only: Option<String>,
    /// Attach diff and post-mutation snapshot to each result
    pub debug: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            variants: 1,
            mutations: 3,
            only: None,
            debug: false,
        }
    }
}

/// One generated variant with the records of everything applied to it
#[derive(Debug)]
pub struct Variant {
    pub index: usize,
    pub seed: u64,
    pub source: String,
    pub records: Vec<MutationRecord>,
}

/// Generate variants of a parsed unit. Each variant starts from a fresh
/// copy of `base` and its own derived seed, so the whole run is reproducible
/// from `options.seed` while variants still differ from each other.
pub fn generate_variants(base: &SyntaxTree, options: &DriverOptions) -> Result<Vec<Variant>> {
    let mut out = Vec::with_capacity(options.variants);

    for index in 0..options.variants {
        let variant_seed = options.seed.wrapping_add(index as u64);
        let config = MorphConfig {
            seed: variant_seed,
            debug: options.debug,
            ..Default::default()
        };
        let mut registry = config.catalog();

        let indices: Vec<usize> = match &options.only {
            Some(name) => {
                let matching: Vec<usize> = registry
                    .transformers()
                    .enumerate()
                    .filter(|(_, unit)| unit.name() == name.as_str())
                    .map(|(i, _)| i)
                    .collect();
                if matching.is_empty() {
                    bail!("unknown mutation '{name}'");
                }
                matching
            }
            None => (0..registry.len()).collect(),
        };

        let mut tree = base.clone();
        let mut driver_rng = StdRng::seed_from_u64(variant_seed);
        let mut records = Vec::new();
        let mut attempts = 0;

        // A unit that comes up Empty is retried with a different pick; the
        // bound keeps a fully exhausted catalog from spinning.
        while records.len() < options.mutations
            && attempts < options.mutations * indices.len().max(1) * 4
        {
            attempts += 1;
            let pick = indices[driver_rng.gen_range(0..indices.len())];
            let unit = registry
                .get_mut(pick)
                .context("registry index out of range")?;
            match unit.apply_at_random(&mut tree)? {
                Outcome::Empty => continue,
                Outcome::Success(record) => {
                    info!(
                        variant = index,
                        mutation = record.name,
                        scope = %record.pre_snapshot.root_id(),
                        "applied mutation"
                    );
                    records.push(record);
                }
            }
        }

        if records.len() < options.mutations {
            warn!(
                variant = index,
                applied = records.len(),
                "catalog exhausted before reaching the requested mutation count"
            );
        }

        out.push(Variant {
            index,
            seed: variant_seed,
            source: tree.to_source(),
            records,
        });
    }

    Ok(out)
}

/// Parse a source file and generate variants from it
pub fn generate_from_file(path: &Path, options: &DriverOptions) -> Result<Vec<Variant>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let base = parse_unit(&source).with_context(|| format!("parsing {}", path.display()))?;
    generate_variants(&base, options)
}

/// Write each variant to `dir` as `variant_<k>.src`
pub fn write_variants(dir: &Path, variants: &[Variant]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for variant in variants {
        let path = dir.join(format!("variant_{}.src", variant.index));
        fs::write(&path, &variant.source)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(variant = variant.index, path = %path.display(), "variant written");
    }
    Ok(())
}
