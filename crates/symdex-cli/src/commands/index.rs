//! Index command implementation

use std::path::PathBuf;
use symdex_core::{BatchIndexer, IndexConfig, OverridePolicy};

pub fn run(
    inputs: &[PathBuf],
    src_root: PathBuf,
    obj_root: Option<PathBuf>,
    out_dir: PathBuf,
    jobs: Option<usize>,
    override_policy: &str,
) -> anyhow::Result<()> {
    let policy: OverridePolicy = override_policy
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid override policy: {}", e))?;

    let mut config = IndexConfig::new(src_root, out_dir).with_override_policy(policy);
    if let Some(obj_root) = obj_root {
        config = config.with_obj_root(obj_root);
    }
    let config = config.validate()?;

    let indexer = BatchIndexer::new(config).with_threads(jobs.unwrap_or_else(num_cpus::get));
    let stats = indexer.run(inputs)?;

    println!("\n{}", stats);
    if stats.units_failed > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} translation units failed",
            stats.units_failed,
            stats.units_discovered
        ));
    }
    Ok(())
}
