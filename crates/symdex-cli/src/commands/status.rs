//! Status command implementation

use super::{index_files, truncate};
use std::path::Path;
use symdex_core::record::IndexRecord;
use symdex_core::store::GENERATED_PREFIX;
use tracing::warn;

#[derive(Debug, Default)]
struct FileCounts {
    targets: usize,
    sources: usize,
    malformed: usize,
}

pub fn run(out_dir: &Path, show_files: bool) -> anyhow::Result<()> {
    let files = index_files(out_dir)?;

    let mut totals = FileCounts::default();
    let mut generated = 0;
    let mut rows = Vec::with_capacity(files.len());
    for (relative, path) in &files {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };
        let counts = count_records(&content);
        totals.targets += counts.targets;
        totals.sources += counts.sources;
        totals.malformed += counts.malformed;
        if relative.starts_with(GENERATED_PREFIX) {
            generated += 1;
        }
        rows.push((relative, counts));
    }

    println!("Index Status for '{}'", out_dir.display());
    println!("================================\n");
    println!("  Index files:     {}", files.len());
    println!("  Generated files: {}", generated);
    println!("  Target records:  {}", totals.targets);
    println!("  Source records:  {}", totals.sources);
    if totals.malformed > 0 {
        println!("  Malformed lines: {}", totals.malformed);
    }

    if show_files {
        println!("\n--- Index Files ---\n");
        if rows.is_empty() {
            println!("No files indexed.");
        } else {
            println!("{:<60} {:<8} {:<8}", "PATH", "TARGETS", "SOURCES");
            println!("{}", "-".repeat(78));
            for (relative, counts) in &rows {
                println!(
                    "{:<60} {:<8} {:<8}",
                    truncate(relative, 60),
                    counts.targets,
                    counts.sources
                );
            }
            println!("\nTotal: {} files", rows.len());
        }
    }

    Ok(())
}

fn count_records(content: &str) -> FileCounts {
    let mut counts = FileCounts::default();
    for line in content.lines().filter(|line| !line.is_empty()) {
        match IndexRecord::parse(line) {
            Ok(IndexRecord::Target(_)) => counts.targets += 1,
            Ok(IndexRecord::Source(_)) => counts.sources += 1,
            Err(_) => counts.malformed += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_records() {
        let content = concat!(
            r#"{"loc":"1:5-6","target":1,"kind":"def","pretty":"f","sym":"_Z1fv"}"#,
            "\n",
            r#"{"loc":"1:5-6","source":1,"syntax":"def,function","pretty":"function f","sym":"_Z1fv"}"#,
            "\n",
            "garbage\n",
        );
        let counts = count_records(content);
        assert_eq!(counts.targets, 1);
        assert_eq!(counts.sources, 1);
        assert_eq!(counts.malformed, 1);
    }
}
