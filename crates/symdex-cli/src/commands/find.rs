//! Find command implementation

use super::{index_files, truncate};
use std::path::Path;
use symdex_core::record::{IndexRecord, TargetRecord};
use symdex_core::RefKind;
use tracing::warn;

pub fn run(out_dir: &Path, symbol: &str, kind: Option<&str>, limit: usize) -> anyhow::Result<()> {
    let kind: Option<RefKind> = kind
        .map(|k| k.parse().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()?;

    let mut results: Vec<(String, TargetRecord)> = Vec::new();
    for (relative, path) in index_files(out_dir)? {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };
        for target in matching_targets(&content, symbol, kind) {
            results.push((relative.clone(), target));
        }
    }

    if results.is_empty() {
        println!("No occurrences of '{}'", symbol);
        return Ok(());
    }

    println!(
        "{:<40} {:<12} {:<6} {:<30} {:<30}",
        "FILE", "LOC", "KIND", "NAME", "CONTEXT"
    );
    println!("{}", "-".repeat(122));

    for (file, target) in results.iter().take(limit) {
        println!(
            "{:<40} {:<12} {:<6} {:<30} {:<30}",
            truncate(file, 40),
            target.loc,
            target.kind,
            truncate(&target.pretty, 30),
            truncate(target.context.as_deref().unwrap_or(""), 30)
        );
    }

    if results.len() > limit {
        println!("\n({} of {} results shown)", limit, results.len());
    }

    Ok(())
}

/// Target records in `content` for `symbol`, optionally of one kind
fn matching_targets(content: &str, symbol: &str, kind: Option<RefKind>) -> Vec<TargetRecord> {
    content
        .lines()
        .filter(|line| line.contains(symbol))
        .filter_map(|line| match IndexRecord::parse(line) {
            Ok(IndexRecord::Target(target)) => Some(target),
            _ => None,
        })
        .filter(|target| target.sym.as_str() == symbol)
        .filter(|target| kind.is_none_or(|kind| target.kind == kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = concat!(
        r#"{"loc":"1:5-6","target":1,"kind":"def","pretty":"f","sym":"_Z1fv"}"#,
        "\n",
        r#"{"loc":"1:5-6","source":1,"syntax":"def,function","pretty":"function f","sym":"_Z1fv"}"#,
        "\n",
        r#"{"loc":"4:2-3","target":1,"kind":"use","pretty":"f","sym":"_Z1fv","context":"g","contextsym":"_Z1gv"}"#,
        "\n",
    );

    #[test]
    fn test_matching_targets_by_symbol_and_kind() {
        assert_eq!(matching_targets(CONTENT, "_Z1fv", None).len(), 2);
        let uses = matching_targets(CONTENT, "_Z1fv", Some(RefKind::Use));
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].context.as_deref(), Some("g"));
        // Context symbols are not occurrences of the symbol
        assert!(matching_targets(CONTENT, "_Z1gv", None).is_empty());
    }
}
