//! CLI command implementations

pub mod find;
pub mod index;
pub mod status;

use std::path::Path;
use symdex_core::crawler::{Crawler, CrawlerConfig};

/// Every index file under `out_dir`, sorted, with its path relative to it
fn index_files(out_dir: &Path) -> anyhow::Result<Vec<(String, std::path::PathBuf)>> {
    let config = CrawlerConfig {
        root: out_dir.to_path_buf(),
        ..Default::default()
    };
    let files = Crawler::new(config).crawl()?;
    Ok(files
        .into_iter()
        .map(|path| {
            let relative = path
                .strip_prefix(out_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            (relative, path)
        })
        .collect())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len.saturating_sub(3);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
