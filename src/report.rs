use crate::researcher::Depth;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Writes the finished report as a human-readable text file and returns its
/// path. The format is for people, not for programmatic round-trips.
pub fn save_report(
    dir: &Path,
    topic: &str,
    depth: Depth,
    total_time: Duration,
    timestamp: &str,
    body: &str,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = dir.join(format!("report_{stamp}.md"));

    let mut contents = String::new();
    contents.push_str(&format!("# Research Intelligence Report: {topic}\n\n"));
    contents.push_str(&format!("Generated: {timestamp}\n\n"));
    contents.push_str(&format!(
        "Total Processing Time: {:.2}s\n\n",
        total_time.as_secs_f64()
    ));
    contents.push_str(&format!("Research Depth: {depth}\n\n"));
    contents.push_str("---\n\n");
    contents.push_str(body);

    fs::write(&path, contents)?;
    Ok(path)
}
