use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write log lines, one per line
pub fn export_lines<W: Write>(lines: &[String], mut writer: W) -> std::io::Result<()> {
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}

/// Filename for an export of the `label` log taken at `at`
pub fn export_filename(label: &str, at: DateTime<Local>) -> String {
    let label: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("netassist-{}-{}.log", label, at.format("%Y%m%d-%H%M%S"))
}

/// Export a log snapshot to a timestamped file in `dir`. Returns the filename.
pub fn export_log_file(dir: &Path, label: &str, lines: &[String]) -> Result<String> {
    let filename = export_filename(label, Local::now());
    let path = dir.join(&filename);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    export_lines(lines, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_lines() {
        let mut out = Vec::new();
        export_lines(&["a".to_string(), String::new(), "b".to_string()], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\n\nb\n");
    }

    #[test]
    fn test_export_filename() {
        let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(export_filename("Ping", at), "netassist-ping-20260304-050607.log");
        assert_eq!(
            export_filename("DNS Lookup", at),
            "netassist-dns-lookup-20260304-050607.log"
        );
    }

    #[test]
    fn test_export_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec!["PING example.com (count=4)".to_string(), "64 bytes".to_string()];
        let filename = export_log_file(dir.path(), "ping", &lines).unwrap();
        let written = std::fs::read_to_string(dir.path().join(&filename)).unwrap();
        assert_eq!(written, "PING example.com (count=4)\n64 bytes\n");
    }
}
