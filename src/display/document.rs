//! Document display formatting
//!
//! Formats document lists and vault status for terminal output.

use crate::config::{PyroPaths, Settings};
use crate::vault::{DocumentSummary, VaultStatus};

/// Format document names, one per line
pub fn format_document_names(names: &[String]) -> String {
    if names.is_empty() {
        return "No documents.".to_string();
    }
    names.join("\n")
}

/// Format documents with sizes and timestamps as a table
pub fn format_document_table(summaries: &[DocumentSummary]) -> String {
    if summaries.is_empty() {
        return "No documents.".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>10}  {:<16}  {:<16}\n",
        "Name",
        "Size",
        "Created",
        "Updated",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->10}  {:-<16}  {:-<16}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for summary in summaries {
        output.push_str(&format!(
            "{:<name_width$}  {:>10}  {:<16}  {:<16}\n",
            summary.name,
            format_size(summary.size),
            summary.created_at.format("%Y-%m-%d %H:%M").to_string(),
            summary.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            name_width = name_width,
        ));
    }

    let total: usize = summaries.iter().map(|s| s.size).sum();
    output.push_str(&format!(
        "\n{} document(s), {} total",
        summaries.len(),
        format_size(total)
    ));

    output
}

/// Human-readable byte count
pub fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;

    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format the vault status with the data directory
pub fn format_status(status: &VaultStatus, paths: &PyroPaths) -> String {
    let mut output = format!("Vault:  {}\n", status);
    output.push_str(&format!("Data:   {}", paths.base_dir().display()));
    if *status == VaultStatus::Uninitialized {
        output.push_str("\n\nRun 'pyro init' to set a password.");
    }
    output
}

/// Format paths and effective settings
pub fn format_config(paths: &PyroPaths, settings: &Settings) -> String {
    let idle = settings
        .idle_timeout_secs
        .map(|secs| format!("{}s", secs))
        .unwrap_or_else(|| "off".to_string());

    let mut output = String::new();
    output.push_str(&format!("Data directory:    {}\n", paths.base_dir().display()));
    output.push_str(&format!("Settings file:     {}\n", paths.settings_file().display()));
    output.push_str(&format!("Vault file:        {}\n", paths.vault_file().display()));
    output.push_str(&format!(
        "Key derivation:    Argon2id, {} KiB, {} passes, {} lanes\n",
        settings.kdf.memory_cost, settings.kdf.time_cost, settings.kdf.parallelism
    ));
    output.push_str(&format!(
        "Min password:      {} characters\n",
        settings.min_password_length
    ));
    output.push_str(&format!("Idle auto-lock:    {}\n", idle));
    output.push_str(&format!(
        "Lock on shutdown:  {}\n",
        if settings.auto_lock_on_shutdown { "yes" } else { "no" }
    ));
    output.push_str(&format!("Log level:         {}", settings.log_level));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn summary(name: &str, size: usize) -> DocumentSummary {
        DocumentSummary {
            name: name.to_string(),
            size,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(format_document_names(&[]), "No documents.");
        assert_eq!(format_document_table(&[]), "No documents.");
    }

    #[test]
    fn test_document_table() {
        let table = format_document_table(&[summary("notes", 12), summary("a much longer name", 2048)]);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Name"));
        assert!(lines[2].starts_with("notes "));
        assert!(lines[3].contains("2.0 KiB"));
        assert!(table.ends_with("2 document(s), 2.0 KiB total"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_format_status() {
        let paths = PyroPaths::with_base_dir(PathBuf::from("/tmp/pyro"));
        let text = format_status(&VaultStatus::Uninitialized, &paths);
        assert!(text.contains("not set up"));
        assert!(text.contains("pyro init"));

        let text = format_status(&VaultStatus::Locked, &paths);
        assert!(text.starts_with("Vault:  locked"));
    }

    #[test]
    fn test_format_config() {
        let paths = PyroPaths::with_base_dir(PathBuf::from("/tmp/pyro"));
        let text = format_config(&paths, &Settings::default());
        assert!(text.contains("65536 KiB"));
        assert!(text.contains("Idle auto-lock:    off"));
    }
}
