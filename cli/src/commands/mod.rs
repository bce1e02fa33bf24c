//! Subcommand implementations.

pub mod instances;
pub mod scan;
pub mod validate;

/// Shorten a string for table output.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
