use crate::errors::CliError;

const KIBIBYTE: u64 = 1024;
const MEBIBYTE: u64 = 1024 * KIBIBYTE;

/// Parses a byte count, which may carry a `K` or `M` suffix.
pub(crate) fn parse(value: &str) -> Result<u64, CliError> {
    let invalid = || CliError::InvalidSize { value: value.into() };

    let trimmed = value.trim();
    let (digits, unit) = match trimmed.chars().last() {
        Some('k') | Some('K') => (&trimmed[..trimmed.len() - 1], KIBIBYTE),
        Some('m') | Some('M') => (&trimmed[..trimmed.len() - 1], MEBIBYTE),
        _ => (trimmed, 1),
    };

    digits.parse::<u64>().ok().and_then(|n| n.checked_mul(unit)).ok_or_else(invalid)
}

/// Formats a byte count in the largest binary unit that keeps it readable.
pub(crate) fn human(bytes: u64) -> String {
    if bytes >= MEBIBYTE {
        format!("{:.1}M", bytes as f64 / MEBIBYTE as f64)
    } else if bytes >= KIBIBYTE {
        format!("{:.1}K", bytes as f64 / KIBIBYTE as f64)
    } else {
        format!("{}B", bytes)
    }
}
