//! Field validators.
//!
//! Each validator normalises its input and returns the accepted value, or a
//! human-readable rejection message suitable for re-prompting.

/// App names: trimmed, lowercased, letters/digits/`-`/`_` only.
pub fn app_name(raw: &str) -> Result<String, String> {
    let value = raw.trim().to_lowercase();
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        Ok(value)
    } else {
        Err("Only letters, numbers, dash and underscore are allowed.".to_string())
    }
}

/// Ingress hosts: lowercase letters, digits and dashes only.
pub fn ingress_host(raw: &str) -> Result<String, String> {
    let value = raw.trim();
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        Ok(value.to_string())
    } else {
        Err("Ingress host must only contain lowercase letters, numbers, and dashes.".to_string())
    }
}

/// Anything that is not blank.
pub fn non_empty(raw: &str) -> Result<String, String> {
    let value = raw.trim();
    if value.is_empty() {
        Err("A value is required.".to_string())
    } else {
        Ok(value.to_string())
    }
}

/// Unsigned integers (replica counts).
pub fn unsigned(raw: &str) -> Result<String, String> {
    raw.trim()
        .parse::<u32>()
        .map(|n| n.to_string())
        .map_err(|_| format!("'{}' is not a valid non-negative number.", raw.trim()))
}
