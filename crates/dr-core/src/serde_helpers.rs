//! Shared serde helper functions used across multiple modules.

/// Serde default for `ConnectionOptions::default_fetch_size` (§4.7: "2000,
/// caller-overridable").
pub fn default_fetch_size() -> u32 {
    2000
}
