//! ID generation utilities for mcpflow
//!
//! Provides functions for generating identifiers for conversations and tool invocations.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a conversation ID
///
/// Format: `conv-{timestamp_ms}-{random_hex}`
/// Example: `conv-1738300800123-a1b2`
pub fn generate_conversation_id() -> String {
    let random: u16 = rand::rng().random();
    format!("conv-{}-{:04x}", now_ms(), random)
}

/// Generate an invocation ID used to correlate a gateway result with its call
///
/// Format: `inv-{timestamp_ms}-{random_hex}`
/// Eight hex digits, since a single turn can issue many calls in the same millisecond.
pub fn generate_invocation_id() -> String {
    let random: u32 = rand::rng().random();
    format!("inv-{}-{:08x}", now_ms(), random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_now_ms_returns_reasonable_timestamp() {
        let ts = now_ms();
        assert!(ts > 1577836800000); // 2020-01-01
        assert!(ts < 4102444800000); // 2100-01-01
    }

    #[test]
    fn test_generate_conversation_id_format() {
        let id = generate_conversation_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "conv");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_invocation_id_format() {
        let id = generate_invocation_id();
        assert!(id.starts_with("inv-"));
        let suffix = id.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_invocation_ids_are_unique_within_a_burst() {
        let ids: HashSet<String> = (0..200).map(|_| generate_invocation_id()).collect();
        assert_eq!(ids.len(), 200);
    }
}
