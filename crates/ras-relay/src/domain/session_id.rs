//! Session identity.

use std::fmt;

use uuid::Uuid;

/// Unique identifier assigned to every session when it starts.
///
/// Used only for log correlation; it never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random (v4) session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps per-session log lines readable.
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_display_is_eight_hex_chars_prefix_of_uuid() {
        let id = SessionId::new();
        let shown = id.to_string();
        assert_eq!(shown.len(), 8);
        assert!(id.as_uuid().simple().to_string().starts_with(&shown));
    }
}
