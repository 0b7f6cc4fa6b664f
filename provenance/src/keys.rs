//! Record key layout.

use serde::{Deserialize, Serialize};

/// How entity ids map onto the store's single keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLayout {
    /// Entity id is the key. Members, batches and pours share one namespace.
    #[default]
    Flat,
    /// Keys carry a kind prefix: `member:`, `batch:`, `pour:`.
    Namespaced,
}

impl KeyLayout {
    pub fn member_key(&self, id: &str) -> String {
        self.key("member", id)
    }

    pub fn batch_key(&self, batch_id: &str) -> String {
        self.key("batch", batch_id)
    }

    pub fn pour_key(&self, cup_id: &str) -> String {
        self.key("pour", cup_id)
    }

    fn key(&self, prefix: &str, id: &str) -> String {
        match self {
            Self::Flat => id.to_string(),
            Self::Namespaced => format!("{prefix}:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_layout_uses_bare_ids() {
        let layout = KeyLayout::Flat;
        assert_eq!(layout.member_key("alice"), "alice");
        assert_eq!(layout.batch_key("alice"), "alice");
    }

    #[test]
    fn test_namespaced_layout_separates_kinds() {
        let layout = KeyLayout::Namespaced;
        assert_eq!(layout.member_key("x1"), "member:x1");
        assert_eq!(layout.batch_key("x1"), "batch:x1");
        assert_eq!(layout.pour_key("x1"), "pour:x1");
    }
}
