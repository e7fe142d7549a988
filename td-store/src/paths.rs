//! Document path parsing and construction.
//!
//! Documents are addressed by slash-separated paths alternating collection
//! and document id (`users/u1`, `users/u1/logs/l9`). A valid document path
//! has an even, non-zero number of non-empty segments; a collection path
//! has an odd number.

use td_core::constants::collections;
use td_core::error::{TdError, TdResult};

/// A validated reference to a single document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(String);

impl DocPath {
    /// Parse and validate a document path.
    pub fn parse(path: &str) -> TdResult<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(TdError::InvalidPath("empty path".into()));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() % 2 != 0 {
            return Err(TdError::InvalidPath(format!(
                "not a document path (odd segment count): {path}"
            )));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(TdError::InvalidPath(format!(
                "empty segment in path: {path}"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Build a document path from a collection path and a document id.
    pub fn new(collection: &str, doc_id: &str) -> TdResult<Self> {
        Self::parse(&format!("{collection}/{doc_id}"))
    }

    /// The full path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The parent collection path (everything before the last segment).
    pub fn collection(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// The document id (last segment).
    pub fn doc_id(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Path segments in order.
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').collect()
    }

    /// The path of a subcollection nested under this document.
    pub fn subcollection(&self, name: &str) -> String {
        format!("{}/{name}", self.0)
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path of a user's root profile document.
pub fn user_doc(user_id: &str) -> TdResult<DocPath> {
    DocPath::new(collections::USERS, user_id)
}

/// Collection path of an owned-data collection under a user.
pub fn user_collection(user_id: &str, name: &str) -> String {
    format!("{}/{user_id}/{name}", collections::USERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_paths() {
        let p = DocPath::parse("users/u1").unwrap();
        assert_eq!(p.collection(), "users");
        assert_eq!(p.doc_id(), "u1");

        let p = DocPath::parse("users/u1/logs/l9").unwrap();
        assert_eq!(p.collection(), "users/u1/logs");
        assert_eq!(p.doc_id(), "l9");
        assert_eq!(p.segments(), vec!["users", "u1", "logs", "l9"]);
    }

    #[test]
    fn test_parse_rejects_collection_paths() {
        assert!(DocPath::parse("users").is_err());
        assert!(DocPath::parse("users/u1/logs").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(DocPath::parse("").is_err());
        assert!(DocPath::parse("users//logs/l1").is_err());
    }

    #[test]
    fn test_parse_trims_slashes() {
        let p = DocPath::parse("/users/u1/").unwrap();
        assert_eq!(p.as_str(), "users/u1");
    }

    #[test]
    fn test_subcollection() {
        let p = DocPath::parse("iFeelConversations/c1").unwrap();
        assert_eq!(p.subcollection("messages"), "iFeelConversations/c1/messages");
    }

    #[test]
    fn test_user_helpers() {
        assert_eq!(user_doc("u1").unwrap().as_str(), "users/u1");
        assert_eq!(user_collection("u1", "medicines"), "users/u1/medicines");
    }
}
