//! Free-text notes attached to a statement.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical::Checksum;

/// A description accompanying a statement: free text plus reference links.
/// Neither part is mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Note {
    /// Reference links.
    #[serde(default)]
    pub links: Vec<String>,
    /// Free text.
    #[serde(default)]
    pub text: String,
    #[serde(skip)]
    hash: Cell<Checksum>,
}

impl Note {
    /// Create a note from text and links.
    pub fn new(text: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            links,
            text: text.into(),
            hash: Cell::new(Checksum::ZERO),
        }
    }

    /// Create a note with text only.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    /// Content checksum over text followed by every link. Cached after the
    /// first call; see [`Note::reset_hash`].
    pub fn hash(&self) -> Checksum {
        if self.hash.get().is_zero() {
            let mut x = self.text.clone();
            for l in &self.links {
                x.push_str(l);
            }
            self.hash.set(Checksum::of(x.as_bytes()));
        }
        self.hash.get()
    }

    /// Drop the cached checksum.
    pub fn reset_hash(&self) {
        self.hash.set(Checksum::ZERO);
    }

    /// Knowledge-base equality between two notes.
    ///
    /// Texts must match and link counts must match. The link check then
    /// looks every link of `other` up in `other`'s own list and rejects
    /// on a hit, so two notes that both carry links never compare equal.
    /// This is the long-standing behaviour the merged data was produced
    /// with and is kept as is; it is not symmetric set equality.
    pub fn equals(&self, other: &Note) -> bool {
        if self.text != other.text {
            return false;
        }

        if self.links.len() != other.links.len() {
            return false;
        }

        for l in &other.links {
            if other.links.contains(l) {
                return false;
            }
        }

        true
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}", self.text)?;
        for l in &self.links {
            write!(f, "\n - {}", l)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_covers_text_and_links() {
        let a = Note::new("Text_1", vec!["ref_1".to_string()]);
        let b = Note::new("Text_1", vec!["ref_2".to_string()]);
        let c = Note::new("Text_1", vec!["ref_1".to_string()]);
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), c.hash());
    }

    #[test]
    fn test_equals_without_links() {
        assert!(Note::plain("same").equals(&Note::plain("same")));
        assert!(!Note::plain("same").equals(&Note::plain("other")));
    }

    #[test]
    fn test_equals_link_count_mismatch() {
        let a = Note::new("same", vec!["l1".to_string()]);
        let b = Note::plain("same");
        assert!(!a.equals(&b));
    }

    // Open question kept visible: identical notes with links are not equal
    // under the knowledge-base rule.
    #[test]
    fn test_equals_identical_notes_with_links_are_unequal() {
        let a = Note::new("same", vec!["l1".to_string(), "l2".to_string()]);
        let b = a.clone();
        assert!(!a.equals(&b));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_display() {
        let n = Note::new("Some note", vec!["http://a".to_string()]);
        assert_eq!(n.to_string(), "\nSome note\n - http://a\n");
    }
}
