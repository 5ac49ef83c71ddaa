//! Route classification tables.
//!
//! DESIGN
//! ======
//! Prefix lists are compiled once into byte tries so a lookup walks the path
//! a single time regardless of how many prefixes are configured. Public-only
//! routes are exact matches and live in a hash set.
//!
//! Classification is a pure function of the path. Cookie state never enters
//! here; the middleware combines the class with cookie presence afterwards.

use std::collections::HashSet;

use crate::config::RouteLists;

/// Access-control behavior of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Shareable content and public card pages. Always served.
    AlwaysPublic,
    /// Requires a session cookie.
    Protected,
    /// Login/register pages. Authenticated users are bounced to the dashboard.
    PublicOnly,
    /// Everything else. Served as-is.
    Unclassified,
}

impl RouteClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysPublic => "always_public",
            Self::Protected => "protected",
            Self::PublicOnly => "public_only",
            Self::Unclassified => "unclassified",
        }
    }
}

// =============================================================================
// PREFIX SET
// =============================================================================

#[derive(Debug, Default, Clone)]
struct TrieNode {
    /// Sorted by byte for binary search.
    children: Vec<(u8, usize)>,
    terminal: bool,
}

/// A set of string prefixes answering "does any member prefix this path?".
#[derive(Debug, Clone)]
pub struct PrefixSet {
    nodes: Vec<TrieNode>,
    len: usize,
}

impl PrefixSet {
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self { nodes: vec![TrieNode::default()], len: 0 };
        for prefix in prefixes {
            set.insert(prefix.as_ref());
        }
        set
    }

    fn insert(&mut self, prefix: &str) {
        let mut node = 0;
        for byte in prefix.bytes() {
            node = match self.nodes[node]
                .children
                .binary_search_by_key(&byte, |(b, _)| *b)
            {
                Ok(i) => self.nodes[node].children[i].1,
                Err(i) => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(i, (byte, child));
                    child
                }
            };
        }
        if !self.nodes[node].terminal {
            self.nodes[node].terminal = true;
            self.len += 1;
        }
    }

    /// True if some member of the set is a textual prefix of `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let mut node = 0;
        if self.nodes[node].terminal {
            return true;
        }
        for byte in path.bytes() {
            match self.nodes[node]
                .children
                .binary_search_by_key(&byte, |(b, _)| *b)
            {
                Ok(i) => node = self.nodes[node].children[i].1,
                Err(_) => return false,
            }
            if self.nodes[node].terminal {
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

/// Precomputed route tables driving the access middleware.
#[derive(Debug, Clone)]
pub struct RouteTable {
    always_public: PrefixSet,
    protected: PrefixSet,
    public_only: HashSet<String>,
    excluded: PrefixSet,
}

impl RouteTable {
    #[must_use]
    pub fn from_lists(lists: &RouteLists) -> Self {
        Self {
            always_public: PrefixSet::new(&lists.always_public),
            protected: PrefixSet::new(&lists.protected),
            public_only: lists.public_only.iter().cloned().collect(),
            excluded: PrefixSet::new(&lists.excluded),
        }
    }

    /// Classify a request path. Always-public wins over protected, and
    /// protected wins over public-only.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.always_public.matches(path) {
            RouteClass::AlwaysPublic
        } else if self.protected.matches(path) {
            RouteClass::Protected
        } else if self.public_only.contains(path) {
            RouteClass::PublicOnly
        } else {
            RouteClass::Unclassified
        }
    }

    /// API routes and static assets bypass access evaluation entirely.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.matches(path)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::from_lists(&RouteLists::default())
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
