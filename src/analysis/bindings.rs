//! Declaration-site resolution.
//!
//! A binding pass runs once per parsed file and records which identifier
//! nodes sit in a declaring position. The result is immutable; the scanner
//! only looks things up in it.

use std::collections::HashMap;
use std::fmt;

/// The syntactic role of an identifier that declares a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationSite {
    /// First name of a `var` or `const` spec.
    Value,
    /// First name on the left of `:=`.
    ShortVar,
    /// First name of a struct field declaration.
    Field,
    Function,
    Method,
    Type,
}

impl DeclarationSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationSite::Value => "value",
            DeclarationSite::ShortVar => "short_var",
            DeclarationSite::Field => "field",
            DeclarationSite::Function => "function",
            DeclarationSite::Method => "method",
            DeclarationSite::Type => "type",
        }
    }
}

impl fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mapping from identifier start byte to its declaration-site role.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    sites: HashMap<usize, DeclarationSite>,
}

impl BindingTable {
    /// The declaration role of the identifier starting at `start_byte`, if any.
    pub fn site_at(&self, start_byte: usize) -> Option<DeclarationSite> {
        self.sites.get(&start_byte).copied()
    }

    pub fn is_declaration(&self, start_byte: usize) -> bool {
        self.sites.contains_key(&start_byte)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl FromIterator<(usize, DeclarationSite)> for BindingTable {
    fn from_iter<I: IntoIterator<Item = (usize, DeclarationSite)>>(iter: I) -> Self {
        let mut sites = HashMap::new();
        for (start, site) in iter {
            // The first role recorded for a node wins.
            sites.entry(start).or_insert(site);
        }
        Self { sites }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let table: BindingTable = vec![(4, DeclarationSite::Value), (20, DeclarationSite::Field)]
            .into_iter()
            .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.site_at(4), Some(DeclarationSite::Value));
        assert!(table.is_declaration(20));
        assert!(!table.is_declaration(5));
    }

    #[test]
    fn test_first_role_wins() {
        let table: BindingTable = vec![(4, DeclarationSite::Type), (4, DeclarationSite::Value)]
            .into_iter()
            .collect();

        assert_eq!(table.site_at(4), Some(DeclarationSite::Type));
    }
}
