use ethers::types::Address;

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentitySource {
    Registry,
    IndexerA,
    IndexerB,
    /// Registration evidence found in transaction history, but no concrete name.
    Inferred,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::Registry => "registry",
            IdentitySource::IndexerA => "indexer_a",
            IdentitySource::IndexerB => "indexer_b",
            IdentitySource::Inferred => "inferred",
        }
    }
}

/// Answer of a single identity source, ordered by strength.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Named(String),
    Inferred,
    NoMatch,
}

impl NameMatch {
    /// Empty names count as no match.
    pub fn from_name(name: Option<String>) -> Self {
        match name.map(|n| n.trim().to_string()) {
            Some(n) if !n.is_empty() => NameMatch::Named(n),
            _ => NameMatch::NoMatch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NameMatch::Named(_) => "named",
            NameMatch::Inferred => "inferred",
            NameMatch::NoMatch => "no_match",
        }
    }
}

/// Merged identity of one address. Built per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressIdentity {
    pub address: Address,
    pub name: Option<String>,
    pub registered: bool,
    /// `None` when no source matched.
    pub source: Option<IdentitySource>,
}

impl AddressIdentity {
    pub fn unregistered(address: Address) -> Self {
        Self {
            address,
            name: None,
            registered: false,
            source: None,
        }
    }
}
