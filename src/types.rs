//! Core types and data structures shared by the Wrapped pipeline and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Width of a canonical Sui address in hex digits (32 bytes).
pub const ADDRESS_HEX_WIDTH: usize = 64;

/// Prefix marker of a canonical Sui address.
pub const ADDRESS_PREFIX: &str = "0x";

/// A canonical Sui address: `0x` followed by exactly 64 lowercase hex digits.
///
/// Only [`crate::wrapped::address::normalize`] constructs values of this type,
/// so holding one is proof that the input passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    pub(crate) fn from_canonical(value: String) -> Self {
        debug_assert_eq!(value.len(), ADDRESS_PREFIX.len() + ADDRESS_HEX_WIDTH);
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Protocols tracked by the detector.
///
/// Declaration order is the display order of the card grid, with the host
/// protocol in the middle cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "NAVI")]
    Navi,
    Suilend,
    Bluefin,
    Lake,
    Bucket,
    Cetus,
    Scallop,
    Walrus,
    Deepbook,
}

impl Protocol {
    /// The protocol credited to every address this service summarizes.
    pub const HOST: Protocol = Protocol::Bucket;

    /// Returns the display name of the protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Navi => "NAVI",
            Protocol::Suilend => "Suilend",
            Protocol::Bluefin => "Bluefin",
            Protocol::Lake => "Lake",
            Protocol::Bucket => "Bucket",
            Protocol::Cetus => "Cetus",
            Protocol::Scallop => "Scallop",
            Protocol::Walrus => "Walrus",
            Protocol::Deepbook => "Deepbook",
        }
    }

    /// Returns every tracked protocol in display order.
    pub fn all() -> Vec<Protocol> {
        vec![
            Protocol::Navi,
            Protocol::Suilend,
            Protocol::Bluefin,
            Protocol::Lake,
            Protocol::Bucket,
            Protocol::Cetus,
            Protocol::Scallop,
            Protocol::Walrus,
            Protocol::Deepbook,
        ]
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of protocols an address interacted with.
///
/// Always contains [`Protocol::HOST`]; there is no way to build one without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProtocolSet(BTreeSet<Protocol>);

impl ProtocolSet {
    /// The minimal set: only the host protocol.
    pub fn host_only() -> Self {
        let mut set = BTreeSet::new();
        set.insert(Protocol::HOST);
        Self(set)
    }

    /// Adds a protocol. Returns `false` if it was already present.
    pub fn insert(&mut self, protocol: Protocol) -> bool {
        self.0.insert(protocol)
    }

    pub fn contains(&self, protocol: Protocol) -> bool {
        self.0.contains(&protocol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: the host protocol is always present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates in display order.
    pub fn iter(&self) -> impl Iterator<Item = Protocol> + '_ {
        self.0.iter().copied()
    }

    /// Display names in display order.
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl Default for ProtocolSet {
    fn default() -> Self {
        Self::host_only()
    }
}

impl FromIterator<Protocol> for ProtocolSet {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        let mut set = Self::host_only();
        for protocol in iter {
            set.insert(protocol);
        }
        set
    }
}

/// Gamified score for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Final score, capped at the score ceiling
    pub score: u32,
    /// Tier name shown on the card
    pub rank_title: String,
    /// One-line tier description
    pub rank_description: String,
    /// Tier multiplier applied to the raw score
    pub multiplier: f64,
}

/// The response object of the Wrapped endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySummary {
    /// Canonical address the summary was computed for
    pub address: NormalizedAddress,
    /// Campaign year
    pub year: i32,
    /// Protocols credited to the address (host protocol included)
    pub protocols: ProtocolSet,
    /// Number of credited protocols
    pub protocol_count: usize,
    /// Final score
    pub score: u32,
    /// Tier name
    pub rank_title: String,
    /// Tier description
    pub rank_description: String,
    /// Tier multiplier
    pub multiplier: f64,
    /// Personality tags for the card
    pub personality_tags: Vec<String>,
    /// Narrative sentence for the card
    pub og_sentence: String,
}

/// Identity of the caller as supplied by the social login provider.
///
/// Every field is optional: a summary never requires a logged-in caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialIdentity {
    /// Stable provider user id
    pub user_id: Option<String>,
    /// Display handle, without `@`
    pub handle: Option<String>,
    /// Avatar URL as reported by the provider
    pub raw_avatar_url: Option<String>,
}

impl SocialIdentity {
    /// Whether the caller is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some() || self.handle.is_some()
    }

    /// Full-size avatar URL; the provider's `_normal` thumbnail suffix is dropped.
    pub fn avatar_url(&self) -> Option<String> {
        self.raw_avatar_url
            .as_ref()
            .map(|url| url.replacen("_normal", "", 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_set_always_has_host() {
        let set: ProtocolSet = vec![Protocol::Cetus, Protocol::Navi].into_iter().collect();

        assert!(set.contains(Protocol::HOST));
        assert_eq!(set.len(), 3);
        assert_eq!(set.names(), vec!["NAVI", "Bucket", "Cetus"]);
    }

    #[test]
    fn test_protocol_set_is_never_empty() {
        let empty: ProtocolSet = Vec::<Protocol>::new().into_iter().collect();

        assert!(!empty.is_empty());
        assert!(!ProtocolSet::host_only().is_empty());
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn test_protocol_set_dedup() {
        let mut set = ProtocolSet::host_only();

        assert!(!set.insert(Protocol::Bucket));
        assert!(set.insert(Protocol::Walrus));
        assert!(!set.insert(Protocol::Walrus));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_protocol_serializes_display_name() {
        let json = serde_json::to_string(&ProtocolSet::from_iter([Protocol::Navi])).unwrap();
        assert_eq!(json, r#"["NAVI","Bucket"]"#);
    }

    #[test]
    fn test_avatar_drops_thumbnail_suffix() {
        let identity = SocialIdentity {
            user_id: Some("42".to_string()),
            handle: Some("bucketfan".to_string()),
            raw_avatar_url: Some("https://pbs.twimg.com/profile_images/1/abc_normal.jpg".to_string()),
        };

        assert!(identity.is_authenticated());
        assert_eq!(
            identity.avatar_url().as_deref(),
            Some("https://pbs.twimg.com/profile_images/1/abc.jpg")
        );
        assert!(!SocialIdentity::default().is_authenticated());
    }

    #[test]
    fn test_catalog_order() {
        let all = Protocol::all();
        assert_eq!(all.len(), 9);
        assert_eq!(all[4], Protocol::HOST);
    }
}
