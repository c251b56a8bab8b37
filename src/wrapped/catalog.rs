//! Tracked-protocol catalog and composite query construction.
//!
//! Every protocol owns one or more named existence checks. All checks are
//! folded into a single GraphQL document, one aliased field per check, so a
//! detection costs exactly one round trip.

use crate::types::{NormalizedAddress, Protocol};
use serde::Serialize;

/// Kind of existence check run against the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKind {
    /// At least one event of `event_type` sent by the address.
    EventBySender { event_type: &'static str },
    /// At least one object of `object_type` owned by the address.
    ObjectByOwner { object_type: &'static str },
}

/// A single named sub-query of the composite query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolCheck {
    /// Alias of the sub-query in the GraphQL document and its response
    pub alias: &'static str,
    /// Protocol credited when the check matches
    pub protocol: Protocol,
    pub kind: CheckKind,
}

const fn event(alias: &'static str, protocol: Protocol, event_type: &'static str) -> ProtocolCheck {
    ProtocolCheck {
        alias,
        protocol,
        kind: CheckKind::EventBySender { event_type },
    }
}

const fn owned(alias: &'static str, protocol: Protocol, object_type: &'static str) -> ProtocolCheck {
    ProtocolCheck {
        alias,
        protocol,
        kind: CheckKind::ObjectByOwner { object_type },
    }
}

/// The default Sui mainnet catalog.
///
/// Scallop has two checks: depositing into the lending pool and depositing
/// collateral are both interactions with the protocol. Deployments tracking
/// other packages pass their own checks to [`ProtocolCatalog::new`].
pub const DEFAULT_CHECKS: &[ProtocolCheck] = &[
    event(
        "navi_deposit",
        Protocol::Navi,
        "0xd899cf7d2b5db716bd2cf55599fb0d5ee38a3061e7b6bb6eebf73fa5bc4c81ca::lending::DepositEvent",
    ),
    event(
        "suilend_deposit",
        Protocol::Suilend,
        "0xf95b06141ed4a174f239417323bde3f209b972f5930d8521ea38a52aff3a6ddf::lending_market::DepositEvent",
    ),
    event(
        "bluefin_trade",
        Protocol::Bluefin,
        "0x3492c874c1e3b3e2984e8c41b589e642d4d0a5d6459e5a9cfc2d52fd7c89c267::events::AssetSwap",
    ),
    // TODO: confirm Lake's mainnet staking package id; this one is unverified.
    event(
        "lake_stake",
        Protocol::Lake,
        "0x5a2c2c2de1f7c8d1c0f4e3f7a1b8c9f6d1e0f2a3b4c5d6e7f8091a2b3c4d5e6f::staking::StakeEvent",
    ),
    event(
        "bucket_borrow",
        Protocol::Bucket,
        "0xce7ff77a83ea0cb6fd39bd8748e2ec89a3f41e8efdc3f4eb123e0ca37b184db2::bucket_events::BuckMinted",
    ),
    event(
        "cetus_swap",
        Protocol::Cetus,
        "0x1eabed72c53feb3805120a081dc15963c204dc8d091542592abaf7a35689b2fb::pool::SwapEvent",
    ),
    event(
        "scallop_deposit",
        Protocol::Scallop,
        "0xefe8b36d5b2e43728cc323298626b83177803521d195cfb11e15b910e892fddf::mint::MintEvent",
    ),
    event(
        "scallop_collateral",
        Protocol::Scallop,
        "0xefe8b36d5b2e43728cc323298626b83177803521d195cfb11e15b910e892fddf::deposit_collateral::CollateralDepositEvent",
    ),
    owned(
        "walrus_blob",
        Protocol::Walrus,
        "0xfdc88f7d7cf30afab2f82e8380d11ee8f70efb90e863d1de8616fae1bb09ea77::blob::Blob",
    ),
    event(
        "deepbook_order",
        Protocol::Deepbook,
        "0x2c8d603bc51326b8c13cef9dd07031a408a48dddb541963357661df5d3204809::order_info::OrderPlaced",
    ),
];

/// Body of a GraphQL POST request.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: serde_json::Value,
}

/// Catalog of checks the detector runs.
#[derive(Debug, Clone)]
pub struct ProtocolCatalog {
    checks: Vec<ProtocolCheck>,
}

impl ProtocolCatalog {
    pub fn new(checks: Vec<ProtocolCheck>) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &[ProtocolCheck] {
        &self.checks
    }

    /// Build the composite existence query for one address.
    pub fn build_query(&self, address: &NormalizedAddress) -> GraphQlRequest {
        let mut query = String::from("query WrappedInteractions($addr: SuiAddress!) {\n");
        for check in &self.checks {
            let field = match &check.kind {
                CheckKind::EventBySender { event_type } => format!(
                    "  {}: events(first: 1, filter: {{ sender: $addr, eventType: \"{}\" }}) {{ nodes {{ timestamp }} }}\n",
                    check.alias, event_type
                ),
                CheckKind::ObjectByOwner { object_type } => format!(
                    "  {}: objects(first: 1, filter: {{ owner: $addr, type: \"{}\" }}) {{ nodes {{ address }} }}\n",
                    check.alias, object_type
                ),
            };
            query.push_str(&field);
        }
        query.push('}');

        GraphQlRequest {
            query,
            variables: serde_json::json!({ "addr": address.as_str() }),
        }
    }
}

impl Default for ProtocolCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKS.to_vec())
    }
}
