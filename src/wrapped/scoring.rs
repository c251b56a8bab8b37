//! Scoring engine: protocol count and address to score and tier.
//!
//! Pure and deterministic. The per-address bonus is a fixed rolling hash of
//! the address string so the same address always reproduces the same score.

use crate::types::ScoreResult;

/// Points credited per detected protocol.
pub const POINTS_PER_PROTOCOL: u64 = 1000;

/// Hard ceiling of the final score.
pub const SCORE_CEILING: u32 = 99_999;

/// Exclusive upper bound of the address bonus.
pub const BONUS_MODULUS: i64 = 1000;

/// A scoring tier, selected by minimum protocol count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub min_protocols: usize,
    pub multiplier: f64,
    pub title: &'static str,
    pub description: &'static str,
}

/// Tiers ordered highest threshold first. The last entry matches everything.
pub const TIERS: &[Tier] = &[
    Tier {
        min_protocols: 8,
        multiplier: 2.5,
        title: "Sui Maximalist",
        description: "You are the liquidity that flows through the entire network.",
    },
    Tier {
        min_protocols: 5,
        multiplier: 1.5,
        title: "DeFi Strategist",
        description: "You know your way around the blue chips.",
    },
    Tier {
        min_protocols: 3,
        multiplier: 1.2,
        title: "Active Voyager",
        description: "Building your portfolio, one protocol at a time.",
    },
    Tier {
        min_protocols: 0,
        multiplier: 1.0,
        title: "Sui Explorer",
        description: "You are just dipping your toes into the Move ecosystem.",
    },
];

/// Tier for a protocol count.
pub fn tier_for(protocol_count: usize) -> &'static Tier {
    TIERS
        .iter()
        .find(|tier| protocol_count >= tier.min_protocols)
        .unwrap_or(&TIERS[TIERS.len() - 1])
}

/// Rolling `h = h * 31 + unit` hash over UTF-16 code units, wrapped to i32.
pub fn address_hash(address: &str) -> i32 {
    address
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        })
}

/// Address-derived bonus in `0..1000`.
pub fn address_bonus(address: &str) -> u32 {
    // widen before abs so i32::MIN is defined
    (i64::from(address_hash(address)).abs() % BONUS_MODULUS) as u32
}

/// Score an address that interacted with `protocol_count` protocols.
pub fn score(protocol_count: usize, address: &str) -> ScoreResult {
    let tier = tier_for(protocol_count);
    let base = protocol_count as f64 * POINTS_PER_PROTOCOL as f64;
    let bonus = f64::from(address_bonus(address));
    let raw = ((base + bonus) * tier.multiplier).floor();

    ScoreResult {
        score: raw.min(f64::from(SCORE_CEILING)) as u32,
        rank_title: tier.title.to_string(),
        rank_description: tier.description.to_string(),
        multiplier: tier.multiplier,
    }
}
