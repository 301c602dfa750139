//! Encounter difficulty from monster XP and party thresholds (5e rules).

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use super::enrichment::EnrichedMonsterRef;

/// `(challenge rating, xp)` for every standard CR.
const XP_BY_CR: [(f64, u64); 34] = [
    (0.0, 0),
    (0.125, 25),
    (0.25, 50),
    (0.5, 100),
    (1.0, 200),
    (2.0, 450),
    (3.0, 700),
    (4.0, 1100),
    (5.0, 1800),
    (6.0, 2300),
    (7.0, 2900),
    (8.0, 3900),
    (9.0, 5000),
    (10.0, 5900),
    (11.0, 7200),
    (12.0, 8400),
    (13.0, 10000),
    (14.0, 11500),
    (15.0, 13000),
    (16.0, 15000),
    (17.0, 18000),
    (18.0, 20000),
    (19.0, 22000),
    (20.0, 25000),
    (21.0, 33000),
    (22.0, 41000),
    (23.0, 50000),
    (24.0, 62000),
    (25.0, 75000),
    (26.0, 90000),
    (27.0, 105000),
    (28.0, 120000),
    (29.0, 135000),
    (30.0, 155000),
];

/// Per-character easy / medium / hard / deadly thresholds for levels 1..=20.
const THRESHOLDS_BY_LEVEL: [[u64; 4]; 20] = [
    [25, 50, 75, 100],
    [50, 100, 150, 200],
    [75, 150, 225, 400],
    [125, 250, 375, 500],
    [250, 500, 750, 1100],
    [300, 600, 900, 1400],
    [350, 750, 1100, 1700],
    [450, 900, 1400, 2100],
    [550, 1100, 1600, 2400],
    [600, 1200, 1900, 2800],
    [800, 1600, 2400, 3600],
    [1000, 2000, 3000, 4500],
    [1100, 2200, 3400, 5100],
    [1250, 2500, 3800, 5700],
    [1400, 2800, 4300, 6400],
    [1600, 3200, 4800, 7200],
    [2000, 3900, 5900, 8800],
    [2100, 4200, 6300, 9500],
    [2400, 4900, 7300, 10900],
    [2800, 5700, 8500, 12700],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Difficulty {
    Trivial,
    Easy,
    Medium,
    Hard,
    Deadly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Party {
    pub player_count: u32,
    pub average_level: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyReport {
    pub total_xp: u64,
    pub adjusted_xp: u64,
    pub difficulty: Option<Difficulty>,
}

/// XP for a challenge rating; unknown ratings count as CR 0.
pub fn xp_for_cr(cr: f64) -> u64 {
    XP_BY_CR
        .iter()
        .find(|(rating, _)| (rating - cr).abs() < 0.001)
        .map(|(_, xp)| *xp)
        .unwrap_or(0)
}

pub fn encounter_multiplier(monster_count: u64) -> f64 {
    match monster_count {
        0 | 1 => 1.0,
        2 => 1.5,
        3..=6 => 2.0,
        7..=10 => 2.5,
        11..=14 => 3.0,
        _ => 4.0,
    }
}

/// Party-wide thresholds; the level is rounded and clamped to 1..=20.
pub fn party_thresholds(party: &Party) -> [u64; 4] {
    let level = party.average_level.round().clamp(1.0, 20.0) as usize;
    THRESHOLDS_BY_LEVEL[level - 1].map(|xp| xp * u64::from(party.player_count))
}

pub fn assess(monsters: &[EnrichedMonsterRef], party: Option<&Party>) -> DifficultyReport {
    let total_xp = monsters.iter().fold(0u64, |total, m| {
        total.saturating_add(xp_for_cr(m.cr).saturating_mul(u64::from(m.count)))
    });
    let monster_count = monsters
        .iter()
        .fold(0u64, |count, m| count.saturating_add(u64::from(m.count)));
    let adjusted_xp = (total_xp as f64 * encounter_multiplier(monster_count)).round() as u64;

    let difficulty = party.filter(|p| p.player_count > 0).map(|party| {
        let [easy, medium, hard, deadly] = party_thresholds(party);
        if adjusted_xp < easy {
            Difficulty::Trivial
        } else if adjusted_xp < medium {
            Difficulty::Easy
        } else if adjusted_xp < hard {
            Difficulty::Medium
        } else if adjusted_xp < deadly {
            Difficulty::Hard
        } else {
            Difficulty::Deadly
        }
    });

    DifficultyReport {
        total_xp,
        adjusted_xp,
        difficulty,
    }
}
