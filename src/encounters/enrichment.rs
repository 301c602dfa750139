//! Denormalized monster snapshots for encounters.
//!
//! Every reference is resolved before anything is returned, so callers either
//! get a fully enriched list or an error naming the offending monster.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Source of monster statblocks for enrichment.
pub trait MonsterResolver {
    fn resolve_monster(&self, monster_id: &str) -> Result<Value>;
}

/// A `{monsterId, count}` entry as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct MonsterRef {
    pub monster_id: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct EnrichedMonsterRef {
    pub monster_id: String,
    pub count: u32,
    pub name: String,
    #[serde(rename = "AC")]
    pub ac: i64,
    #[serde(rename = "CR")]
    pub cr: f64,
    pub average_hp: i64,
    pub initiative_bonus: i64,
}

/// Read the `monsters` array of an encounter payload.
pub fn parse_monster_refs(payload: &Value) -> Result<Vec<MonsterRef>> {
    let entries = payload
        .get("monsters")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::validation("field 'monsters' is required and must be an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let monster_id = entry
                .get("monsterId")
                .and_then(Value::as_str)
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| {
                    StoreError::validation(format!("monsters[{}] is missing 'monsterId'", index))
                })?;
            let count = entry
                .get("count")
                .and_then(as_integer)
                .ok_or_else(|| {
                    StoreError::validation(format!("monsters[{}] is missing 'count'", index))
                })?;
            let count = u32::try_from(count).ok().filter(|c| *c > 0).ok_or_else(|| {
                StoreError::validation(format!(
                    "monsters[{}] count must be a positive integer, got {}",
                    index, count
                ))
            })?;
            Ok(MonsterRef {
                monster_id: monster_id.to_string(),
                count,
            })
        })
        .collect()
}

pub fn enrich<R: MonsterResolver + ?Sized>(
    refs: &[MonsterRef],
    resolver: &R,
) -> Result<Vec<EnrichedMonsterRef>> {
    refs.iter()
        .map(|monster_ref| {
            let monster = resolver
                .resolve_monster(&monster_ref.monster_id)
                .map_err(|e| match e {
                    StoreError::NotFound { .. } | StoreError::Validation(_) => {
                        log::info!(
                            "encounter references unresolvable monster '{}': {}",
                            monster_ref.monster_id,
                            e
                        );
                        StoreError::validation(format!(
                            "referenced monster '{}' could not be loaded: {}",
                            monster_ref.monster_id, e
                        ))
                    }
                    other => other,
                })?;
            snapshot(monster_ref, &monster)
        })
        .collect()
}

fn snapshot(monster_ref: &MonsterRef, monster: &Value) -> Result<EnrichedMonsterRef> {
    let id = monster_ref.monster_id.as_str();
    let missing = |field: &str| {
        StoreError::validation(format!("monster '{}' has no usable '{}'", id, field))
    };

    let name = monster
        .pointer("/basics/name")
        .or_else(|| monster.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| missing("basics.name"))?;
    let ac = monster.get("AC").and_then(as_integer).ok_or_else(|| missing("AC"))?;
    let cr = monster
        .pointer("/basics/CR")
        .and_then(parse_cr)
        .ok_or_else(|| missing("basics.CR"))?;
    let hp = monster.get("HP").ok_or_else(|| missing("HP"))?;
    let dex = monster
        .pointer("/stats/DEX")
        .and_then(as_integer)
        .ok_or_else(|| missing("stats.DEX"))?;

    Ok(EnrichedMonsterRef {
        monster_id: monster_ref.monster_id.clone(),
        count: monster_ref.count,
        name: name.to_string(),
        ac,
        cr,
        average_hp: average_hp(hp).ok_or_else(|| missing("HP"))?,
        initiative_bonus: initiative_bonus(dex).ok_or_else(|| missing("stats.DEX"))?,
    })
}

/// Expected hit points, never below 1.
///
/// Accepts a flat number or a dice spec `{HD, type, modifier}`; for dice the
/// value is `floor(HD * (type / 2 + 0.5)) + modifier`.
pub fn average_hp(hp: &Value) -> Option<i64> {
    if let Some(flat) = as_integer(hp) {
        return Some(flat.max(1));
    }
    let dice = hp.as_object()?;
    let count = dice.get("HD").and_then(as_integer).filter(|n| *n >= 0)?;
    let sides = dice.get("type").and_then(as_integer).filter(|n| *n >= 1)?;
    let modifier = match dice.get("modifier") {
        None | Some(Value::Null) => 0,
        Some(value) => as_integer(value)?,
    };
    // HD * (type/2 + 0.5) == HD * (type + 1) / 2
    let expected = count.checked_mul(sides.checked_add(1)?)?.div_euclid(2);
    Some(expected.checked_add(modifier)?.max(1))
}

/// Ability modifier, rounded toward negative infinity. `None` if the score
/// is out of range.
pub fn initiative_bonus(dex: i64) -> Option<i64> {
    Some(dex.checked_sub(10)?.div_euclid(2))
}

/// A challenge rating as a number: `0.25`, `2`, or a string like `"1/4"`.
pub fn parse_cr(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|cr| *cr >= 0.0),
        Value::String(s) => {
            let s = s.trim();
            match s.split_once('/') {
                Some((num, den)) => {
                    let num: f64 = num.trim().parse().ok()?;
                    let den: f64 = den.trim().parse().ok()?;
                    (den > 0.0 && num >= 0.0).then(|| num / den)
                }
                None => s.parse().ok().filter(|cr: &f64| *cr >= 0.0),
            }
        }
        _ => None,
    }
}

/// Integers stored as JSON integers, integral floats, or numeric strings.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct FakeMonsters(HashMap<&'static str, Value>);

    impl MonsterResolver for FakeMonsters {
        fn resolve_monster(&self, monster_id: &str) -> Result<Value> {
            self.0
                .get(monster_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("monster", monster_id))
        }
    }

    fn goblin() -> Value {
        json!({
            "id": "goblin",
            "basics": {"name": "Goblin", "CR": 0.25, "size": "Small", "type": "humanoid"},
            "AC": 15,
            "HP": {"HD": 2, "type": 6, "modifier": 0},
            "stats": {"DEX": 14}
        })
    }

    #[test]
    fn dice_average_matches_expected_value() {
        assert_eq!(average_hp(&json!({"HD": 2, "type": 8, "modifier": 1})), Some(10));
        assert_eq!(average_hp(&json!({"HD": 2, "type": 6, "modifier": 0})), Some(7));
        assert_eq!(average_hp(&json!({"HD": 3, "type": 8})), Some(13));
        assert_eq!(average_hp(&json!({"HD": "4", "type": "10", "modifier": "-2"})), Some(20));
    }

    #[test]
    fn average_hp_never_drops_below_one() {
        assert_eq!(average_hp(&json!({"HD": 1, "type": 4, "modifier": -10})), Some(1));
        assert_eq!(average_hp(&json!({"HD": 0, "type": 4, "modifier": 0})), Some(1));
        assert_eq!(average_hp(&json!(-5)), Some(1));
        assert_eq!(average_hp(&json!(22)), Some(22));
    }

    #[test]
    fn malformed_hp_is_rejected() {
        assert_eq!(average_hp(&json!({"HD": 2})), None);
        assert_eq!(average_hp(&json!({"HD": 2, "type": 0})), None);
        assert_eq!(average_hp(&json!("lots")), None);
    }

    #[test]
    fn initiative_uses_floor() {
        assert_eq!(initiative_bonus(8), Some(-1));
        assert_eq!(initiative_bonus(9), Some(-1));
        assert_eq!(initiative_bonus(10), Some(0));
        assert_eq!(initiative_bonus(11), Some(0));
        assert_eq!(initiative_bonus(14), Some(2));
        assert_eq!(initiative_bonus(1), Some(-5));
        assert_eq!(initiative_bonus(i64::MIN), None);
        assert_eq!(initiative_bonus(i64::MAX), Some((i64::MAX - 10) / 2));
    }

    #[test]
    fn extreme_hp_values_are_rejected() {
        assert_eq!(average_hp(&json!({"HD": 1, "type": i64::MAX})), None);
        assert_eq!(average_hp(&json!({"HD": 1, "type": 8, "modifier": i64::MAX})), None);
        assert_eq!(average_hp(&json!({"HD": i64::MAX, "type": 8})), None);
        assert_eq!(average_hp(&json!({"HD": 1, "type": 8, "modifier": i64::MIN})), Some(1));
    }

    #[test]
    fn extreme_monster_stats_are_validation_errors() {
        let mut fast = goblin();
        fast["stats"]["DEX"] = json!(i64::MIN);
        let mut tough = goblin();
        tough["HP"] = json!({"HD": 1, "type": i64::MAX});
        let monsters = FakeMonsters(HashMap::from([("fast", fast), ("tough", tough)]));

        for id in ["fast", "tough"] {
            let refs = vec![MonsterRef {
                monster_id: id.to_string(),
                count: 1,
            }];
            let err = enrich(&refs, &monsters).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{id}: {err}");
        }
    }

    #[test]
    fn challenge_ratings_parse() {
        assert_eq!(parse_cr(&json!(0.125)), Some(0.125));
        assert_eq!(parse_cr(&json!("1/4")), Some(0.25));
        assert_eq!(parse_cr(&json!("17")), Some(17.0));
        assert_eq!(parse_cr(&json!("1/0")), None);
        assert_eq!(parse_cr(&json!(-1)), None);
    }

    #[test]
    fn enrich_produces_snapshots_in_order() {
        let mut monsters = HashMap::new();
        monsters.insert("goblin", goblin());
        monsters.insert(
            "ogre",
            json!({
                "basics": {"name": "Ogre", "CR": 2},
                "AC": 11,
                "HP": 59,
                "stats": {"DEX": 8}
            }),
        );
        let refs = parse_monster_refs(&json!({"monsters": [
            {"monsterId": "ogre", "count": 1},
            {"monsterId": "goblin", "count": 4}
        ]}))
        .unwrap();

        let enriched = enrich(&refs, &FakeMonsters(monsters)).unwrap();
        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].name, "Ogre");
        assert_eq!(enriched[0].average_hp, 59);
        assert_eq!(enriched[0].initiative_bonus, -1);
        assert_eq!(enriched[1].monster_id, "goblin");
        assert_eq!(enriched[1].count, 4);
        assert_eq!(enriched[1].ac, 15);
        assert_eq!(enriched[1].cr, 0.25);
        assert_eq!(enriched[1].average_hp, 7);
        assert_eq!(enriched[1].initiative_bonus, 2);

        let as_json = serde_json::to_value(&enriched[1]).unwrap();
        assert_eq!(
            as_json,
            json!({
                "monsterId": "goblin", "count": 4, "name": "Goblin", "AC": 15,
                "CR": 0.25, "averageHp": 7, "initiativeBonus": 2
            })
        );
    }

    #[test]
    fn unresolvable_monster_fails_the_whole_list() {
        let mut monsters = HashMap::new();
        monsters.insert("goblin", goblin());
        let refs = vec![
            MonsterRef {
                monster_id: "goblin".into(),
                count: 1,
            },
            MonsterRef {
                monster_id: "tarrasque".into(),
                count: 1,
            },
        ];
        let err = enrich(&refs, &FakeMonsters(monsters)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m.contains("tarrasque")), "{err}");
    }

    #[test]
    fn storage_failures_pass_through() {
        struct Broken;
        impl MonsterResolver for Broken {
            fn resolve_monster(&self, monster_id: &str) -> Result<Value> {
                Err(StoreError::corrupt("monster", monster_id, "eof"))
            }
        }
        let refs = vec![MonsterRef {
            monster_id: "goblin".into(),
            count: 1,
        }];
        assert!(matches!(
            enrich(&refs, &Broken),
            Err(StoreError::CorruptDocument { .. })
        ));
    }

    #[test]
    fn refs_need_id_and_positive_count() {
        for payload in [
            json!({}),
            json!({"monsters": [{"count": 1}]}),
            json!({"monsters": [{"monsterId": "goblin"}]}),
            json!({"monsters": [{"monsterId": "goblin", "count": 0}]}),
            json!({"monsters": [{"monsterId": "", "count": 1}]}),
        ] {
            assert!(parse_monster_refs(&payload).is_err(), "{payload}");
        }
        assert!(parse_monster_refs(&json!({"monsters": []})).unwrap().is_empty());
    }
}
