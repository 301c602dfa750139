//! Stable, filesystem-safe identifiers derived from submitted content.

use serde_json::Value;

use super::TemplateType;
use crate::error::{Result, StoreError};

/// What an identifier is being derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdTarget {
    Monster,
    Encounter,
    Template(TemplateType),
}

impl IdTarget {
    fn fallback(self) -> &'static str {
        match self {
            IdTarget::Monster => "monster",
            IdTarget::Encounter => "encounter",
            IdTarget::Template(_) => "template",
        }
    }
}

/// Optional extra disambiguators for template types that have none built in.
///
/// Each entry names a payload field whose string value is appended as
/// `_<value>` when present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateIdPolicy {
    pub attack_roll_suffix_field: Option<String>,
    pub other_suffix_field: Option<String>,
}

/// Derive the identifier for `payload`. Deterministic: equal payloads always
/// produce equal ids.
pub fn derive_id(target: IdTarget, payload: &Value, policy: &TemplateIdPolicy) -> Result<String> {
    let name = match target {
        IdTarget::Monster => payload.pointer("/basics/name").or_else(|| payload.get("name")),
        IdTarget::Encounter | IdTarget::Template(_) => payload.get("name"),
    };
    let name = name
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StoreError::validation("field 'name' is required and must be a non-empty string"))?;

    let mut raw = name.to_string();
    if let IdTarget::Template(template_type) = target {
        if let Some(suffix) = template_suffix(template_type, payload, policy) {
            raw.push('_');
            raw.push_str(&suffix);
        }
    }

    let id = sanitize(&raw);
    if id.is_empty() {
        Ok(target.fallback().to_string())
    } else {
        Ok(id)
    }
}

fn template_suffix(
    template_type: TemplateType,
    payload: &Value,
    policy: &TemplateIdPolicy,
) -> Option<String> {
    let non_empty_str = |field: &str| {
        payload
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    match template_type {
        TemplateType::Trait => payload
            .pointer("/limitedUse/count")
            .and_then(Value::as_u64)
            .filter(|count| *count > 0)
            .map(|count| format!("uses{}", count)),
        TemplateType::SavingThrow => non_empty_str("saveStat"),
        TemplateType::AttackRoll => policy
            .attack_roll_suffix_field
            .as_deref()
            .and_then(non_empty_str),
        TemplateType::Other => policy.other_suffix_field.as_deref().and_then(non_empty_str),
    }
}

/// Lowercase, keep ASCII alphanumerics and underscores, collapse runs of
/// underscores and trim them from both ends.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.to_lowercase().chars() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}

/// Template ids are restricted to what [`sanitize`] can produce.
pub fn is_canonical_template_id(id: &str) -> bool {
    !id.is_empty() && sanitize(id) == id
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(t: TemplateType, payload: Value) -> Result<String> {
        derive_id(IdTarget::Template(t), &payload, &TemplateIdPolicy::default())
    }

    #[test]
    fn trait_with_limited_uses_gets_suffix() {
        let id = template(
            TemplateType::Trait,
            json!({"name": "Legendary Resistance", "limitedUse": {"count": 3}}),
        )
        .unwrap();
        assert_eq!(id, "legendaryresistance_uses3");
    }

    #[test]
    fn trait_without_positive_count_has_no_suffix() {
        for payload in [
            json!({"name": "Pack_Tactics"}),
            json!({"name": "Pack_Tactics", "limitedUse": {"count": 0}}),
            json!({"name": "Pack_Tactics", "limitedUse": {"count": -2}}),
            json!({"name": "Pack_Tactics", "limitedUse": {"count": "3"}}),
        ] {
            assert_eq!(template(TemplateType::Trait, payload).unwrap(), "pack_tactics");
        }
    }

    #[test]
    fn saving_throw_appends_save_stat() {
        let id = template(
            TemplateType::SavingThrow,
            json!({"name": "Poison Spray", "saveStat": "CON"}),
        )
        .unwrap();
        assert_eq!(id, "poisonspray_con");

        let id = template(TemplateType::SavingThrow, json!({"name": "Poison Spray", "saveStat": ""}))
            .unwrap();
        assert_eq!(id, "poisonspray");
    }

    #[test]
    fn attack_roll_and_other_ignore_fields_by_default() {
        let payload = json!({"name": "Bite", "saveStat": "DEX", "limitedUse": {"count": 2}});
        assert_eq!(template(TemplateType::AttackRoll, payload.clone()).unwrap(), "bite");
        assert_eq!(template(TemplateType::Other, payload).unwrap(), "bite");
    }

    #[test]
    fn policy_can_add_attack_roll_suffix() {
        let policy = TemplateIdPolicy {
            attack_roll_suffix_field: Some("damageType".into()),
            other_suffix_field: None,
        };
        let payload = json!({"name": "Bite", "damageType": "Piercing"});
        let id = derive_id(IdTarget::Template(TemplateType::AttackRoll), &payload, &policy).unwrap();
        assert_eq!(id, "bite_piercing");
    }

    #[test]
    fn sanitization_pipeline() {
        assert_eq!(sanitize("__Fire__Bolt!!__"), "fire_bolt");
        assert_eq!(sanitize("Élan d'Été"), "landt");
        assert_eq!(sanitize("a___b_c"), "a_b_c");
        assert_eq!(sanitize("!!!"), "");
    }

    #[test]
    fn empty_result_falls_back() {
        assert_eq!(template(TemplateType::Other, json!({"name": "???"})).unwrap(), "template");
        let id = derive_id(
            IdTarget::Encounter,
            &json!({"name": "###"}),
            &TemplateIdPolicy::default(),
        )
        .unwrap();
        assert_eq!(id, "encounter");
    }

    #[test]
    fn missing_or_blank_name_is_rejected() {
        for payload in [json!({}), json!({"name": 4}), json!({"name": "   "})] {
            let err = template(TemplateType::Trait, payload).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let payload = json!({"name": "Goblin Ambush at Dawn"});
        let policy = TemplateIdPolicy::default();
        let a = derive_id(IdTarget::Encounter, &payload, &policy).unwrap();
        let b = derive_id(IdTarget::Encounter, &payload, &policy).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "goblinambushatdawn");
    }

    #[test]
    fn monster_name_comes_from_basics() {
        let payload = json!({"basics": {"name": "Goblin_Boss"}});
        let id = derive_id(IdTarget::Monster, &payload, &TemplateIdPolicy::default()).unwrap();
        assert_eq!(id, "goblin_boss");
    }

    #[test]
    fn canonical_template_ids() {
        assert!(is_canonical_template_id("bite_uses2"));
        assert!(!is_canonical_template_id("Bite"));
        assert!(!is_canonical_template_id("_bite"));
        assert!(!is_canonical_template_id("bite__x"));
        assert!(!is_canonical_template_id(""));
    }
}
