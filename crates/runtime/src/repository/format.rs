//! JSON encoding of the rule and last-spawn files.
//!
//! Current rules file:
//!
//! ```json
//! { "rules": { "<channel_id>": { "guild_id": 1, "probability": 0.1, "interval": 3600 } } }
//! ```
//!
//! `probability = 0.0` and `interval = 0` mean "unset". Older files are
//! accepted too: a flat `{ "<channel_id>": {...} }` map, a guild-nested
//! `{ "<guild_id>": { "<channel_id>": {...} } }` map, and a `"last_spawn"`
//! object stored next to the rules. Entries that cannot be read are skipped
//! with a warning rather than failing the whole file.

use std::collections::BTreeMap;

use catch_core::{ChannelId, GuildId, SpawnMode, SpawnRule};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::Result;
use super::traits::{LastSpawnMap, RuleMap};

const RULES_KEY: &str = "rules";
const LAST_SPAWN_KEY: &str = "last_spawn";
const RULE_FIELDS: [&str; 3] = ["guild_id", "probability", "interval"];

#[derive(Debug, Serialize, Deserialize)]
struct RuleEntry {
    #[serde(default)]
    guild_id: u64,
    #[serde(default)]
    probability: f64,
    #[serde(default)]
    interval: i64,
}

#[derive(Debug, Serialize)]
struct RulesDocument {
    rules: BTreeMap<String, RuleEntry>,
}

/// Rules decoded from a rules file, plus any embedded legacy timestamps.
#[derive(Debug, Default)]
pub struct DecodedRules {
    pub rules: RuleMap,
    pub embedded_last_spawn: LastSpawnMap,
}

pub fn encode_rules(rules: &RuleMap) -> Result<String> {
    let rules = rules
        .values()
        .map(|rule| {
            let (probability, interval) = rule.mode.to_parts();
            (
                rule.channel.to_string(),
                RuleEntry {
                    guild_id: rule.guild.get(),
                    probability,
                    interval: i64::from(interval),
                },
            )
        })
        .collect();
    Ok(serde_json::to_string_pretty(&RulesDocument { rules })?)
}

pub fn encode_last_spawn(last_spawn: &LastSpawnMap) -> Result<String> {
    let map: BTreeMap<String, u64> = last_spawn
        .iter()
        .map(|(channel, ts)| (channel.to_string(), *ts))
        .collect();
    Ok(serde_json::to_string_pretty(&map)?)
}

/// Decodes a rules file in any supported shape.
///
/// Blank input decodes as empty. Input that is not JSON is an error; JSON
/// that is not an object decodes as empty with a warning.
pub fn decode_rules(text: &str) -> Result<DecodedRules> {
    let mut decoded = DecodedRules::default();
    if text.trim().is_empty() {
        return Ok(decoded);
    }

    let Value::Object(mut doc) = serde_json::from_str::<Value>(text)? else {
        tracing::warn!("spawn rules file is not a JSON object; ignoring it");
        return Ok(decoded);
    };

    if let Some(last) = doc.remove(LAST_SPAWN_KEY) {
        decoded.embedded_last_spawn = last_spawn_from_value(last);
    }

    match doc.remove(RULES_KEY) {
        Some(Value::Object(rules)) => {
            for (key, value) in rules {
                push_rule(&mut decoded.rules, &key, value, GuildId(0));
            }
        }
        Some(_) => {
            tracing::warn!("`rules` in spawn rules file is not an object; ignoring it");
        }
        None => decode_legacy(&mut decoded.rules, doc),
    }

    Ok(decoded)
}

/// Flat or guild-nested maps, told apart per entry by their fields.
fn decode_legacy(rules: &mut RuleMap, doc: Map<String, Value>) {
    if doc.is_empty() {
        return;
    }
    let before = rules.len();

    for (key, value) in doc {
        let Value::Object(fields) = value else {
            tracing::warn!(key = %key, "skipping malformed spawn rule entry");
            continue;
        };

        if RULE_FIELDS.iter().any(|f| fields.contains_key(*f)) {
            push_rule(rules, &key, Value::Object(fields), GuildId(0));
            continue;
        }

        let Ok(guild) = key.parse::<GuildId>() else {
            tracing::warn!(key = %key, "skipping spawn rule group with non-numeric guild id");
            continue;
        };
        for (channel, value) in fields {
            push_rule(rules, &channel, value, guild);
        }
    }

    if rules.len() == before {
        tracing::warn!("spawn rules file has an unrecognized layout; no rules loaded");
    }
}

fn push_rule(rules: &mut RuleMap, key: &str, value: Value, default_guild: GuildId) {
    let Ok(channel) = key.parse::<ChannelId>() else {
        tracing::warn!(key = %key, "skipping spawn rule with non-numeric channel id");
        return;
    };

    let entry: RuleEntry = match serde_json::from_value(value) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(%channel, error = %e, "skipping malformed spawn rule");
            return;
        }
    };

    match SpawnMode::from_parts(entry.probability, entry.interval) {
        Ok(Some(mode)) => {
            let guild = if entry.guild_id == 0 {
                default_guild
            } else {
                GuildId(entry.guild_id)
            };
            rules.insert(channel, SpawnRule::new(channel, guild, mode));
        }
        Ok(None) => {
            tracing::warn!(%channel, "skipping spawn rule with neither probability nor interval");
        }
        Err(e) => {
            tracing::warn!(%channel, error = %e, "skipping invalid spawn rule");
        }
    }
}

/// Decodes a last-spawn file. Blank input decodes as empty.
pub fn decode_last_spawn(text: &str) -> Result<LastSpawnMap> {
    if text.trim().is_empty() {
        return Ok(LastSpawnMap::new());
    }
    let value: Value = serde_json::from_str(text)?;
    Ok(last_spawn_from_value(value))
}

fn last_spawn_from_value(value: Value) -> LastSpawnMap {
    let Value::Object(map) = value else {
        tracing::warn!("last-spawn data is not a JSON object; ignoring it");
        return LastSpawnMap::new();
    };

    map.into_iter()
        .filter_map(|(key, value)| {
            let channel = key.parse::<ChannelId>().ok()?;
            let ts = value
                .as_u64()
                .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64));
            if ts.is_none() {
                tracing::warn!(key = %key, "skipping malformed last-spawn timestamp");
            }
            ts.map(|ts| (channel, ts))
        })
        .collect()
}
