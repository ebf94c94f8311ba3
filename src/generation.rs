// Generation provider results - single players and bulk team runs
use crate::payload::{check_provider_error, PayloadError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// One player's generated tendencies, in the order the provider sent them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub name: String,
    pub team: String,
    pub position: String,
    pub tendencies: Vec<(String, i64)>,
}

#[derive(Deserialize)]
struct RawGeneration {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    tendencies: serde_json::Map<String, Value>,
}

impl GenerationResult {
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        check_provider_error(&value)?;
        if !value.is_object() {
            return Err(PayloadError::Shape(
                "generation result must be a JSON object".to_string(),
            ));
        }

        let raw: RawGeneration = serde_json::from_value(value)?;
        let tendencies = raw
            .tendencies
            .into_iter()
            .map(|(name, v)| {
                let coerced = coerce_tendency(&v);
                if !v.is_number() {
                    warn!("Tendency '{}' has non-numeric value {}, using 0", name, v);
                }
                (name, coerced)
            })
            .collect();

        Ok(Self {
            name: raw.name.unwrap_or_default(),
            team: raw.team.unwrap_or_default(),
            position: raw.position.unwrap_or_default(),
            tendencies,
        })
    }

    #[cfg(test)]
    pub fn tendency(&self, name: &str) -> Option<i64> {
        self.tendencies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Anything other than a finite number becomes 0; fractional values round
pub fn coerce_tendency(value: &Value) -> i64 {
    let Value::Number(n) = value else {
        return 0;
    };
    if let Some(i) = n.as_i64() {
        i
    } else if n.as_u64().is_some() {
        i64::MAX
    } else {
        match n.as_f64() {
            Some(f) if f.is_finite() => f.round() as i64,
            _ => 0,
        }
    }
}

/// Summary line for a bulk-generated player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCard {
    pub index: usize,
    pub name: String,
    pub position: String,
    pub team: String,
    pub tendency_count: usize,
}

impl PlayerCard {
    pub fn label(&self) -> String {
        format!(
            "{} · {} · {} tendencies",
            self.position, self.team, self.tendency_count
        )
    }
}

/// A generation payload: one player, or a bulk run over a team
#[derive(Debug, Clone)]
pub enum Generated {
    Single(GenerationResult),
    Bulk(Vec<GenerationResult>),
}

impl Generated {
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        match value {
            Value::Array(items) => {
                let results = items
                    .into_iter()
                    .map(GenerationResult::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                debug!("Parsed bulk result with {} players", results.len());
                Ok(Self::Bulk(results))
            }
            other => Ok(Self::Single(GenerationResult::from_value(other)?)),
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, Self::Bulk(_))
    }

    /// Cards are numbered from 1, matching how they are listed
    pub fn cards(&self) -> Vec<PlayerCard> {
        let results: &[GenerationResult] = match self {
            Self::Single(r) => std::slice::from_ref(r),
            Self::Bulk(rs) => rs,
        };
        results
            .iter()
            .enumerate()
            .map(|(i, r)| PlayerCard {
                index: i + 1,
                name: r.name.clone(),
                position: r.position.clone(),
                team: r.team.clone(),
                tendency_count: r.tendencies.len(),
            })
            .collect()
    }

    pub fn players(&self) -> Vec<&GenerationResult> {
        match self {
            Self::Single(r) => vec![r],
            Self::Bulk(rs) => rs.iter().collect(),
        }
    }

    /// Position of the player picked by a 1-based card number or a
    /// case-insensitive name. A single result is picked regardless of the selector.
    pub fn select_index(&self, selector: &str) -> Result<usize, PayloadError> {
        let results = match self {
            Self::Single(_) => return Ok(0),
            Self::Bulk(rs) => rs,
        };
        let selector = selector.trim();

        selector
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|i| *i < results.len())
            .or_else(|| {
                results
                    .iter()
                    .position(|r| r.name.eq_ignore_ascii_case(selector))
            })
            .ok_or_else(|| PayloadError::NoSuchPlayer(selector.to_string()))
    }

    pub fn select(&self, selector: &str) -> Result<&GenerationResult, PayloadError> {
        let idx = self.select_index(selector)?;
        self.players()
            .get(idx)
            .copied()
            .ok_or_else(|| PayloadError::NoSuchPlayer(selector.to_string()))
    }
}
