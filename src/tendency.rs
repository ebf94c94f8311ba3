//! Tendency override and validation engine.
//!
//! A [`TendencyEditor`] owns the live tendency set for one player. Generated
//! values are trusted as-is when loaded; operator edits go through
//! [`validate_override`], which rejects anything that is not an integer
//! multiple of 5 and clamps the rest into `[0, cap]`.

use crate::catalog::Catalog;
use crate::export::ExportSnapshot;
use crate::generation::GenerationResult;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Group used for generated tendencies the catalog does not know about
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Sliders in the game move in steps of this size
pub const STEP: i64 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),
    #[error("{0} is not a multiple of 5")]
    NotMultipleOfFive(i64),
}

/// Severity band of a value relative to its cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    Green,
    Yellow,
    Red,
}

impl ColorClass {
    pub fn name(&self) -> &'static str {
        match self {
            ColorClass::Green => "green",
            ColorClass::Yellow => "yellow",
            ColorClass::Red => "red",
        }
    }
}

/// `value / cap >= 0.9` is red, `>= 0.7` yellow, anything lower green.
/// A non-positive cap counts as ratio 0.
pub fn classify(value: i64, cap: i64) -> ColorClass {
    if cap <= 0 {
        return ColorClass::Green;
    }
    // Compare 10*value against 9*cap / 7*cap to keep the bands exact
    let scaled = value as i128 * 10;
    let cap = cap as i128;
    if scaled >= cap * 9 {
        ColorClass::Red
    } else if scaled >= cap * 7 {
        ColorClass::Yellow
    } else {
        ColorClass::Green
    }
}

/// Parse an operator edit and bound it to `[0, cap]`
pub fn validate_override(raw: &str, cap: i64) -> Result<i64, OverrideError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| OverrideError::NotAnInteger(raw.to_string()))?;

    if value % STEP != 0 {
        return Err(OverrideError::NotMultipleOfFive(value));
    }

    Ok(value.max(0).min(cap))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TendencyEntry {
    pub name: String,
    pub category: String,
    pub cap: i64,
    pub generated: i64,
    pub current: i64,
    pub color: ColorClass,
    pub invalid: bool,
    /// Text of the last rejected edit, shown next to the invalid marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<String>,
}

impl TendencyEntry {
    /// The generated value is taken verbatim, even if it breaks the cap or step rule
    pub fn initialize(catalog: &Catalog, name: &str, generated: i64) -> Self {
        let cap = catalog.cap_for(name);
        Self {
            name: name.to_string(),
            category: catalog
                .category_of(name)
                .unwrap_or(UNCATEGORIZED)
                .to_string(),
            cap,
            generated,
            current: generated,
            color: classify(generated, cap),
            invalid: false,
            pending: None,
        }
    }

    fn commit(&mut self, value: i64) {
        self.current = value;
        self.color = classify(value, self.cap);
        self.invalid = false;
        self.pending = None;
    }

    fn reject(&mut self, raw: &str) {
        self.invalid = true;
        self.pending = Some(raw.to_string());
    }

    pub fn is_overridden(&self) -> bool {
        self.current != self.generated
    }
}

/// Player identity shown above the tendency tables
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub name: String,
    pub team: String,
    pub position: String,
}

/// Live, editable tendency set for the displayed player
pub struct TendencyEditor {
    catalog: Arc<Catalog>,
    player: PlayerInfo,
    entries: Vec<TendencyEntry>,
    index: HashMap<String, usize>,
}

impl TendencyEditor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            player: PlayerInfo::default(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_result(catalog: Arc<Catalog>, result: &GenerationResult) -> Self {
        let mut editor = Self::new(catalog);
        editor.load(result);
        editor
    }

    /// Replace the whole set with a freshly generated (or re-selected) player
    pub fn load(&mut self, result: &GenerationResult) {
        self.entries.clear();
        self.index.clear();
        self.player = PlayerInfo {
            name: result.name.clone(),
            team: result.team.clone(),
            position: result.position.clone(),
        };

        let generated: HashMap<&str, i64> = result
            .tendencies
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();

        let catalog = Arc::clone(&self.catalog);
        for category in catalog.categories() {
            for name in &category.tendencies {
                let value = generated.get(name.as_str()).copied().unwrap_or(0);
                self.push(TendencyEntry::initialize(&catalog, name, value));
            }
        }

        let mut extras = 0;
        for (name, value) in &result.tendencies {
            if !self.index.contains_key(name) {
                self.push(TendencyEntry::initialize(&catalog, name, *value));
                extras += 1;
            }
        }

        info!(
            "Loaded {} tendencies for {}",
            self.entries.len(),
            if self.player.name.is_empty() {
                "unnamed player"
            } else {
                self.player.name.as_str()
            }
        );
        if extras > 0 {
            debug!("{} generated tendencies are not in the catalog", extras);
        }
    }

    fn push(&mut self, entry: TendencyEntry) {
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Validate and commit an edit. Rejected edits flag the entry and leave
    /// its committed value untouched.
    pub fn apply_override(&mut self, name: &str, raw: &str) -> Result<i64, OverrideError> {
        let Some(&idx) = self.index.get(name) else {
            // Unknown names are accepted with their catalog (or default) cap
            let mut entry = TendencyEntry::initialize(&self.catalog, name, 0);
            let value = validate_override(raw, entry.cap)?;
            entry.commit(value);
            debug!("Added tendency '{}' = {}", name, value);
            self.push(entry);
            return Ok(value);
        };

        let entry = &mut self.entries[idx];
        match validate_override(raw, entry.cap) {
            Ok(value) => {
                entry.commit(value);
                debug!("Override '{}' = {} ({})", name, value, entry.color.name());
                Ok(value)
            }
            Err(err) => {
                entry.reject(raw);
                debug!("Rejected override for '{}': {}", name, err);
                Err(err)
            }
        }
    }

    pub fn entry(&self, name: &str) -> Option<&TendencyEntry> {
        self.index.get(name).map(|idx| &self.entries[*idx])
    }

    pub fn current(&self, name: &str) -> Option<i64> {
        self.entry(name).map(|e| e.current)
    }

    /// All entries in display order
    pub fn entries(&self) -> &[TendencyEntry] {
        &self.entries
    }

    /// Entries grouped by category, catalog order first, then uncategorized
    pub fn groups(&self) -> Vec<(&str, Vec<&TendencyEntry>)> {
        let mut groups: Vec<(&str, Vec<&TendencyEntry>)> = Vec::new();
        for entry in &self.entries {
            match groups.iter_mut().find(|(name, _)| *name == entry.category) {
                Some((_, members)) => members.push(entry),
                None => groups.push((entry.category.as_str(), vec![entry])),
            }
        }
        groups
    }

    pub fn player(&self) -> &PlayerInfo {
        &self.player
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn invalid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.invalid).count()
    }

    pub fn overridden_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_overridden()).count()
    }

    /// Committed values only; pending invalid edits are not included
    pub fn snapshot(&self) -> ExportSnapshot {
        ExportSnapshot::new(
            &self.player.name,
            self.entries.iter().map(|e| (e.name.as_str(), e.current)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_CAP;

    fn result(tendencies: &[(&str, i64)]) -> GenerationResult {
        GenerationResult {
            name: "Test Player".to_string(),
            team: "BOS".to_string(),
            position: "SG".to_string(),
            tendencies: tendencies
                .iter()
                .map(|(n, v)| (n.to_string(), *v))
                .collect(),
        }
    }

    fn editor(tendencies: &[(&str, i64)]) -> TendencyEditor {
        TendencyEditor::from_result(Catalog::builtin(), &result(tendencies))
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(90, 100), ColorClass::Red);
        assert_eq!(classify(70, 100), ColorClass::Yellow);
        assert_eq!(classify(69, 100), ColorClass::Green);
        assert_eq!(classify(63, 70), ColorClass::Red);
        assert_eq!(classify(49, 70), ColorClass::Yellow);
        assert_eq!(classify(0, 75), ColorClass::Green);
        assert_eq!(classify(500, 0), ColorClass::Green);
    }

    #[test]
    fn test_classify_is_monotonic() {
        for cap in [35, 60, 75, 100] {
            let mut last = ColorClass::Green;
            for value in 0..=cap + 20 {
                let color = classify(value, cap);
                assert!(color >= last, "severity dropped at {}/{}", value, cap);
                last = color;
            }
        }
    }

    #[test]
    fn test_validate_override_rules() {
        assert_eq!(validate_override("37", 75), Err(OverrideError::NotMultipleOfFive(37)));
        assert_eq!(validate_override("90", 75), Ok(75));
        assert_eq!(validate_override("-5", 75), Ok(0));
        assert_eq!(validate_override(" 45 ", 75), Ok(45));
        assert_eq!(validate_override("-7", 75), Err(OverrideError::NotMultipleOfFive(-7)));
        assert!(matches!(validate_override("abc", 75), Err(OverrideError::NotAnInteger(_))));
        assert!(matches!(validate_override("", 75), Err(OverrideError::NotAnInteger(_))));
        assert!(matches!(validate_override("4.5", 75), Err(OverrideError::NotAnInteger(_))));
        assert!(matches!(validate_override("10.5", 75), Err(OverrideError::NotAnInteger(_))));
    }

    #[test]
    fn test_initialize_trusts_generated_value() {
        let catalog = Catalog::builtin();
        let entry = TendencyEntry::initialize(&catalog, "Shot", 83);
        assert_eq!(entry.cap, 75);
        assert_eq!(entry.current, 83);
        assert_eq!(entry.color, ColorClass::Red);
        assert_eq!(entry.category, "Shooting");

        let unknown = TendencyEntry::initialize(&catalog, "Half-Court Heave", 12);
        assert_eq!(unknown.cap, DEFAULT_CAP);
        assert_eq!(unknown.category, UNCATEGORIZED);
        assert_eq!(unknown.color, ColorClass::Green);
    }

    #[test]
    fn test_load_covers_catalog_and_extras() {
        let ed = editor(&[("Shot", 70), ("Half-Court Heave", 20)]);
        assert_eq!(ed.entries().len(), 99);
        assert_eq!(ed.current("Shot"), Some(70));
        assert_eq!(ed.current("Drive"), Some(0));
        assert_eq!(ed.current("Half-Court Heave"), Some(20));

        let groups = ed.groups();
        assert_eq!(groups.first().map(|g| g.0), Some("Shooting"));
        assert_eq!(groups.last().map(|g| g.0), Some(UNCATEGORIZED));
        assert_eq!(groups.len(), 12);
    }

    #[test]
    fn test_override_commits_and_reclassifies() {
        let mut ed = editor(&[("Shot", 20)]);
        assert_eq!(ed.apply_override("Shot", "90"), Ok(75));

        let entry = ed.entry("Shot").unwrap();
        assert_eq!(entry.current, 75);
        assert_eq!(entry.color, ColorClass::Red);
        assert!(!entry.invalid);
        assert!(entry.is_overridden());
        assert_eq!(ed.snapshot().get("Shot"), Some(75));
    }

    #[test]
    fn test_invalid_override_keeps_last_value() {
        let mut ed = editor(&[("Shot", 50)]);
        assert_eq!(ed.apply_override("Shot", "37"), Err(OverrideError::NotMultipleOfFive(37)));

        let entry = ed.entry("Shot").unwrap();
        assert_eq!(entry.current, 50);
        assert!(entry.invalid);
        assert_eq!(entry.pending.as_deref(), Some("37"));
        assert_eq!(ed.snapshot().get("Shot"), Some(50));
        assert_eq!(ed.invalid_count(), 1);

        // A later valid edit clears the marker
        assert_eq!(ed.apply_override("Shot", "55"), Ok(55));
        let entry = ed.entry("Shot").unwrap();
        assert!(!entry.invalid);
        assert!(entry.pending.is_none());
        assert_eq!(ed.invalid_count(), 0);
    }

    #[test]
    fn test_override_bounds_hold_for_every_tendency() {
        let mut ed = editor(&[]);
        let names: Vec<String> = ed.entries().iter().map(|e| e.name.clone()).collect();
        for name in &names {
            for raw in ["-100", "-5", "0", "15", "50", "85", "100", "1000"] {
                ed.apply_override(name, raw).unwrap();
                let entry = ed.entry(name).unwrap();
                assert!(entry.current >= 0 && entry.current <= entry.cap);
                assert_eq!(entry.current % STEP, 0);
            }
        }
    }

    #[test]
    fn test_override_is_idempotent() {
        let mut ed = editor(&[("Drive", 45), ("Touch", 33)]);
        for name in ["Drive", "Touch"] {
            let before = ed.current(name).unwrap();
            let _ = ed.apply_override(name, &before.to_string());
            assert_eq!(ed.current(name), Some(before));
        }
    }

    #[test]
    fn test_edit_only_touches_one_entry() {
        let mut ed = editor(&[("Shot", 50), ("Drive", 40)]);
        let before = ed.snapshot();
        ed.apply_override("Drive", "30").unwrap();
        let after = ed.snapshot();

        let changed: Vec<_> = before
            .tendencies
            .iter()
            .filter(|(k, v)| after.tendencies.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(changed, vec!["Drive".to_string()]);
    }

    #[test]
    fn test_override_unknown_name_uses_default_cap() {
        let mut ed = editor(&[]);
        assert_eq!(ed.apply_override("Logo Three", "150"), Ok(100));
        assert_eq!(ed.entry("Logo Three").map(|e| e.cap), Some(DEFAULT_CAP));

        // A rejected edit for an unknown name adds nothing
        assert!(ed.apply_override("Bank Shot", "12").is_err());
        assert!(ed.entry("Bank Shot").is_none());
    }

    #[test]
    fn test_load_replaces_previous_set() {
        let mut ed = editor(&[("Shot", 50), ("Half-Court Heave", 20)]);
        ed.apply_override("Shot", "37").unwrap_err();

        let mut next = result(&[("Shot", 25)]);
        next.name = "Another Player".to_string();
        ed.load(&next);

        assert_eq!(ed.player().name, "Another Player");
        assert_eq!(ed.current("Shot"), Some(25));
        assert!(ed.entry("Half-Court Heave").is_none());
        assert_eq!(ed.invalid_count(), 0);
    }
}
