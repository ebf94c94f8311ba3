// Category catalog - tendency groupings and per-tendency hard caps
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Cap applied to any tendency missing from the cap table
pub const DEFAULT_CAP: i64 = 100;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Could not read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Category '{0}' must be a list of tendency names")]
    MalformedCategory(String),
    #[error("Tendency '{name}' has a non-positive cap ({cap})")]
    NonPositiveCap { name: String, cap: i64 },
    #[error("Tendency '{0}' is listed in more than one category")]
    DuplicateTendency(String),
}

const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Shooting",
        &[
            "Shot",
            "Touch",
            "Shot Close",
            "Shot Under",
            "Shot Close Left",
            "Shot Close Middle",
            "Shot Close Right",
            "Shot Mid",
            "Spot-Up Shot Mid",
            "Off-Screen Mid",
            "Shot Mid Left",
            "Shot Mid Left-Center",
            "Shot Mid Center",
            "Shot Mid Right-Center",
            "Shot Mid Right",
            "Shot Three",
            "Spot-Up Three",
            "Off-Screen Three",
            "Shot Three Left",
            "Shot Three Left-Center",
            "Shot Three Center",
            "Shot Three Right-Center",
            "Shot Three Right",
            "Contested Jumper Mid",
            "Contested Jumper Three",
        ],
    ),
    (
        "Pull-Up & Step-Back",
        &[
            "Step-Back Jumper Mid",
            "Step-Back Jumper Three",
            "Spin Jumper",
            "Transition Pull-Up Three",
            "Dribble Pull-Up Mid",
            "Dribble Pull-Up Three",
        ],
    ),
    ("Driving", &["Drive", "Spot-Up Drive", "Off-Screen Drive"]),
    (
        "Finishing",
        &[
            "Use Glass",
            "Driving Layup",
            "Step Through Shot",
            "Spin Layup",
            "Eurostep Layup",
            "Hop Step Layup",
            "Floater",
        ],
    ),
    (
        "Dunks",
        &[
            "Stand & Dunk",
            "Drive & Dunk",
            "Flashy Dunk",
            "Alley-Oop",
            "Putback",
            "Crash",
        ],
    ),
    (
        "Direction & Triple Threat",
        &[
            "Drive Right",
            "Triple Threat Pump Fake",
            "Triple Threat Jab Step",
            "Triple Threat Idle",
            "Triple Threat Shoot",
        ],
    ),
    (
        "Dribble Setup",
        &[
            "Set Up with Size Up",
            "Set Up with Hesitation",
            "No Set Up Dribble",
            "Drive and Crossover",
            "Drive and Double Crossover",
            "Drive and Spin",
            "Drive and Half Spin",
            "Drive and Step Back",
            "Drive and Behind the Back",
            "Drive and Dribble Hesitation",
            "Drive and In and Out",
            "No Drive & Dribble Move",
        ],
    ),
    (
        "Passing & Balance",
        &[
            "Attack Strong on Drive",
            "Dish to Open Man",
            "Flashy Pass",
            "Alley-Oop Pass",
            "Roll vs Pop",
            "Transition Spot Up vs Cut to Basket",
        ],
    ),
    (
        "Isolation",
        &[
            "Isolation vs Elite",
            "Isolation vs Good",
            "Isolation vs Average",
            "Isolation vs Poor",
            "Play Discipline",
        ],
    ),
    (
        "Post",
        &[
            "Post Up",
            "Post Back Down",
            "Post Aggressive Back Down",
            "Post Face Up",
            "Post Spin",
            "Post Drive",
            "Post Drop Step",
            "Shoot From Post",
            "Post Hook Left",
            "Post Hook Right",
            "Post Fade Left",
            "Post Fade Right",
            "Post Shimmy Shot",
            "Post Hop Shot",
            "Post Step Back Shot",
            "Post Up and Under",
        ],
    ),
    (
        "Defense",
        &[
            "Takes Charge",
            "Foul",
            "Hard Foul",
            "Pass Interception",
            "On-Ball Steal",
            "Blocked Shot",
            "Contest Shot",
        ],
    ),
];

const BUILTIN_CAPS: &[(&str, i64)] = &[
    ("Shot", 75),
    ("Touch", 65),
    ("Shot Close", 60),
    ("Shot Under", 60),
    ("Shot Close Left", 50),
    ("Shot Close Middle", 50),
    ("Shot Close Right", 50),
    ("Shot Mid", 55),
    ("Spot-Up Shot Mid", 45),
    ("Off-Screen Mid", 40),
    ("Shot Mid Left", 45),
    ("Shot Mid Left-Center", 45),
    ("Shot Mid Center", 45),
    ("Shot Mid Right-Center", 45),
    ("Shot Mid Right", 45),
    ("Shot Three", 60),
    ("Spot-Up Three", 60),
    ("Off-Screen Three", 55),
    ("Shot Three Left", 50),
    ("Shot Three Left-Center", 50),
    ("Shot Three Center", 50),
    ("Shot Three Right-Center", 50),
    ("Shot Three Right", 50),
    ("Contested Jumper Mid", 45),
    ("Contested Jumper Three", 40),
    ("Step-Back Jumper Mid", 40),
    ("Step-Back Jumper Three", 35),
    ("Spin Jumper", 45),
    ("Transition Pull-Up Three", 45),
    ("Dribble Pull-Up Mid", 50),
    ("Dribble Pull-Up Three", 40),
    ("Drive", 60),
    ("Spot-Up Drive", 55),
    ("Off-Screen Drive", 50),
    ("Use Glass", 55),
    ("Driving Layup", 60),
    ("Step Through Shot", 45),
    ("Spin Layup", 55),
    ("Eurostep Layup", 55),
    ("Hop Step Layup", 55),
    ("Floater", 55),
    ("Stand & Dunk", 60),
    ("Drive & Dunk", 60),
    ("Flashy Dunk", 55),
    ("Alley-Oop", 55),
    ("Putback", 55),
    ("Crash", 55),
    ("Drive Right", 80),
    ("Triple Threat Pump Fake", 60),
    ("Triple Threat Jab Step", 60),
    ("Triple Threat Idle", 40),
    ("Triple Threat Shoot", 55),
    ("Set Up with Size Up", 55),
    ("Set Up with Hesitation", 55),
    ("No Set Up Dribble", 35),
    ("Drive and Crossover", 55),
    ("Drive and Double Crossover", 55),
    ("Drive and Spin", 55),
    ("Drive and Half Spin", 55),
    ("Drive and Step Back", 55),
    ("Drive and Behind the Back", 55),
    ("Drive and Dribble Hesitation", 55),
    ("Drive and In and Out", 55),
    ("No Drive & Dribble Move", 85),
    ("Attack Strong on Drive", 60),
    ("Dish to Open Man", 55),
    ("Flashy Pass", 55),
    ("Alley-Oop Pass", 55),
    ("Roll vs Pop", 85),
    ("Transition Spot Up vs Cut to Basket", 85),
    ("Isolation vs Elite", 55),
    ("Isolation vs Good", 55),
    ("Isolation vs Average", 55),
    ("Isolation vs Poor", 55),
    ("Play Discipline", 75),
    ("Post Up", 60),
    ("Post Back Down", 60),
    ("Post Aggressive Back Down", 60),
    ("Post Face Up", 55),
    ("Post Spin", 60),
    ("Post Drive", 60),
    ("Post Drop Step", 60),
    ("Shoot From Post", 60),
    ("Post Hook Left", 60),
    ("Post Hook Right", 60),
    ("Post Fade Left", 60),
    ("Post Fade Right", 60),
    ("Post Shimmy Shot", 60),
    ("Post Hop Shot", 60),
    ("Post Step Back Shot", 60),
    ("Post Up and Under", 60),
    ("Takes Charge", 60),
    ("Foul", 60),
    ("Hard Foul", 55),
    ("Pass Interception", 60),
    ("On-Ball Steal", 60),
    ("Blocked Shot", 60),
    ("Contest Shot", 60),
];

lazy_static! {
    static ref BUILTIN: Arc<Catalog> = Arc::new(Catalog::from_static(BUILTIN_CATEGORIES, BUILTIN_CAPS));
}

/// A named, ordered group of tendencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub tendencies: Vec<String>,
}

/// Read-only tendency catalog, built once and shared
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    categories: Vec<Category>,
    caps: HashMap<String, i64>,
    owners: HashMap<String, usize>,
}

/// On-disk shape: `{"categories": {name: [tendency, ...]}, "caps": {tendency: cap}}`
#[derive(Deserialize)]
struct CatalogFile {
    categories: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    caps: HashMap<String, i64>,
}

impl Catalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> Arc<Catalog> {
        Arc::clone(&BUILTIN)
    }

    fn from_static(categories: &[(&str, &[&str])], caps: &[(&str, i64)]) -> Self {
        let categories = categories
            .iter()
            .map(|(name, tendencies)| Category {
                name: name.to_string(),
                tendencies: tendencies.iter().map(|t| t.to_string()).collect(),
            })
            .collect::<Vec<_>>();
        let caps = caps.iter().map(|(n, c)| (n.to_string(), *c)).collect();
        let owners = index_owners(&categories);

        Self {
            categories,
            caps,
            owners,
        }
    }

    /// Build a catalog, rejecting non-positive caps and tendencies listed twice
    pub fn new(categories: Vec<Category>, caps: HashMap<String, i64>) -> Result<Self, CatalogError> {
        if let Some((name, cap)) = caps.iter().find(|(_, cap)| **cap <= 0) {
            return Err(CatalogError::NonPositiveCap {
                name: name.clone(),
                cap: *cap,
            });
        }

        let mut seen = HashSet::new();
        for tendency in categories.iter().flat_map(|c| c.tendencies.iter()) {
            if !seen.insert(tendency.as_str()) {
                return Err(CatalogError::DuplicateTendency(tendency.clone()));
            }
        }

        let owners = index_owners(&categories);
        Ok(Self {
            categories,
            caps,
            owners,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let mut categories = Vec::with_capacity(file.categories.len());
        for (name, value) in file.categories {
            let tendencies: Vec<String> = serde_json::from_value(value)
                .map_err(|_| CatalogError::MalformedCategory(name.clone()))?;
            categories.push(Category { name, tendencies });
        }

        Self::new(categories, file.caps)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        debug!(
            "Loaded catalog from {}: {} categories, {} tendencies",
            path.display(),
            catalog.categories.len(),
            catalog.tendency_count()
        );
        Ok(catalog)
    }

    /// Load from `path` when given, otherwise hand out the built-in catalog
    pub fn load(path: Option<&Path>) -> Result<Arc<Catalog>, CatalogError> {
        match path {
            Some(p) => Ok(Arc::new(Self::from_file(p)?)),
            None => Ok(Self::builtin()),
        }
    }

    /// Hard cap for a tendency; unknown names get [`DEFAULT_CAP`]
    pub fn cap_for(&self, tendency: &str) -> i64 {
        self.caps.get(tendency).copied().unwrap_or(DEFAULT_CAP)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Name of the category a tendency belongs to
    pub fn category_of(&self, tendency: &str) -> Option<&str> {
        self.owners
            .get(tendency)
            .map(|idx| self.categories[*idx].name.as_str())
    }

    pub fn contains(&self, tendency: &str) -> bool {
        self.owners.contains_key(tendency)
    }

    pub fn tendency_count(&self) -> usize {
        self.owners.len()
    }
}

fn index_owners(categories: &[Category]) -> HashMap<String, usize> {
    let mut owners = HashMap::new();
    for (idx, category) in categories.iter().enumerate() {
        for tendency in &category.tendencies {
            owners.entry(tendency.clone()).or_insert(idx);
        }
    }
    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.categories().len(), 11);
        assert_eq!(catalog.tendency_count(), 98);

        // Rebuilding through the validating constructor must succeed
        let rebuilt = Catalog::new(catalog.categories().to_vec(), catalog.caps.clone());
        assert!(rebuilt.is_ok());

        // Every capped tendency is displayed somewhere
        for (name, _) in BUILTIN_CAPS {
            assert!(catalog.contains(name), "cap without category: {}", name);
        }
    }

    #[test]
    fn test_category_order_preserved() {
        let catalog = Catalog::builtin();
        let names: Vec<_> = catalog.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"Shooting"));
        assert_eq!(names.last(), Some(&"Defense"));
        assert_eq!(catalog.categories()[0].tendencies[0], "Shot");
    }

    #[test]
    fn test_cap_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.cap_for("Shot"), 75);
        assert_eq!(catalog.cap_for("Step-Back Jumper Three"), 35);
        assert_eq!(catalog.cap_for("Behind The Back Alley-Oop"), DEFAULT_CAP);
        assert_eq!(catalog.category_of("Floater"), Some("Finishing"));
        assert_eq!(catalog.category_of("Unknown"), None);
    }

    #[test]
    fn test_category_lookup_ignores_case() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.category("dunks").map(|c| c.tendencies.len()), Some(6));
        assert!(catalog.category("Rebounding").is_none());
    }

    #[test]
    fn test_from_json_keeps_file_order() {
        let json = r#"{
            "categories": {"Zeta": ["Z1", "Z2"], "Alpha": ["A1"]},
            "caps": {"Z1": 40}
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.categories()[0].name, "Zeta");
        assert_eq!(catalog.categories()[1].name, "Alpha");
        assert_eq!(catalog.cap_for("Z1"), 40);
        assert_eq!(catalog.cap_for("A1"), DEFAULT_CAP);
    }

    #[test]
    fn test_from_json_rejects_bad_caps() {
        let json = r#"{"categories": {"A": ["X"]}, "caps": {"X": 0}}"#;
        assert!(matches!(
            Catalog::from_json_str(json),
            Err(CatalogError::NonPositiveCap { .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_malformed_category() {
        let json = r#"{"categories": {"A": "X"}}"#;
        assert!(matches!(
            Catalog::from_json_str(json),
            Err(CatalogError::MalformedCategory(name)) if name == "A"
        ));
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let json = r#"{"categories": {"A": ["X"], "B": ["X"]}}"#;
        assert!(matches!(
            Catalog::from_json_str(json),
            Err(CatalogError::DuplicateTendency(name)) if name == "X"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"categories": {{"Only": ["Solo"]}}, "caps": {{"Solo": 15}}}}"#).unwrap();

        let catalog = Catalog::load(Some(file.path())).unwrap();
        assert_eq!(catalog.tendency_count(), 1);
        assert_eq!(catalog.cap_for("Solo"), 15);

        let builtin = Catalog::load(None).unwrap();
        assert_eq!(builtin.cap_for("Shot"), 75);
    }
}
