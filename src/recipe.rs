use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PLACEHOLDER_NAME: &str = "No recipe";

/// One timed action of a recipe together with the water poured during it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    /// seconds
    pub duration: u32,
    /// grams
    pub water: u32,
}

impl Step {
    pub fn new(action: impl Into<String>, duration: u32, water: u32) -> Self {
        Self {
            action: action.into(),
            duration,
            water,
        }
    }
}

/// Bean dose as written in the recipe file: either a bare number or free text like "20g"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Beans {
    Grams(f64),
    Text(String),
}

impl Default for Beans {
    fn default() -> Self {
        Beans::Text(String::new())
    }
}

impl fmt::Display for Beans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Beans::Grams(g) => write!(f, "{g}"),
            Beans::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub beans: Beans,
    #[serde(default)]
    pub temp: String,
    #[serde(default)]
    pub grind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Recipe {
    /// Fallback shown when no recipe file could be loaded
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            beans: Beans::Text(PLACEHOLDER_NAME.to_string()),
            temp: PLACEHOLDER_NAME.to_string(),
            grind: PLACEHOLDER_NAME.to_string(),
            note: None,
            url: None,
            steps: vec![],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == PLACEHOLDER_NAME && self.steps.is_empty()
    }

    /// Checks the invariants the rest of the program relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("recipe name must not be empty".to_string());
        }
        if checked_total(&self.steps, |s| s.duration).is_none() {
            return Err("total step duration is too large".to_string());
        }
        if checked_total(&self.steps, |s| s.water).is_none() {
            return Err("total step water is too large".to_string());
        }
        Ok(())
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

fn checked_total(steps: &[Step], field: impl Fn(&Step) -> u32) -> Option<u32> {
    steps
        .iter()
        .try_fold(0u32, |total, step| total.checked_add(field(step)))
}

/// A recipe file holds either a single recipe object or an array of them
#[derive(Debug, Clone)]
pub enum RecipeDocument {
    Many(Vec<Recipe>),
    One(Box<Recipe>),
}

impl RecipeDocument {
    /// Picks the shape from the first non-whitespace byte, so parse errors
    /// point at the offending field instead of the enum.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let is_array = bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'[');
        if is_array {
            serde_json::from_slice::<Vec<Recipe>>(bytes).map(RecipeDocument::Many)
        } else {
            serde_json::from_slice::<Recipe>(bytes).map(|r| RecipeDocument::One(Box::new(r)))
        }
    }

    pub fn into_recipes(self) -> Vec<Recipe> {
        match self {
            RecipeDocument::Many(recipes) => recipes,
            RecipeDocument::One(recipe) => vec![*recipe],
        }
    }
}

impl FromStr for RecipeDocument {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const HARIO: &str = r#"{
        "name": "Hario 4:6",
        "beans": "20g",
        "temp": "92C",
        "grind": "Medium-coarse",
        "note": "Swirl after the bloom",
        "steps": [
            {"action": "Bloom", "duration": 45, "water": 60},
            {"action": "Pour", "duration": 45, "water": 60}
        ]
    }"#;

    #[test]
    fn parses_single_recipe_document() {
        let doc = HARIO.parse::<RecipeDocument>().unwrap();
        let recipes = doc.into_recipes();
        assert_eq!(recipes.len(), 1);
        let r = &recipes[0];
        assert_eq!(r.name, "Hario 4:6");
        assert_eq!(r.beans, Beans::Text("20g".into()));
        assert_eq!(r.steps[0], Step::new("Bloom", 45, 60));
        assert_eq!(r.note(), Some("Swirl after the bloom"));
        assert_eq!(r.url(), None);
    }

    #[test]
    fn parses_array_document_with_numeric_beans() {
        let json = r#"[
            {"name": "A", "beans": 15, "steps": []},
            {"name": "B", "beans": 18.5, "steps": [{"action": "Pour", "duration": 10, "water": 0}]}
        ]"#;
        let doc = json.parse::<RecipeDocument>().unwrap();
        let recipes = doc.into_recipes();
        assert_eq!(recipes.len(), 2);
        assert_matches!(recipes[0].beans, Beans::Grams(g) if g == 15.0);
        assert_matches!(recipes[1].beans, Beans::Grams(g) if g == 18.5);
        assert_eq!(recipes[0].temp, "");
    }

    #[test]
    fn rejects_negative_water() {
        let json = r#"{"name": "Bad", "steps": [{"action": "Pour", "duration": 10, "water": -5}]}"#;
        assert!(json.parse::<RecipeDocument>().is_err());
    }

    #[test]
    fn parse_error_names_the_field_and_line() {
        let json = "[\n  {\"name\": \"Bad\", \"steps\": [{\"action\": \"Pour\", \"duration\": 10, \"water\": -5}]}\n]";
        let err = json.parse::<RecipeDocument>().unwrap_err().to_string();
        assert!(!err.contains("untagged"), "{err}");
        assert!(err.contains("line 2"), "{err}");

        let err = r#"  {"name": "Bad", "steps": 3}"#
            .parse::<RecipeDocument>()
            .unwrap_err()
            .to_string();
        assert!(err.contains("sequence"), "{err}");
    }

    #[test]
    fn validate_catches_blank_name() {
        let mut r = Recipe::placeholder();
        r.name = "   ".into();
        assert!(r.validate().is_err());
    }

    #[test]
    fn validate_accepts_blank_action() {
        let mut r = Recipe::placeholder();
        r.name = "X".into();
        r.steps.push(Step::new("", 10, 10));
        assert!(r.validate().is_ok());
    }

    #[test]
    fn validate_catches_totals_that_overflow() {
        let mut r = Recipe::placeholder();
        r.name = "Huge".into();
        r.steps = vec![Step::new("Pour", 10, 3_000_000_000), Step::new("Pour", 10, 3_000_000_000)];
        assert_eq!(r.validate(), Err("total step water is too large".to_string()));

        r.steps = vec![Step::new("Wait", u32::MAX, 0), Step::new("Wait", 1, 0)];
        assert_eq!(r.validate(), Err("total step duration is too large".to_string()));

        r.steps = vec![Step::new("Wait", u32::MAX, u32::MAX)];
        assert!(r.validate().is_ok());
    }

    #[test]
    fn placeholder_has_no_steps() {
        let r = Recipe::placeholder();
        assert!(r.is_placeholder());
        assert!(r.steps.is_empty());
        assert!(r.validate().is_ok());
    }

    #[test]
    fn blank_url_is_treated_as_absent() {
        let mut r = Recipe::placeholder();
        r.url = Some("  ".into());
        assert_eq!(r.url(), None);
    }
}
