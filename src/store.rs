use itertools::Itertools;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::recipe::{Recipe, RecipeDocument};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed recipe document {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid recipe in {}: {}", .path.display(), .reason)]
    Invalid { path: PathBuf, reason: String },
    #[error("duplicate recipe name '{}' in {}, keeping the first definition", .name, .path.display())]
    Duplicate { name: String, path: PathBuf },
}

/// Recipes that loaded plus everything that went wrong along the way
#[derive(Debug, Default)]
pub struct LoadReport {
    pub recipes: Vec<Recipe>,
    pub issues: Vec<RecipeError>,
}

/// Parses a single recipe file, which may hold one recipe or an array.
pub fn load_file(path: &Path) -> Result<Vec<Recipe>, RecipeError> {
    let bytes = fs::read(path).map_err(|source| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = RecipeDocument::from_slice(&bytes).map_err(|source| RecipeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(doc.into_recipes())
}

fn recipe_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let files = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
        .collect();
    Ok(files)
}

/// Loads every `*.json` recipe document in `dir`, in ascending file name
/// order. Bad files and recipes are reported and skipped. The first recipe
/// seen with a given name wins; later ones are reported as duplicates.
pub fn load_dir(dir: &Path) -> LoadReport {
    let mut report = LoadReport::default();

    let files = match recipe_files(dir) {
        Ok(files) => files,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "recipe directory does not exist");
            return report;
        }
        Err(source) => {
            report.issues.push(RecipeError::Io {
                path: dir.to_path_buf(),
                source,
            });
            return report;
        }
    };

    let mut seen = HashSet::new();
    for path in files {
        let recipes = match load_file(&path) {
            Ok(recipes) => recipes,
            Err(e) => {
                warn!("{e}");
                report.issues.push(e);
                continue;
            }
        };

        for recipe in recipes {
            if let Err(reason) = recipe.validate() {
                let e = RecipeError::Invalid {
                    path: path.clone(),
                    reason,
                };
                warn!("{e}");
                report.issues.push(e);
                continue;
            }
            if !seen.insert(recipe.name.clone()) {
                let e = RecipeError::Duplicate {
                    name: recipe.name,
                    path: path.clone(),
                };
                warn!("{e}");
                report.issues.push(e);
                continue;
            }
            report.recipes.push(recipe);
        }
    }

    info!(
        dir = %dir.display(),
        recipes = report.recipes.len(),
        issues = report.issues.len(),
        "loaded recipes"
    );
    report
}

/// The selectable recipes. Never empty: falls back to the placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        if recipes.is_empty() {
            Self {
                recipes: vec![Recipe::placeholder()],
            }
        } else {
            Self { recipes }
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Recipe> {
        self.recipes.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.recipes.iter().position(|r| r.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|r| r.name.as_str())
    }
}

impl From<LoadReport> for RecipeBook {
    fn from(report: LoadReport) -> Self {
        RecipeBook::new(report.recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn missing_dir_loads_nothing_without_issues() {
        let dir = tempdir().unwrap();
        let report = load_dir(&dir.path().join("absent"));
        assert!(report.recipes.is_empty());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn loads_objects_and_arrays_in_file_name_order() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "b.json",
            r#"[{"name": "B1", "steps": []}, {"name": "B2", "steps": []}]"#,
        );
        write(dir.path(), "a.json", r#"{"name": "A", "steps": []}"#);
        write(dir.path(), "notes.txt", "not a recipe");

        let report = load_dir(dir.path());
        let names: Vec<_> = report.recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B1", "B2"]);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn malformed_file_is_reported_and_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.json", "{ this is not json");
        write(dir.path(), "b.json", r#"{"name": "Good", "steps": []}"#);

        let report = load_dir(dir.path());
        assert_eq!(report.recipes.len(), 1);
        assert_eq!(report.issues.len(), 1);
        assert_matches!(&report.issues[0], RecipeError::Parse { path, .. } if path.ends_with("a.json"));
    }

    #[test]
    fn invalid_recipe_is_reported_and_siblings_kept() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"[{"name": "", "steps": []}, {"name": "Kept", "steps": []}]"#,
        );
        let report = load_dir(dir.path());
        assert_eq!(report.recipes.len(), 1);
        assert_eq!(report.recipes[0].name, "Kept");
        assert_matches!(&report.issues[0], RecipeError::Invalid { .. });
    }

    #[test]
    fn oversized_totals_are_reported_and_siblings_load() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"{"name": "Huge", "steps": [
                {"action": "Pour", "duration": 3000000000, "water": 3000000000},
                {"action": "Pour", "duration": 3000000000, "water": 3000000000}
            ]}"#,
        );
        write(dir.path(), "b.json", r#"{"name": "Good", "steps": [{"action": "Pour", "duration": 10, "water": 100}]}"#);

        let report = load_dir(dir.path());
        assert_eq!(report.recipes.len(), 1);
        assert_eq!(report.recipes[0].name, "Good");
        assert_eq!(report.issues.len(), 1);
        assert_matches!(&report.issues[0], RecipeError::Invalid { path, reason }
            if path.ends_with("a.json") && reason.contains("too large"));
        let book = RecipeBook::from(report);
        assert_eq!(crate::metrics::BrewMetrics::for_recipe(&book.recipes()[0]).total_water_grams, 100);
    }

    #[test]
    fn bad_field_error_points_at_the_field() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"{"name": "Bad", "steps": [{"action": "Pour", "duration": 10, "water": -5}]}"#,
        );
        let report = load_dir(dir.path());
        assert_matches!(&report.issues[0], RecipeError::Parse { .. });
        let msg = report.issues[0].to_string();
        assert!(msg.contains("a.json"), "{msg}");
        assert!(!msg.contains("untagged"), "{msg}");
        assert!(msg.contains("line 1"), "{msg}");
    }

    #[test]
    fn duplicate_names_keep_the_first_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"name": "Same", "temp": "90C", "steps": []}"#);
        write(dir.path(), "b.json", r#"{"name": "Same", "temp": "96C", "steps": []}"#);

        let report = load_dir(dir.path());
        assert_eq!(report.recipes.len(), 1);
        assert_eq!(report.recipes[0].temp, "90C");
        assert_matches!(&report.issues[0], RecipeError::Duplicate { name, .. } if name == "Same");
    }

    #[test]
    fn empty_book_falls_back_to_placeholder() {
        let book = RecipeBook::from(LoadReport::default());
        assert_eq!(book.len(), 1);
        assert!(book.get(0).unwrap().is_placeholder());
        assert_eq!(book.position("No recipe"), Some(0));
    }

    #[test]
    fn book_lookup_by_name() {
        let mut a = Recipe::placeholder();
        a.name = "A".into();
        let mut b = Recipe::placeholder();
        b.name = "B".into();
        let book = RecipeBook::new(vec![a, b]);
        assert_eq!(book.position("B"), Some(1));
        assert_eq!(book.position("C"), None);
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn error_messages_name_the_file() {
        let e = RecipeError::Invalid {
            path: PathBuf::from("recipes/x.json"),
            reason: "recipe name must not be empty".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid recipe in recipes/x.json: recipe name must not be empty"
        );
    }
}
