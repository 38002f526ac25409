use std::fs;

use brewtick::metrics::BrewMetrics;
use brewtick::store::{load_dir, RecipeBook, RecipeError};
use tempfile::tempdir;

#[test]
fn loads_a_recipe_directory_and_computes_metrics() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("01-hario.json"),
        r#"{
            "name": "Hario 4:6",
            "beans": "20g",
            "temp": "92C",
            "grind": "Medium-coarse",
            "url": "https://example.com/46",
            "steps": [
                {"action": "Bloom", "duration": 45, "water": 60},
                {"action": "Pour", "duration": 45, "water": 60},
                {"action": "Pour", "duration": 45, "water": 60},
                {"action": "Pour", "duration": 45, "water": 60},
                {"action": "Pour", "duration": 45, "water": 60}
            ]
        }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("02-batch.json"),
        r#"[
            {"name": "Iced", "beans": 25, "steps": [{"action": "Pour", "duration": 120, "water": 250}]},
            {"name": "Broken", "steps": [{"action": "Pour", "duration": "soon", "water": 1}]}
        ]"#,
    )
    .unwrap();

    let report = load_dir(dir.path());
    // one malformed recipe poisons only its own file
    assert_eq!(report.issues.len(), 1);
    assert!(matches!(report.issues[0], RecipeError::Parse { .. }));

    let book = RecipeBook::from(report);
    assert_eq!(book.len(), 1);
    let hario = book.get(0).unwrap();
    let m = BrewMetrics::for_recipe(hario);
    assert_eq!(m.total_water_grams, 300);
    assert_eq!(m.total_time_label(), "03:45");
    assert_eq!(m.ratio_label(), "1:15.0");
    assert_eq!(hario.url(), Some("https://example.com/46"));
}

#[test]
fn empty_directory_yields_placeholder() {
    let dir = tempdir().unwrap();
    let book = RecipeBook::from(load_dir(dir.path()));
    assert_eq!(book.len(), 1);
    let r = book.get(0).unwrap();
    assert_eq!(r.name, "No recipe");
    assert!(r.steps.is_empty());
    assert_eq!(BrewMetrics::for_recipe(r).ratio_label(), "-");
}
