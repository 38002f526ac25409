use regex::Regex;
use std::sync::OnceLock;

use crate::recipe::{Beans, Recipe, Step};

/// Shown wherever a ratio cannot be computed
pub const NO_RATIO: &str = "-";

/// Summary values shown for the selected recipe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrewMetrics {
    pub total_duration_secs: u32,
    pub total_water_grams: u32,
    pub bean_mass_grams: f64,
}

impl BrewMetrics {
    pub fn for_recipe(recipe: &Recipe) -> Self {
        Self {
            total_duration_secs: total_duration(&recipe.steps),
            total_water_grams: total_water(&recipe.steps),
            bean_mass_grams: bean_mass(&recipe.beans),
        }
    }

    /// Water-to-bean ratio, or None when the bean mass is not positive
    pub fn brew_ratio(&self) -> Option<f64> {
        if self.bean_mass_grams > 0.0 {
            Some(self.total_water_grams as f64 / self.bean_mass_grams)
        } else {
            None
        }
    }

    pub fn ratio_label(&self) -> String {
        match self.brew_ratio() {
            Some(ratio) => format!("1:{ratio:.1}"),
            None => NO_RATIO.to_string(),
        }
    }

    pub fn total_time_label(&self) -> String {
        format_mmss(self.total_duration_secs)
    }

    pub fn total_water_label(&self) -> String {
        format!("{}g", self.total_water_grams)
    }
}

pub fn total_duration(steps: &[Step]) -> u32 {
    steps.iter().map(|s| s.duration).sum()
}

pub fn total_water(steps: &[Step]) -> u32 {
    steps.iter().map(|s| s.water).sum()
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-+]?\d*\.\d+|\d+").expect("static pattern"))
}

/// Extracts the bean dose in grams. Text is scanned for its first number;
/// anything unparseable counts as zero.
pub fn bean_mass(beans: &Beans) -> f64 {
    match beans {
        Beans::Grams(g) => *g,
        Beans::Text(text) => number_pattern()
            .find(text)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0),
    }
}

/// Formats seconds as zero padded MM:SS
pub fn format_mmss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
