//! Pairwise analysis generation.
//!
//! The sync core only sees the [`AnalysisGenerator`] trait; the template
//! implementation here is wired in by the binary. Generated entries keep
//! the append-only log semantics: the same pair can be generated any
//! number of times and every run produces a fresh entry.

use anyhow::{bail, Result};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::AnalysisResult;

/// Produces one analysis entry for a keyword pair.
pub trait AnalysisGenerator: Send + Sync {
    /// Generate an analysis. The two keywords must differ and be
    /// non-empty; violations are the caller's error, not a soft failure.
    fn generate(&self, keyword1: &str, keyword2: &str) -> Result<AnalysisResult>;
}

const TITLE_TEMPLATES: &[&str] = &[
    "{k1} and {k2}: an emerging intersection",
    "How {k1} reshapes {k2}",
    "{k1} meets {k2}",
    "The {k1}/{k2} opportunity",
];

const DESCRIPTION_TEMPLATES: &[&str] = &[
    "Interest in {k1} and {k2} is trending together. Teams combining the \
     two report faster iteration and broader reach.",
    "{k1} is increasingly discussed alongside {k2}. The overlap suggests \
     content and product angles worth exploring.",
    "Search activity links {k1} with {k2}. Early movers on the combined \
     topic see outsized engagement.",
];

const SUGGESTION_TEMPLATES: &[&str] = &[
    "Publish a comparison piece on {k1} versus {k2}",
    "Build a landing page targeting the {k1} + {k2} query",
    "Survey your audience about {k1} in the context of {k2}",
    "Run a short campaign pairing {k1} content with {k2} channels",
    "Add {k2} as a secondary tag on existing {k1} material",
    "Track weekly volume for the combined {k1} {k2} phrase",
    "Prototype a {k1} feature informed by {k2} feedback",
    "Pitch a webinar covering {k1} through a {k2} lens",
];

/// Template-bank generator: random title, description, and 4 to 6
/// suggestions per run.
pub struct TemplateGenerator;

impl TemplateGenerator {
    fn fill(template: &str, k1: &str, k2: &str) -> String {
        template.replace("{k1}", k1).replace("{k2}", k2)
    }
}

impl AnalysisGenerator for TemplateGenerator {
    fn generate(&self, keyword1: &str, keyword2: &str) -> Result<AnalysisResult> {
        let k1 = keyword1.trim();
        let k2 = keyword2.trim();
        if k1.is_empty() || k2.is_empty() {
            bail!("both keywords are required");
        }
        if k1.eq_ignore_ascii_case(k2) {
            bail!("keywords must differ: got '{k1}' twice");
        }

        let mut rng = rand::thread_rng();
        let title = Self::fill(TITLE_TEMPLATES.choose(&mut rng).unwrap_or(&TITLE_TEMPLATES[0]), k1, k2);
        let description = Self::fill(
            DESCRIPTION_TEMPLATES
                .choose(&mut rng)
                .unwrap_or(&DESCRIPTION_TEMPLATES[0]),
            k1,
            k2,
        );

        let count = rng.gen_range(4..=6);
        let mut pool: Vec<&&str> = SUGGESTION_TEMPLATES.iter().collect();
        pool.shuffle(&mut rng);
        let suggestions = pool
            .into_iter()
            .take(count)
            .map(|t| Self::fill(t, k1, k2))
            .collect();

        Ok(AnalysisResult {
            id: uuid::Uuid::new_v4().to_string(),
            keyword1: k1.to_string(),
            keyword2: k2.to_string(),
            title,
            description,
            suggestions,
            generated_at: Utc::now(),
        })
    }
}
