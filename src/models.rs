//! Core data models for the dashboard synchronization engine.
//!
//! These types are the canonical in-process shapes. The remote adapter
//! owns the translation to and from the hosted schema's column names;
//! nothing here depends on the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A keyword collected from a crawl (or entered by hand).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: String,
    pub text: String,
    pub primary_category: Option<String>,
    pub secondary_category: Option<String>,
    pub source_url: Option<String>,
    /// Occurrence count; never negative by construction.
    pub frequency: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A generated pairwise analysis.
///
/// The analysis collection is an append-only log: there is deliberately
/// no uniqueness constraint on the `(keyword1, keyword2)` pair, so
/// generating twice for the same pair yields two entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub keyword1: String,
    pub keyword2: String,
    pub title: String,
    pub description: String,
    /// Ordered, non-empty list of suggestion strings.
    pub suggestions: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// A site registered for crawling.
///
/// Deletion is logical: the remote table keeps the row with
/// `is_active = false`, and `url` is unique only among active targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub id: String,
    pub domain: String,
    pub url: String,
    pub last_crawled: Option<DateTime<Utc>>,
    pub active: bool,
}

/// A keyword category, keyed by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The singleton `default` record of dashboard menu toggles.
///
/// Unset fields default to enabled so a partial remote row never hides
/// a tab the user did not explicitly turn off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSettings {
    #[serde(default = "enabled")]
    pub show_keywords_tab: bool,
    #[serde(default = "enabled")]
    pub show_trends_tab: bool,
    #[serde(default = "enabled")]
    pub show_crawl_tab: bool,
    #[serde(default = "enabled")]
    pub show_share_tab: bool,
    #[serde(default = "enabled")]
    pub show_analysis_history: bool,
    #[serde(default = "enabled")]
    pub show_system_guide: bool,
}

fn enabled() -> bool {
    true
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            show_keywords_tab: true,
            show_trends_tab: true,
            show_crawl_tab: true,
            show_share_tab: true,
            show_analysis_history: true,
            show_system_guide: true,
        }
    }
}

/// Terminal state of a single crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlStatus {
    Completed,
    Failed,
}

/// What a crawl producer hands back to the coordinator.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub status: CrawlStatus,
    pub new_keywords: Vec<Keyword>,
    pub error: Option<String>,
}

/// Lifecycle state of a recorded crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlJobStatus {
    Pending,
    Completed,
    Failed,
}

impl CrawlJobStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One entry in the crawl-job history.
///
/// A job is recorded `Pending` when a crawl starts and finalized to
/// `Completed` or `Failed` when it ends; the history is kept alongside
/// the other collections and never pruned implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlJob {
    pub id: String,
    pub target_url: String,
    pub status: CrawlJobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub keywords_extracted: u32,
    pub error_message: Option<String>,
}

impl CrawlJob {
    /// A job that just started against `target_url`.
    pub fn started(target_url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target_url: target_url.into(),
            status: CrawlJobStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            keywords_extracted: 0,
            error_message: None,
        }
    }

    pub fn complete(&mut self, keywords_extracted: u32) {
        self.status = CrawlJobStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.keywords_extracted = keywords_extracted;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = CrawlJobStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(message.into());
    }
}

/// Aggregate counts for the `status` command.
///
/// `recent_crawl_jobs` counts jobs started within the last seven days.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub total_keywords: usize,
    pub total_analyses: usize,
    pub active_crawl_targets: usize,
    pub recent_crawl_jobs: usize,
}

/// Aggregate figures over the analysis history.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisStats {
    pub total_analyses: usize,
    pub unique_keywords: usize,
    pub average_suggestions: f64,
}

impl Keyword {
    /// Build a keyword created locally right now, with a fresh v4 id.
    pub fn new_local(text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            primary_category: None,
            secondary_category: None,
            source_url: None,
            frequency: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

impl CrawlTarget {
    pub fn new_local(domain: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            domain: domain.into(),
            url: url.into(),
            last_crawled: None,
            active: true,
        }
    }
}

/// Export the analysis history as pretty-printed JSON.
pub fn analyses_to_json(analyses: &[AnalysisResult]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(analyses)?)
}

/// Export the analysis history as CSV with a fixed header row.
/// Suggestions are joined with `; ` inside one quoted field.
pub fn analyses_to_csv(analyses: &[AnalysisResult]) -> String {
    let mut out = String::from("id,keyword1,keyword2,title,description,suggestions,generated_at\n");
    for a in analyses {
        let row = [
            a.id.as_str(),
            a.keyword1.as_str(),
            a.keyword2.as_str(),
            a.title.as_str(),
            a.description.as_str(),
            &a.suggestions.join("; "),
            &a.generated_at.to_rfc3339(),
        ]
        .map(csv_field)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_export_quotes_embedded_delimiters() {
        let analysis = AnalysisResult {
            id: "a1".to_string(),
            keyword1: "AI".to_string(),
            keyword2: "Cloud".to_string(),
            title: "AI, Cloud".to_string(),
            description: "say \"hello\"".to_string(),
            suggestions: vec!["one".to_string(), "two".to_string()],
            generated_at: Utc::now(),
        };
        let csv = analyses_to_csv(&[analysis]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,keyword1,keyword2"));
        assert!(lines[1].contains("\"AI, Cloud\""));
        assert!(lines[1].contains("\"say \"\"hello\"\"\""));
        assert!(lines[1].contains("one; two"));
    }

    #[test]
    fn json_export_round_trips() {
        let analysis = AnalysisResult {
            id: "a1".to_string(),
            keyword1: "AI".to_string(),
            keyword2: "Cloud".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            suggestions: vec!["one".to_string()],
            generated_at: Utc::now(),
        };
        let json = analyses_to_json(std::slice::from_ref(&analysis)).unwrap();
        let parsed: Vec<AnalysisResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![analysis]);
    }
}
