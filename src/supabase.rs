//! PostgREST adapter for the hosted backing store.
//!
//! [`SupabaseStore`] is a stateless mapping and transport layer: it owns
//! no entity data, translating between the in-process models and the
//! remote schema's column names (`keywords_list`, `analysis`,
//! `crawl_targets`, `categories`, `menu_settings`) with a fixed textual
//! timestamp form on the wire.
//!
//! All requests share one `reqwest` client with a bounded per-call
//! timeout; a timed-out call fails soft exactly like any other transport
//! failure and does not flip the session mode by itself. The public
//! [`RemoteStore`] surface converts every internal error into a logged
//! `false`/empty result.
//!
//! Change feeds ride a server-sent-events stream per table; payloads are
//! opaque signals, so subscribers refetch the full collection.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::models::{
    AnalysisResult, Category, CrawlJob, CrawlJobStatus, CrawlTarget, Keyword, MenuSettings,
};
use crate::remote::{ChangeEvent, ProbeStatus, RemoteStore, Table};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ---- remote row shapes ----

#[derive(Debug, Serialize, Deserialize)]
struct KeywordRow {
    id: String,
    keywords: String,
    dept1_category: Option<String>,
    dept2_category: Option<String>,
    source_url: Option<String>,
    frequency: i64,
    created_at: String,
    updated_at: String,
}

impl KeywordRow {
    fn from_model(keyword: &Keyword) -> Self {
        Self {
            id: keyword.id.clone(),
            keywords: keyword.text.clone(),
            dept1_category: keyword.primary_category.clone(),
            dept2_category: keyword.secondary_category.clone(),
            source_url: keyword.source_url.clone(),
            frequency: i64::from(keyword.frequency),
            created_at: format_ts(keyword.created_at),
            updated_at: format_ts(keyword.updated_at),
        }
    }

    fn into_model(self) -> Keyword {
        Keyword {
            id: self.id,
            text: self.keywords,
            primary_category: self.dept1_category,
            secondary_category: self.dept2_category,
            source_url: self.source_url,
            frequency: u32::try_from(self.frequency.max(0)).unwrap_or(0),
            created_at: parse_ts(&self.created_at),
            updated_at: parse_ts(&self.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AnalysisRow {
    id: String,
    keyword1: String,
    keyword2: String,
    title: String,
    description: String,
    suggestions: Vec<String>,
    generated_at: String,
}

impl AnalysisRow {
    fn from_model(analysis: &AnalysisResult) -> Self {
        Self {
            id: analysis.id.clone(),
            keyword1: analysis.keyword1.clone(),
            keyword2: analysis.keyword2.clone(),
            title: analysis.title.clone(),
            description: analysis.description.clone(),
            suggestions: analysis.suggestions.clone(),
            generated_at: format_ts(analysis.generated_at),
        }
    }

    fn into_model(self) -> AnalysisResult {
        AnalysisResult {
            id: self.id,
            keyword1: self.keyword1,
            keyword2: self.keyword2,
            title: self.title,
            description: self.description,
            suggestions: self.suggestions,
            generated_at: parse_ts(&self.generated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CrawlTargetRow {
    id: String,
    domain: String,
    url: String,
    last_crawled: Option<String>,
    is_active: bool,
}

impl CrawlTargetRow {
    fn from_model(target: &CrawlTarget) -> Self {
        Self {
            id: target.id.clone(),
            domain: target.domain.clone(),
            url: target.url.clone(),
            last_crawled: target.last_crawled.map(format_ts),
            is_active: target.active,
        }
    }

    fn into_model(self) -> CrawlTarget {
        CrawlTarget {
            id: self.id,
            domain: self.domain,
            url: self.url,
            last_crawled: self.last_crawled.as_deref().map(parse_ts),
            active: self.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CrawlJobRow {
    id: String,
    target_url: String,
    status: String,
    started_at: String,
    completed_at: Option<String>,
    keywords_extracted: i64,
    error_message: Option<String>,
}

impl CrawlJobRow {
    fn from_model(job: &CrawlJob) -> Self {
        Self {
            id: job.id.clone(),
            target_url: job.target_url.clone(),
            status: job.status.label().to_string(),
            started_at: format_ts(job.started_at),
            completed_at: job.completed_at.map(format_ts),
            keywords_extracted: i64::from(job.keywords_extracted),
            error_message: job.error_message.clone(),
        }
    }

    fn into_model(self) -> CrawlJob {
        let status = match self.status.as_str() {
            "completed" => CrawlJobStatus::Completed,
            "failed" => CrawlJobStatus::Failed,
            _ => CrawlJobStatus::Pending,
        };
        CrawlJob {
            id: self.id,
            target_url: self.target_url,
            status,
            started_at: parse_ts(&self.started_at),
            completed_at: self.completed_at.as_deref().map(parse_ts),
            keywords_extracted: u32::try_from(self.keywords_extracted.max(0)).unwrap_or(0),
            error_message: self.error_message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CategoryRow {
    code: String,
    category_nm: String,
    created_at: String,
    updated_at: String,
}

impl CategoryRow {
    fn from_model(category: &Category) -> Self {
        Self {
            code: category.code.clone(),
            category_nm: category.name.clone(),
            created_at: format_ts(category.created_at),
            updated_at: format_ts(category.updated_at),
        }
    }

    fn into_model(self) -> Category {
        Category {
            code: self.code,
            name: self.category_nm,
            created_at: parse_ts(&self.created_at),
            updated_at: parse_ts(&self.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MenuSettingsRow {
    id: String,
    #[serde(flatten)]
    settings: MenuSettings,
}

// ---- adapter ----

/// PostgREST transport to the hosted store.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn rest_url(&self, relation: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, relation)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn upsert_rows<R: Serialize>(&self, table: Table, rows: &[R]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = format!("{}?on_conflict=id", self.rest_url(table.relation()));
        let resp = self
            .authed(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates")
            .json(rows)
            .send()
            .await?;
        ensure_success(table, resp).await
    }

    async fn insert_row<R: Serialize>(&self, table: Table, row: &R) -> Result<()> {
        let resp = self
            .authed(self.client.post(self.rest_url(table.relation())))
            .json(&[row])
            .send()
            .await?;
        ensure_success(table, resp).await
    }

    async fn list_rows<R: for<'de> Deserialize<'de>>(
        &self,
        table: Table,
        order: &str,
    ) -> Result<Vec<R>> {
        let url = format!("{}?select=*&order={}", self.rest_url(table.relation()), order);
        let resp = self.authed(self.client.get(&url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            bail!(
                "{} select failed: HTTP {}: {}",
                table.relation(),
                status,
                resp.text().await.unwrap_or_default()
            );
        }
        Ok(resp.json().await?)
    }

    async fn delete_rows(&self, table: Table, filter: &str) -> Result<()> {
        let url = format!("{}?{}", self.rest_url(table.relation()), filter);
        let resp = self.authed(self.client.delete(&url)).send().await?;
        ensure_success(table, resp).await
    }

    async fn try_provision(&self) -> Result<()> {
        // Structured provisioning RPCs first.
        let rpcs = [
            "create_keywords_table",
            "create_analysis_table",
            "create_crawl_targets_table",
            "create_crawl_jobs_table",
            "create_categories_table",
            "create_menu_settings_table",
        ];
        let mut rpc_ok = true;
        for rpc in rpcs {
            let url = format!("{}/rest/v1/rpc/{}", self.base_url, rpc);
            let resp = self
                .authed(self.client.post(&url))
                .json(&serde_json::json!({}))
                .send()
                .await?;
            if !resp.status().is_success() {
                debug!("provisioning rpc {rpc} failed: HTTP {}", resp.status());
                rpc_ok = false;
                break;
            }
        }
        if rpc_ok {
            return Ok(());
        }

        // Fallback: raw schema-definition statements.
        let url = format!("{}/rest/v1/rpc/exec_sql", self.base_url);
        for ddl in SCHEMA_DDL {
            let resp = self
                .authed(self.client.post(&url))
                .json(&serde_json::json!({ "sql": ddl }))
                .send()
                .await?;
            if !resp.status().is_success() {
                bail!(
                    "schema provisioning failed: HTTP {}: {}",
                    resp.status(),
                    resp.text().await.unwrap_or_default()
                );
            }
        }
        Ok(())
    }
}

async fn ensure_success(table: Table, resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        bail!(
            "{} write failed: HTTP {}: {}",
            table.relation(),
            status,
            resp.text().await.unwrap_or_default()
        );
    }
}

/// Postgres error class for "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

const SCHEMA_DDL: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS keywords_list (
        id UUID DEFAULT gen_random_uuid() PRIMARY KEY,
        keywords VARCHAR(255) NOT NULL,
        dept1_category VARCHAR(100),
        dept2_category VARCHAR(100),
        source_url TEXT,
        frequency INTEGER DEFAULT 1,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS analysis (
        id UUID DEFAULT gen_random_uuid() PRIMARY KEY,
        keyword1 VARCHAR(255) NOT NULL,
        keyword2 VARCHAR(255) NOT NULL,
        title VARCHAR(500) NOT NULL,
        description TEXT,
        suggestions TEXT[],
        generated_at TIMESTAMP WITH TIME ZONE
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS crawl_targets (
        id UUID DEFAULT gen_random_uuid() PRIMARY KEY,
        domain VARCHAR(255) NOT NULL,
        url TEXT NOT NULL,
        last_crawled TIMESTAMP WITH TIME ZONE,
        is_active BOOLEAN DEFAULT TRUE
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS crawl_jobs (
        id UUID DEFAULT gen_random_uuid() PRIMARY KEY,
        target_url TEXT NOT NULL,
        status VARCHAR(20) DEFAULT 'pending',
        started_at TIMESTAMP WITH TIME ZONE,
        completed_at TIMESTAMP WITH TIME ZONE,
        keywords_extracted INTEGER DEFAULT 0,
        error_message TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        code VARCHAR(50) PRIMARY KEY,
        category_nm VARCHAR(255) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS menu_settings (
        id VARCHAR(50) PRIMARY KEY,
        show_keywords_tab BOOLEAN DEFAULT TRUE,
        show_trends_tab BOOLEAN DEFAULT TRUE,
        show_crawl_tab BOOLEAN DEFAULT TRUE,
        show_share_tab BOOLEAN DEFAULT TRUE,
        show_analysis_history BOOLEAN DEFAULT TRUE,
        show_system_guide BOOLEAN DEFAULT TRUE
    );
    "#,
];

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn probe(&self) -> ProbeStatus {
        let url = format!("{}?select=id&limit=1", self.rest_url(Table::Keywords.relation()));
        match self.authed(self.client.get(&url)).send().await {
            Ok(resp) if resp.status().is_success() => ProbeStatus::Connected,
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                if body.contains(UNDEFINED_TABLE) {
                    ProbeStatus::SchemaMissing
                } else {
                    debug!("probe rejected: HTTP {status}: {body}");
                    ProbeStatus::Unreachable
                }
            }
            Err(e) => {
                debug!("probe failed: {e}");
                ProbeStatus::Unreachable
            }
        }
    }

    async fn provision_schema(&self) -> bool {
        match self.try_provision().await {
            Ok(()) => true,
            Err(e) => {
                warn!("schema provisioning failed: {e:#}");
                false
            }
        }
    }

    async fn upsert_keywords(&self, keywords: &[Keyword]) -> bool {
        let rows: Vec<KeywordRow> = keywords.iter().map(KeywordRow::from_model).collect();
        match self.upsert_rows(Table::Keywords, &rows).await {
            Ok(()) => true,
            Err(e) => {
                warn!("keyword upsert failed: {e:#}");
                false
            }
        }
    }

    async fn list_keywords(&self) -> Vec<Keyword> {
        match self
            .list_rows::<KeywordRow>(Table::Keywords, "frequency.desc")
            .await
        {
            Ok(rows) => rows.into_iter().map(KeywordRow::into_model).collect(),
            Err(e) => {
                warn!("keyword select failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn delete_keyword(&self, id: &str) -> bool {
        match self
            .delete_rows(Table::Keywords, &format!("id=eq.{id}"))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("keyword delete failed: {e:#}");
                false
            }
        }
    }

    async fn insert_analysis(&self, analysis: &AnalysisResult) -> bool {
        let row = AnalysisRow::from_model(analysis);
        match self.insert_row(Table::Analyses, &row).await {
            Ok(()) => true,
            Err(e) => {
                warn!("analysis insert failed: {e:#}");
                false
            }
        }
    }

    async fn list_analyses(&self) -> Vec<AnalysisResult> {
        match self
            .list_rows::<AnalysisRow>(Table::Analyses, "generated_at.desc")
            .await
        {
            Ok(rows) => rows.into_iter().map(AnalysisRow::into_model).collect(),
            Err(e) => {
                warn!("analysis select failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn delete_analysis(&self, id: &str) -> bool {
        match self
            .delete_rows(Table::Analyses, &format!("id=eq.{id}"))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("analysis delete failed: {e:#}");
                false
            }
        }
    }

    async fn clear_analyses(&self) -> bool {
        // Matches every row: id is never the empty string.
        match self.delete_rows(Table::Analyses, "id=neq.").await {
            Ok(()) => true,
            Err(e) => {
                warn!("analysis clear failed: {e:#}");
                false
            }
        }
    }

    async fn upsert_crawl_targets(&self, targets: &[CrawlTarget]) -> bool {
        let rows: Vec<CrawlTargetRow> = targets.iter().map(CrawlTargetRow::from_model).collect();
        match self.upsert_rows(Table::CrawlTargets, &rows).await {
            Ok(()) => true,
            Err(e) => {
                warn!("crawl target upsert failed: {e:#}");
                false
            }
        }
    }

    async fn list_crawl_targets(&self) -> Vec<CrawlTarget> {
        match self
            .list_rows::<CrawlTargetRow>(Table::CrawlTargets, "domain.asc")
            .await
        {
            Ok(rows) => rows
                .into_iter()
                .map(CrawlTargetRow::into_model)
                .filter(|t| t.active)
                .collect(),
            Err(e) => {
                warn!("crawl target select failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn deactivate_crawl_target(&self, id: &str) -> bool {
        let url = format!("{}?id=eq.{id}", self.rest_url(Table::CrawlTargets.relation()));
        let result = async {
            let resp = self
                .authed(self.client.patch(&url))
                .json(&serde_json::json!({ "is_active": false }))
                .send()
                .await?;
            ensure_success(Table::CrawlTargets, resp).await
        }
        .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("crawl target deactivate failed: {e:#}");
                false
            }
        }
    }

    async fn upsert_crawl_jobs(&self, jobs: &[CrawlJob]) -> bool {
        let rows: Vec<CrawlJobRow> = jobs.iter().map(CrawlJobRow::from_model).collect();
        match self.upsert_rows(Table::CrawlJobs, &rows).await {
            Ok(()) => true,
            Err(e) => {
                warn!("crawl job upsert failed: {e:#}");
                false
            }
        }
    }

    async fn list_crawl_jobs(&self) -> Vec<CrawlJob> {
        let url = format!(
            "{}?select=*&order=started_at.desc&limit=50",
            self.rest_url(Table::CrawlJobs.relation())
        );
        let result = async {
            let resp = self.authed(self.client.get(&url)).send().await?;
            let status = resp.status();
            if !status.is_success() {
                bail!("crawl job select failed: HTTP {status}");
            }
            let rows: Vec<CrawlJobRow> = resp.json().await?;
            Ok::<_, anyhow::Error>(rows)
        }
        .await;
        match result {
            Ok(rows) => rows.into_iter().map(CrawlJobRow::into_model).collect(),
            Err(e) => {
                warn!("crawl job select failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn upsert_categories(&self, categories: &[Category]) -> bool {
        if categories.is_empty() {
            return true;
        }
        let rows: Vec<CategoryRow> = categories.iter().map(CategoryRow::from_model).collect();
        // categories is keyed by code, not id.
        let url = format!("{}?on_conflict=code", self.rest_url(Table::Categories.relation()));
        let result = async {
            let resp = self
                .authed(self.client.post(&url))
                .header("Prefer", "resolution=merge-duplicates")
                .json(&rows)
                .send()
                .await?;
            ensure_success(Table::Categories, resp).await
        }
        .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("category upsert failed: {e:#}");
                false
            }
        }
    }

    async fn list_categories(&self) -> Vec<Category> {
        match self
            .list_rows::<CategoryRow>(Table::Categories, "code.asc")
            .await
        {
            Ok(rows) => rows.into_iter().map(CategoryRow::into_model).collect(),
            Err(e) => {
                warn!("category select failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn save_menu_settings(&self, settings: &MenuSettings) -> bool {
        let row = MenuSettingsRow {
            id: "default".to_string(),
            settings: settings.clone(),
        };
        match self.upsert_rows(Table::MenuSettings, &[row]).await {
            Ok(()) => true,
            Err(e) => {
                warn!("menu settings upsert failed: {e:#}");
                false
            }
        }
    }

    async fn load_menu_settings(&self) -> Option<MenuSettings> {
        let url = format!(
            "{}?select=*&id=eq.default&limit=1",
            self.rest_url(Table::MenuSettings.relation())
        );
        let result = async {
            let resp = self.authed(self.client.get(&url)).send().await?;
            let status = resp.status();
            if !status.is_success() {
                bail!("menu settings select failed: HTTP {status}");
            }
            let rows: Vec<MenuSettingsRow> = resp.json().await?;
            Ok::<_, anyhow::Error>(rows.into_iter().next().map(|r| r.settings))
        }
        .await;
        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("menu settings load failed: {e:#}");
                None
            }
        }
    }

    fn subscribe_changes(&self, table: Table) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel(16);
        let url = format!(
            "{}/realtime/v1/changes?table={}",
            self.base_url,
            table.relation()
        );
        let request = self.authed(self.client.get(&url));
        tokio::spawn(async move {
            let mut source = match EventSource::new(request) {
                Ok(source) => source,
                Err(e) => {
                    warn!("change feed for {} unavailable: {e}", table.relation());
                    return;
                }
            };
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {
                        debug!("change feed open for {}", table.relation());
                    }
                    Ok(Event::Message(_)) => {
                        // Opaque signal; the notifier refetches.
                        if tx.send(ChangeEvent { table }).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        if tx.is_closed() {
                            break;
                        }
                        debug!("change feed error for {}: {e}", table.relation());
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
            source.close();
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_row_roundtrip_preserves_fields() {
        let now = Utc::now();
        let keyword = Keyword {
            id: "k1".to_string(),
            text: "AI".to_string(),
            primary_category: Some("Technology".to_string()),
            secondary_category: None,
            source_url: Some("https://example.com".to_string()),
            frequency: 15,
            created_at: now,
            updated_at: now,
        };
        let back = KeywordRow::from_model(&keyword).into_model();
        assert_eq!(back.id, keyword.id);
        assert_eq!(back.text, keyword.text);
        assert_eq!(back.primary_category, keyword.primary_category);
        assert_eq!(back.frequency, keyword.frequency);
    }

    #[test]
    fn negative_remote_frequency_clamps_to_zero() {
        let row = KeywordRow {
            id: "k1".to_string(),
            keywords: "AI".to_string(),
            dept1_category: None,
            dept2_category: None,
            source_url: None,
            frequency: -3,
            created_at: format_ts(Utc::now()),
            updated_at: format_ts(Utc::now()),
        };
        assert_eq!(row.into_model().frequency, 0);
    }

    #[test]
    fn crawl_job_row_status_roundtrip() {
        let mut job = CrawlJob::started("https://example.com");
        job.complete(4);
        let back = CrawlJobRow::from_model(&job).into_model();
        assert_eq!(back.status, CrawlJobStatus::Completed);
        assert_eq!(back.keywords_extracted, 4);
        assert!(back.completed_at.is_some());

        // Unrecognized remote status degrades to pending.
        let row = CrawlJobRow {
            id: "j1".to_string(),
            target_url: "https://example.com".to_string(),
            status: "archived".to_string(),
            started_at: format_ts(Utc::now()),
            completed_at: None,
            keywords_extracted: -2,
            error_message: None,
        };
        let model = row.into_model();
        assert_eq!(model.status, CrawlJobStatus::Pending);
        assert_eq!(model.keywords_extracted, 0);
    }

    #[test]
    fn wire_timestamps_parse_back() {
        let ts = parse_ts("2026-01-15T09:30:00.000Z");
        assert_eq!(format_ts(ts), "2026-01-15T09:30:00.000Z");
    }

    #[tokio::test]
    async fn unreachable_store_fails_soft() {
        let config = RemoteConfig {
            url: "http://127.0.0.1:1".to_string(),
            api_key: "anon".to_string(),
            timeout_secs: 1,
            auto_provision: false,
        };
        let store = SupabaseStore::new(&config).unwrap();

        assert_eq!(store.probe().await, ProbeStatus::Unreachable);
        assert!(!store.upsert_keywords(&[Keyword::new_local("AI")]).await);
        assert!(store.list_keywords().await.is_empty());
        assert!(!store.delete_keyword("1").await);
        assert!(store.load_menu_settings().await.is_none());
    }
}
