use std::fmt;

use serde::Serialize;

use crate::aggregate::aggregate;
use crate::client::{GitHubClient, PortClient};
use crate::error::{SyncError, SyncResult};
use crate::logging::{log_error, log_info};
use crate::models::{EntityBatch, PortCredentials, UpsertPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Fetching,
    Aggregating,
    Authenticating,
    Upserting,
    Done,
    Failed(String),
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Start => write!(f, "start"),
            PipelineStage::Fetching => write!(f, "fetching"),
            PipelineStage::Aggregating => write!(f, "aggregating"),
            PipelineStage::Authenticating => write!(f, "authenticating"),
            PipelineStage::Upserting => write!(f, "upserting"),
            PipelineStage::Done => write!(f, "done"),
            PipelineStage::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub org: String,
    pub teams: usize,
    pub entities: usize,
    pub truncated_teams: Vec<String>,
    pub dry_run: bool,
    /// The request body that was (or in a dry run would have been) sent.
    #[serde(skip)]
    pub payload: Option<UpsertPayload>,
}

/// Runs one fetch → aggregate → authenticate → upsert pass.
pub struct Pipeline {
    github: GitHubClient,
    port: PortClient,
    org: String,
    credentials: PortCredentials,
    dry_run: bool,
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn new(
        github: GitHubClient,
        port: PortClient,
        org: &str,
        credentials: PortCredentials,
    ) -> Self {
        Self {
            github,
            port,
            org: org.to_string(),
            credentials,
            dry_run: false,
            stages: vec![PipelineStage::Start],
        }
    }

    /// Stop after aggregation without contacting the catalog.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Every stage entered so far, in order.
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn stage(&self) -> &PipelineStage {
        self.stages.last().unwrap_or(&PipelineStage::Start)
    }

    pub async fn run(&mut self) -> SyncResult<SyncReport> {
        match self.execute().await {
            Ok(report) => {
                self.enter(PipelineStage::Done);
                Ok(report)
            }
            Err(e) => {
                log_error(&format!("Sync failed while {} ({}): {}", self.stage(), e.kind(), e));
                self.enter(PipelineStage::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> SyncResult<SyncReport> {
        self.enter(PipelineStage::Fetching);
        let teams = self.github.fetch_all_teams(&self.org).await?;
        if teams.is_empty() {
            return Err(SyncError::UpstreamDataError("No GitHub teams found".to_string()));
        }
        log_info(&format!("Fetched {} teams from '{}'", teams.len(), self.org));

        self.enter(PipelineStage::Aggregating);
        let batch = aggregate(&teams)?;
        if batch.is_empty() {
            return Err(SyncError::UpstreamDataError(format!(
                "{} teams found but none has members",
                teams.len()
            )));
        }

        let mut report = self.report(teams.len(), &batch);
        if self.dry_run {
            log_info(&format!("Dry run: {} entities prepared, nothing sent", batch.len()));
            return Ok(report);
        }

        self.enter(PipelineStage::Authenticating);
        let token = self.port.authenticate(&self.credentials).await?;

        self.enter(PipelineStage::Upserting);
        let result = self.port.upsert(&token, &batch).await?;
        drop(token);

        log_info(&format!("Synchronized {} entities to Port", result.entities));
        report.entities = result.entities;
        Ok(report)
    }

    fn report(&self, teams: usize, batch: &EntityBatch) -> SyncReport {
        SyncReport {
            org: self.org.clone(),
            teams,
            entities: batch.len(),
            truncated_teams: batch.truncated_teams.clone(),
            dry_run: self.dry_run,
            payload: Some(batch.to_payload(self.port.blueprint())),
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.stages.push(stage);
    }
}
