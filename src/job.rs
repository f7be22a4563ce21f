use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much of a step result is kept in the history log.
const HISTORY_PREVIEW_CHARS: usize = 100;

/// Tracks the lifecycle status of a job. `Completed` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// A single work request in flight: the original request text, the named
/// artifacts produced so far, an append-only step log, and spend against a
/// budget ceiling fixed at creation.
///
/// Jobs are created fresh per request and discarded once the caller has the
/// report; only worker state and the treasury persist across jobs.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub request: String,
    pub status: JobStatus,
    pub artifacts: BTreeMap<String, String>,
    pub history: Vec<String>,
    pub cost: i64,
    pub budget: i64,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(request: &str, budget: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request: request.to_string(),
            status: JobStatus::Pending,
            artifacts: BTreeMap::new(),
            history: Vec::new(),
            cost: 0,
            budget,
            created_at: Utc::now(),
        }
    }

    /// Append a step record with a truncated result preview.
    pub fn append_history(&mut self, worker_id: &str, action: &str, result: &str) {
        let preview: String = if result.chars().count() > HISTORY_PREVIEW_CHARS {
            let head: String = result.chars().take(HISTORY_PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            result.to_string()
        };
        self.history
            .push(format!("[{worker_id}]: {action} -> '{preview}'"));
    }

    /// Reserve `amount` against the budget ceiling. Refuses without
    /// mutating when the new total would exceed the ceiling, so a rejected
    /// step never inflates the reported cost.
    pub fn spend(&mut self, amount: i64) -> bool {
        if self.cost + amount > self.budget {
            return false;
        }
        self.cost += amount;
        true
    }

    /// Return a previously reserved amount, e.g. when the treasury refuses
    /// the matching debit.
    pub fn refund(&mut self, amount: i64) {
        self.cost -= amount;
    }
}

/// Audit output produced for every executed job, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub request: String,
    pub guild: String,
    pub difficulty: String,
    pub status: JobStatus,
    pub result: Option<String>,
    pub history: Vec<String>,
    pub cost: i64,
    /// Signed settlement applied to the treasury: reward if positive,
    /// penalty if negative.
    pub settled: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn from_job(
        job: &Job,
        guild: &str,
        difficulty: &str,
        result: Option<String>,
        settled: i64,
    ) -> Self {
        Self {
            job_id: job.id.clone(),
            request: job.request.clone(),
            guild: guild.to_string(),
            difficulty: difficulty.to_string(),
            status: job.status,
            result,
            history: job.history.clone(),
            cost: job.cost,
            settled,
            started_at: job.created_at,
            finished_at: Utc::now(),
        }
    }
}
