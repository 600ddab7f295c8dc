//! Shared plan board written by `update-plan` actions.

use chrono::{DateTime, Utc};
use crew_domain::{AgentId, UpdatePlanParams};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The latest plan published by one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    pub owner: AgentId,
    pub summary: String,
    pub steps: Vec<String>,
    pub status: Option<String>,
    pub thread_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PlanRecord {
    pub fn from_params(owner: AgentId, params: &UpdatePlanParams, thread_id: Option<String>) -> Self {
        Self {
            owner,
            summary: params.summary.clone(),
            steps: params.steps.clone(),
            status: params.status.clone(),
            thread_id,
            updated_at: Utc::now(),
        }
    }

    /// Multi-line rendering for memory and console output.
    pub fn render(&self) -> String {
        let mut out = self.summary.clone();
        if let Some(status) = &self.status {
            out.push_str(&format!(" [{status}]"));
        }
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("\n{}. {step}", i + 1));
        }
        out
    }
}

/// One plan per owning agent; a newer plan replaces the older one.
#[derive(Debug, Clone, Default)]
pub struct PlanBoard {
    plans: Arc<RwLock<HashMap<AgentId, PlanRecord>>>,
}

impl PlanBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, record: PlanRecord) {
        self.plans
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.owner.clone(), record);
    }

    pub fn get(&self, owner: &AgentId) -> Option<PlanRecord> {
        self.plans
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(owner)
            .cloned()
    }

    /// Every plan, most recently updated first.
    pub fn all(&self) -> Vec<PlanRecord> {
        let mut plans: Vec<_> = self
            .plans
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        plans
    }
}
