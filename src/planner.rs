//! Plan decomposition for open-ended requests.
//!
//! A top-rank planner worker turns a request into an ordered list of
//! guild-tagged sub-tasks. The generic executor then runs the sub-tasks
//! through ephemeral mid-rank specialists, threading artifacts forward by
//! upper-cased placeholder. This path is deliberately non-economic: no
//! treasury interaction, no roster changes.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::extract::first_json_array;
use crate::memory::MemoryStore;
use crate::monarch::Monarch;
use crate::openai::ChatBackend;
use crate::worker::{Rank, Specialty, Worker};

/// One sub-task of a decomposed plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanStep {
    pub guild: String,
    pub prompt: String,
}

/// Artifacts plus history from an executed plan.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub artifacts: BTreeMap<String, String>,
    pub history: Vec<String>,
}

impl<B: ChatBackend, M: MemoryStore> Monarch<B, M> {
    /// Ask a top-rank planner to decompose the request into sub-tasks.
    /// Returns `None` when no well-formed plan can be extracted from the
    /// (possibly chatty) response; the raw output is logged for diagnosis.
    pub async fn decompose(&self, request: &str) -> Option<Vec<PlanStep>> {
        let planner = Worker::from_stored(
            "PLN-000".to_string(),
            Specialty::Planner,
            Rank::S.threshold(),
        );
        let profile = planner.profile(self.book());

        let guild_names: Vec<&str> = self
            .book()
            .guilds
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        let prompt = format!(
            "Decompose this request into 2-6 ordered sub-tasks. \
             Respond with ONLY a JSON array, no other text.\n\
             Format: [{{\"guild\": \"<guild>\", \"prompt\": \"<sub-task prompt>\"}}]\n\
             guild must be one of: {}\n\
             A later sub-task may reference an earlier result with {{STEP_1}}, {{STEP_2}}, ...\n\
             \n\
             Request: {request}",
            guild_names.join(", ")
        );

        let text = self
            .backend_ref()
            .complete(&profile.system_prompt, &prompt, profile.model)
            .await
            .ok()?;

        let Some(value) = first_json_array(&text) else {
            eprintln!("plan decomposition produced no parsable plan: {text}");
            return None;
        };
        let steps: Vec<PlanStep> = match serde_json::from_value(value) {
            Ok(steps) => steps,
            Err(e) => {
                eprintln!("plan decomposition fields did not parse ({e}): {text}");
                return None;
            }
        };
        if steps.is_empty() {
            eprintln!("plan decomposition produced an empty plan");
            return None;
        }
        Some(steps)
    }

    /// Run a decomposed plan. Each sub-task goes to an ephemeral rank-C
    /// specialist of its guild's starting specialty; prior artifacts are
    /// substituted by upper-cased placeholder name. Any sub-task that
    /// yields nothing aborts the whole plan.
    pub async fn execute_plan(&self, request: &str, plan: &[PlanStep]) -> Option<PlanOutcome> {
        let mut artifacts: BTreeMap<String, String> = BTreeMap::new();
        let mut history = Vec::new();

        for (i, step) in plan.iter().enumerate() {
            let guild = self
                .book()
                .guild_named(&step.guild)
                .unwrap_or_else(|| self.book().default_guild());

            let mut prompt = step.prompt.replace("{REQUEST}", request);
            for (name, text) in &artifacts {
                prompt = prompt.replace(&format!("{{{}}}", name.to_uppercase()), text);
            }

            let specialist = Worker::from_stored(
                format!("PLN-{}", guild.name),
                guild.starting_specialty,
                Rank::C.threshold(),
            );
            let out = specialist
                .perform_task(
                    self.backend_ref(),
                    self.memory_ref(),
                    self.tools_ref(),
                    self.book(),
                    &prompt,
                )
                .await;

            let Some(text) = out.text else {
                history.push(format!(
                    "[{}]: step_{} -> 'no result, plan aborted'",
                    specialist.id,
                    i + 1
                ));
                return None;
            };

            history.push(format!("[{}]: step_{} -> done", specialist.id, i + 1));
            artifacts.insert(format!("step_{}", i + 1), text);
        }

        Some(PlanOutcome { artifacts, history })
    }

    /// Decompose and execute in one call.
    pub async fn run_plan(&self, request: &str) -> Option<PlanOutcome> {
        let plan = self.decompose(request).await?;
        self.execute_plan(request, &plan).await
    }
}
