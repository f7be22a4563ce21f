//! The Monarch: routes requests to guilds, staffs workflows, drives step
//! execution with artifact threading, and settles every job against the
//! treasury.

use std::collections::BTreeMap;

use crate::config::{DifficultyTier, Guild, GuildBook, StepKind};
use crate::job::{Job, JobReport, JobStatus};
use crate::memory::MemoryStore;
use crate::openai::ChatBackend;
use crate::persist::{SavedState, WorkerRecord};
use crate::tools::ToolRegistry;
use crate::treasury::Treasury;
use crate::worker::{Rank, Specialty, Worker};

/// Experience awarded per completed workflow step.
pub const STEP_EXPERIENCE: u64 = 15;
/// Experience awarded for a completed best-effort job. Larger than the
/// per-step award because the worker carried the whole request unaided.
pub const BEST_EFFORT_EXPERIENCE: u64 = 25;

/// Orchestrator owning the worker roster, the treasury and the
/// collaborator handles. Execution is serialized: one job runs to
/// completion before the next is accepted.
pub struct Monarch<B: ChatBackend, M: MemoryStore> {
    book: GuildBook,
    backend: B,
    memory: M,
    tools: ToolRegistry,
    roster: BTreeMap<String, Worker>,
    treasury: Treasury,
}

impl<B: ChatBackend, M: MemoryStore> Monarch<B, M> {
    pub fn new(book: GuildBook, backend: B, memory: M, tools: ToolRegistry) -> Self {
        let treasury = Treasury::new(book.starting_treasury);
        Self {
            book,
            backend,
            memory,
            tools,
            roster: BTreeMap::new(),
            treasury,
        }
    }

    pub fn book(&self) -> &GuildBook {
        &self.book
    }

    pub(crate) fn backend_ref(&self) -> &B {
        &self.backend
    }

    pub(crate) fn memory_ref(&self) -> &M {
        &self.memory
    }

    pub(crate) fn tools_ref(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn roster(&self) -> &BTreeMap<String, Worker> {
        &self.roster
    }

    pub fn treasury_balance(&self) -> i64 {
        self.treasury.balance()
    }

    /// Register a worker directly, e.g. when restoring persisted state.
    pub fn enlist(&mut self, worker: Worker) {
        self.roster.insert(worker.id.clone(), worker);
    }

    /// Serializable snapshot of everything that outlives a job.
    pub fn snapshot(&self) -> SavedState {
        SavedState {
            workers: self
                .roster
                .values()
                .map(|w| (w.id.clone(), WorkerRecord::from_worker(w)))
                .collect(),
            treasury: self.treasury.balance(),
        }
    }

    /// Replace roster and treasury from persisted state. Ranks are
    /// recomputed from stored experience, never trusted verbatim.
    pub fn restore(&mut self, state: SavedState) {
        self.roster = state
            .workers
            .into_values()
            .map(|rec| {
                let worker = rec.into_worker();
                (worker.id.clone(), worker)
            })
            .collect();
        self.treasury = Treasury::new(state.treasury);
    }

    /// Deterministic keyword routing: guilds are checked in configuration
    /// order against the lower-cased request; the default guild catches
    /// everything else.
    pub fn resolve_guild(&self, request: &str) -> &Guild {
        let lower = request.to_lowercase();
        self.book
            .guilds
            .iter()
            .filter(|g| !g.default)
            .find(|g| g.keywords.iter().any(|k| lower.contains(&k.to_lowercase())))
            .unwrap_or_else(|| self.book.default_guild())
    }

    /// First difficulty tier whose keywords match; the keyword-less tier is
    /// the default.
    pub fn estimate_difficulty(&self, request: &str) -> DifficultyTier {
        let lower = request.to_lowercase();
        self.book
            .difficulty
            .iter()
            .find(|t| {
                !t.keywords.is_empty()
                    && t.keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
            })
            .or_else(|| self.book.difficulty.iter().find(|t| t.keywords.is_empty()))
            .cloned()
            .unwrap_or(DifficultyTier {
                name: "medium".to_string(),
                keywords: vec![],
                reward: 80,
                penalty: 40,
            })
    }

    /// Existence check used for capability assessment. Never hires.
    pub fn is_available(&self, role: Specialty, min_rank: Rank) -> bool {
        self.roster
            .values()
            .any(|w| w.specialty == role && w.rank >= min_rank)
    }

    /// Pick the cheapest qualifying worker: among those matching the role
    /// with sufficient rank, the lowest rank wins. When none qualify and
    /// the role is the guild's starting specialty, hire a fresh rank-F
    /// worker just in time; specialists above the entry tier are never
    /// fabricated.
    pub fn select_worker(
        &mut self,
        role: Specialty,
        min_rank: Rank,
        starting: Specialty,
    ) -> Option<String> {
        let existing = self
            .roster
            .values()
            .filter(|w| w.specialty == role && w.rank >= min_rank)
            .min_by_key(|w| w.rank)
            .map(|w| w.id.clone());
        if existing.is_some() {
            return existing;
        }
        if role == starting {
            let id = self.next_worker_id(role);
            self.roster.insert(id.clone(), Worker::hire(id.clone(), role));
            return Some(id);
        }
        None
    }

    /// Ids carry a specialty prefix and a per-specialty counter that only
    /// ever moves forward, even across reloads.
    fn next_worker_id(&self, specialty: Specialty) -> String {
        let prefix = specialty.prefix();
        let max = self
            .roster
            .keys()
            .filter_map(|id| {
                id.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .and_then(|n| n.parse::<u32>().ok())
            })
            .max()
            .unwrap_or(0);
        format!("{prefix}-{:03}", max + 1)
    }

    /// Execute a request end to end with the configured default budget.
    pub async fn execute_job(&mut self, request: &str) -> JobReport {
        self.execute_job_with_budget(request, self.book.default_budget)
            .await
    }

    /// The central algorithm: resolve guild and difficulty, assess whether
    /// every workflow step can be staffed, run either the full workflow or
    /// the best-effort fallback, then settle reward or penalty exactly
    /// once and write the deliverable to memory on success.
    pub async fn execute_job_with_budget(&mut self, request: &str, budget: i64) -> JobReport {
        let guild = self.resolve_guild(request).clone();
        let tier = self.estimate_difficulty(request);

        let mut job = Job::new(request, budget);
        job.status = JobStatus::InProgress;

        let staffed = guild
            .workflow
            .iter()
            .all(|step| self.is_available(step.role, step.min_rank));

        let result = if staffed {
            self.run_workflow(&guild, &mut job).await
        } else {
            self.run_best_effort(&guild, &mut job).await
        };

        let settled = match &result {
            Some(text) => {
                job.status = JobStatus::Completed;
                self.treasury.credit(tier.reward);
                if !self.memory.remember(&job.id, text) {
                    eprintln!("failed to memorize job {}", job.id);
                }
                tier.reward
            }
            None => {
                job.status = JobStatus::Failed;
                self.treasury.penalize(tier.penalty);
                -tier.penalty
            }
        };

        JobReport::from_job(&job, &guild.name, &tier.name, result, settled)
    }

    /// Reserve a cost against both the job budget and the treasury. On a
    /// treasury refusal the job-side reservation is rolled back, so the
    /// report's cost only ever reflects amounts the ledger actually saw.
    fn bill(&mut self, job: &mut Job, amount: i64) -> bool {
        if !job.spend(amount) {
            return false;
        }
        if !self.treasury.try_debit(amount) {
            job.refund(amount);
            return false;
        }
        true
    }

    /// Full-workflow path: every step in order, artifacts threaded forward
    /// by name substitution, the treasury debited before each step is
    /// judged. Returns the designated final artifact, or `None` on any
    /// failure.
    async fn run_workflow(&mut self, guild: &Guild, job: &mut Job) -> Option<String> {
        for step in &guild.workflow {
            let prompt = render_template(&step.template, &job.request, &job.artifacts);

            let Some(worker_id) =
                self.select_worker(step.role, step.min_rank, guild.starting_specialty)
            else {
                job.append_history("monarch", &step.output, "no qualified worker");
                return None;
            };
            let Some(worker_rank) = self.roster.get(&worker_id).map(|w| w.rank) else {
                return None;
            };

            let step_cost = self.book.rank_cost(worker_rank);
            if !self.bill(job, step_cost) {
                job.append_history(&worker_id, &step.output, "insufficient funds");
                return None;
            }

            let (text, tool_used) = match step.kind {
                StepKind::Image => {
                    let worker = self.roster.get(&worker_id)?;
                    (worker.create_image(&self.backend, &prompt).await, None)
                }
                StepKind::Text => {
                    let worker = self.roster.get(&worker_id)?;
                    let out = worker
                        .perform_task(&self.backend, &self.memory, &self.tools, &self.book, &prompt)
                        .await;
                    (out.text, out.tool_used)
                }
            };

            if let Some(tool) = &tool_used {
                let tool_cost = self.book.tool_cost(tool);
                if !self.bill(job, tool_cost) {
                    job.append_history(&worker_id, &step.output, "insufficient funds for tool");
                    return None;
                }
            }

            let Some(text) = text else {
                job.append_history(&worker_id, &step.output, "no result");
                return None;
            };

            job.artifacts.insert(step.output.clone(), text.clone());
            job.append_history(&worker_id, &step.output, &text);
            if let Some(worker) = self.roster.get_mut(&worker_id) {
                worker.gain_experience(STEP_EXPERIENCE, &self.book.career_path);
            }
        }

        job.artifacts.get(guild.final_artifact()).cloned()
    }

    /// Best-effort fallback: one entry-tier worker takes the raw request in
    /// a single call, with the same settlement rules as the full path and a
    /// larger experience award for the unaided work.
    async fn run_best_effort(&mut self, guild: &Guild, job: &mut Job) -> Option<String> {
        let worker_id =
            self.select_worker(guild.starting_specialty, Rank::F, guild.starting_specialty)?;
        let worker_rank = self.roster.get(&worker_id).map(|w| w.rank)?;

        let step_cost = self.book.rank_cost(worker_rank);
        if !self.bill(job, step_cost) {
            job.append_history(&worker_id, "best_effort", "insufficient funds");
            return None;
        }

        let image_guild = guild
            .workflow
            .last()
            .is_some_and(|s| s.kind == StepKind::Image);

        let (text, tool_used) = if image_guild {
            let worker = self.roster.get(&worker_id)?;
            (worker.create_image(&self.backend, &job.request).await, None)
        } else {
            let worker = self.roster.get(&worker_id)?;
            let out = worker
                .perform_task(
                    &self.backend,
                    &self.memory,
                    &self.tools,
                    &self.book,
                    &job.request,
                )
                .await;
            (out.text, out.tool_used)
        };

        if let Some(tool) = &tool_used {
            let tool_cost = self.book.tool_cost(tool);
            if !self.bill(job, tool_cost) {
                job.append_history(&worker_id, "best_effort", "insufficient funds for tool");
                return None;
            }
        }

        let Some(text) = text else {
            job.append_history(&worker_id, "best_effort", "no result");
            return None;
        };

        job.artifacts
            .insert(guild.final_artifact().to_string(), text.clone());
        job.append_history(&worker_id, "best_effort", &text);
        if let Some(worker) = self.roster.get_mut(&worker_id) {
            worker.gain_experience(BEST_EFFORT_EXPERIENCE, &self.book.career_path);
        }

        Some(text)
    }
}

/// Substitute `{request}` and every prior artifact's `{name}` into a step
/// prompt template.
fn render_template(template: &str, request: &str, artifacts: &BTreeMap<String, String>) -> String {
    let mut out = template.replace("{request}", request);
    for (name, text) in artifacts {
        out = out.replace(&format!("{{{name}}}"), text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NullMemory;
    use crate::openai::OpenAiError;
    use crate::worker::ModelTier;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockBackend {
        replies: Mutex<VecDeque<String>>,
    }

    impl MockBackend {
        fn script<const N: usize>(replies: [&str; N]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            }
        }

        fn failing() -> Self {
            Self::script([])
        }
    }

    impl ChatBackend for MockBackend {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _model: ModelTier,
        ) -> Result<String, OpenAiError> {
            match self.replies.lock().unwrap().pop_front() {
                Some(text) => Ok(text),
                None => Err(OpenAiError::ApiError {
                    status: 500,
                    message: "script exhausted".into(),
                }),
            }
        }

        async fn generate_image(&self, _prompt: &str) -> Result<String, OpenAiError> {
            Ok("https://img.example/out.png".into())
        }
    }

    fn monarch(backend: MockBackend) -> Monarch<MockBackend, NullMemory> {
        Monarch::new(
            GuildBook::default(),
            backend,
            NullMemory,
            ToolRegistry::new(String::new()),
        )
    }

    #[derive(Default)]
    struct RecordingMemory {
        remembered: Vec<(String, String)>,
        reject_writes: bool,
    }

    impl MemoryStore for RecordingMemory {
        fn recall(&self, _query: &str, _k: usize) -> Vec<String> {
            Vec::new()
        }

        fn remember(&mut self, job_id: &str, content: &str) -> bool {
            self.remembered.push((job_id.to_string(), content.to_string()));
            !self.reject_writes
        }
    }

    fn monarch_with_memory(
        backend: MockBackend,
        memory: RecordingMemory,
    ) -> Monarch<MockBackend, RecordingMemory> {
        Monarch::new(
            GuildBook::default(),
            backend,
            memory,
            ToolRegistry::new(String::new()),
        )
    }

    // --- routing ---

    #[test]
    fn resolve_guild_by_keyword() {
        let m = monarch(MockBackend::failing());
        assert_eq!(m.resolve_guild("Write a report on bees").name, "scribes");
        assert_eq!(m.resolve_guild("Create a Python script").name, "forge");
        assert_eq!(m.resolve_guild("Draw a picture of a fox").name, "atelier");
    }

    #[test]
    fn resolve_guild_falls_back_to_default() {
        let m = monarch(MockBackend::failing());
        assert_eq!(m.resolve_guild("What is the meaning of life?").name, "commons");
    }

    #[test]
    fn resolve_guild_is_deterministic() {
        let m = monarch(MockBackend::failing());
        let a = m.resolve_guild("write some code").name.clone();
        let b = m.resolve_guild("write some code").name.clone();
        // "write" (scribes) appears before "code" (forge) in config order.
        assert_eq!(a, "scribes");
        assert_eq!(a, b);
    }

    #[test]
    fn estimate_difficulty_tiers() {
        let m = monarch(MockBackend::failing());
        assert_eq!(m.estimate_difficulty("a comprehensive study").name, "hard");
        assert_eq!(m.estimate_difficulty("a quick note").name, "easy");
        assert_eq!(m.estimate_difficulty("something ordinary").name, "medium");
    }

    // --- staffing ---

    #[test]
    fn select_worker_prefers_lowest_qualifying_rank() {
        let mut m = monarch(MockBackend::failing());
        m.enlist(Worker::from_stored("WRI-001".into(), Specialty::Writer, 700)); // B
        m.enlist(Worker::from_stored("WRI-002".into(), Specialty::Writer, 60)); // E

        let id = m
            .select_worker(Specialty::Writer, Rank::E, Specialty::Writer)
            .unwrap();
        assert_eq!(id, "WRI-002");
    }

    #[test]
    fn select_worker_hires_entry_specialty_just_in_time() {
        let mut m = monarch(MockBackend::failing());
        let id = m
            .select_worker(Specialty::Writer, Rank::F, Specialty::Writer)
            .unwrap();
        assert_eq!(id, "WRI-001");
        assert_eq!(m.roster()["WRI-001"].rank, Rank::F);

        // The hire is registered; a second call reuses it.
        let id2 = m
            .select_worker(Specialty::Writer, Rank::F, Specialty::Writer)
            .unwrap();
        assert_eq!(id2, "WRI-001");
    }

    #[test]
    fn select_worker_never_fabricates_specialists() {
        let mut m = monarch(MockBackend::failing());
        assert!(
            m.select_worker(Specialty::Editor, Rank::D, Specialty::Writer)
                .is_none()
        );
        assert!(m.roster().is_empty());
    }

    #[test]
    fn worker_ids_count_per_specialty() {
        let mut m = monarch(MockBackend::failing());
        m.enlist(Worker::hire("WRI-004".into(), Specialty::Writer));
        assert_eq!(m.next_worker_id(Specialty::Writer), "WRI-005");
        assert_eq!(m.next_worker_id(Specialty::Engineer), "ENG-001");
    }

    #[test]
    fn is_available_checks_without_hiring() {
        let m = monarch(MockBackend::failing());
        assert!(!m.is_available(Specialty::Writer, Rank::F));
        assert!(m.roster().is_empty());
    }

    // --- execution scenarios ---

    #[tokio::test]
    async fn best_effort_path_with_empty_roster() {
        let backend = MockBackend::script(["NO_TOOL", "A tidy plot summary."]);
        let mut m = monarch(backend);

        let report = m
            .execute_job("Write a professional summary of the plot of a well-known film")
            .await;

        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.result.as_deref(), Some("A tidy plot summary."));
        assert_eq!(report.guild, "scribes");
        // Exactly one worker billed, one history entry, one experience award.
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.cost, 5);
        let worker = &m.roster()["WRI-001"];
        assert_eq!(worker.experience, BEST_EFFORT_EXPERIENCE);
        // 1000 - 5 (rank F cost) + 80 (medium reward).
        assert_eq!(m.treasury_balance(), 1075);
    }

    #[tokio::test]
    async fn full_workflow_threads_artifacts_and_settles_once() {
        let backend = MockBackend::script([
            "NO_TOOL",
            "An outline.",
            "NO_TOOL",
            "A draft.",
            "NO_TOOL",
            "The final text.",
        ]);
        let mut m = monarch(backend);
        m.enlist(Worker::from_stored("WRI-001".into(), Specialty::Writer, 150)); // D
        m.enlist(Worker::from_stored("EDT-001".into(), Specialty::Editor, 150)); // D

        let report = m
            .execute_job("Write a report on the rise and fall of the Mayan civilization")
            .await;

        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.result.as_deref(), Some("The final text."));
        assert_eq!(report.history.len(), 3);
        // Three rank-D steps at 12 each, then the medium reward.
        assert_eq!(report.cost, 36);
        assert_eq!(m.treasury_balance(), 1000 - 36 + 80);
        assert_eq!(m.roster()["WRI-001"].experience, 150 + 2 * STEP_EXPERIENCE);
        assert_eq!(m.roster()["EDT-001"].experience, 150 + STEP_EXPERIENCE);
    }

    #[tokio::test]
    async fn failed_step_fails_job_with_penalty() {
        // Tool decision succeeds, final generation errors out.
        let backend = MockBackend::script(["NO_TOOL"]);
        let mut m = monarch(backend);

        let report = m.execute_job("Write a short note about rivers").await;

        assert_eq!(report.status, JobStatus::Failed);
        assert!(report.result.is_none());
        assert!(report.history[0].contains("no result"));
        // Worker cost debited, easy-tier penalty applied, no reward.
        assert_eq!(m.treasury_balance(), 1000 - 5 - 20);
        // No experience for unfinished work.
        assert_eq!(m.roster()["WRI-001"].experience, 0);
    }

    #[tokio::test]
    async fn unregistered_tool_decision_proceeds_without_tool() {
        let backend = MockBackend::script([
            r#"I'll consult the orb: {"tool": "crystal_ball", "input": "the future"}"#,
            "An answer without any tool.",
        ]);
        let mut m = monarch(backend);

        let report = m.execute_job("Tell me something ordinary").await;

        assert_eq!(report.status, JobStatus::Completed);
        // No tool cost charged: 1000 - 5 + 80.
        assert_eq!(m.treasury_balance(), 1075);
    }

    #[tokio::test]
    async fn registered_tool_use_is_billed() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": [{"snippet": "a useful fact"}]
            })))
            .mount(&server)
            .await;

        let backend = MockBackend::script([
            r#"{"tool": "web_search", "input": "useful fact"}"#,
            "An answer grounded in the search result.",
        ]);
        let mut m = Monarch::new(
            GuildBook::default(),
            backend,
            NullMemory,
            ToolRegistry::with_search_url("key".into(), format!("{}/", server.uri())),
        );

        let report = m.execute_job("Tell me something ordinary").await;

        assert_eq!(report.status, JobStatus::Completed);
        // 1000 - 5 (worker) - 10 (web_search) + 80 (reward).
        assert_eq!(m.treasury_balance(), 1065);
        assert_eq!(report.cost, 15);
    }

    #[tokio::test]
    async fn over_budget_step_fails_without_treasury_debit() {
        let backend = MockBackend::script(["NO_TOOL", "unreachable"]);
        let mut m = monarch(backend);

        let report = m
            .execute_job_with_budget("Tell me something ordinary", 3)
            .await;

        assert_eq!(report.status, JobStatus::Failed);
        assert!(report.history[0].contains("insufficient funds"));
        // Only the penalty lands; the rejected step cost never reached the
        // ledger.
        assert_eq!(m.treasury_balance(), 1000 - 40);
    }

    #[tokio::test]
    async fn empty_treasury_fails_job_with_penalty() {
        let mut book = GuildBook::default();
        book.starting_treasury = 3;
        let backend = MockBackend::script(["NO_TOOL", "unreachable"]);
        let mut m = Monarch::new(book, backend, NullMemory, ToolRegistry::new(String::new()));

        let report = m.execute_job("Tell me something ordinary").await;

        assert_eq!(report.status, JobStatus::Failed);
        // Penalty pushes the signed balance negative.
        assert_eq!(m.treasury_balance(), 3 - 40);
        // The refused step was rolled back; the report matches the ledger.
        assert_eq!(report.cost, 0);
    }

    #[tokio::test]
    async fn rejected_costs_never_inflate_the_report() {
        let backend = MockBackend::script(["NO_TOOL", "unreachable"]);
        let mut m = monarch(backend);

        let report = m
            .execute_job_with_budget("Tell me something ordinary", 3)
            .await;

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.cost, 0);
        assert_eq!(m.treasury_balance(), 1000 - 40);
    }

    #[tokio::test]
    async fn image_guild_returns_url() {
        let backend = MockBackend::failing();
        let mut m = monarch(backend);
        m.enlist(Worker::hire("ILL-001".into(), Specialty::Illustrator));

        let report = m.execute_job("Draw a picture of a fox in the snow").await;

        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.result.as_deref(), Some("https://img.example/out.png"));
        assert_eq!(report.guild, "atelier");
    }

    #[tokio::test]
    async fn jobs_are_fresh_per_request() {
        let backend = MockBackend::script(["NO_TOOL", "first", "NO_TOOL", "second"]);
        let mut m = monarch(backend);

        let a = m.execute_job("Tell me something ordinary").await;
        let b = m.execute_job("Tell me something ordinary").await;

        assert_ne!(a.job_id, b.job_id);
        assert_eq!(a.result.as_deref(), Some("first"));
        assert_eq!(b.result.as_deref(), Some("second"));
        // Two settlements accumulated independently.
        assert_eq!(m.treasury_balance(), 1000 + 2 * (80 - 5));
    }

    #[tokio::test]
    async fn capability_assessment_covers_every_step() {
        // A rank-D writer staffs the first two scribes steps, but there is
        // no editor, so the full workflow must not start.
        let backend = MockBackend::script(["NO_TOOL", "best effort output"]);
        let mut m = monarch(backend);
        m.enlist(Worker::from_stored("WRI-001".into(), Specialty::Writer, 150));

        let report = m.execute_job("Write an essay about tides").await;

        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.history.len(), 1);
        assert!(report.history[0].contains("best_effort"));
    }

    // --- memory settlement ---

    #[tokio::test]
    async fn completed_job_is_memorized_once_under_its_id() {
        let backend = MockBackend::script(["NO_TOOL", "the deliverable"]);
        let mut m = monarch_with_memory(backend, RecordingMemory::default());

        let report = m.execute_job("Tell me something ordinary").await;

        assert_eq!(report.status, JobStatus::Completed);
        let remembered = &m.memory_ref().remembered;
        assert_eq!(remembered.len(), 1);
        assert_eq!(remembered[0].0, report.job_id);
        assert_eq!(remembered[0].1, "the deliverable");
    }

    #[tokio::test]
    async fn failed_job_is_not_memorized() {
        let backend = MockBackend::failing();
        let mut m = monarch_with_memory(backend, RecordingMemory::default());

        let report = m.execute_job("Tell me something ordinary").await;

        assert_eq!(report.status, JobStatus::Failed);
        assert!(m.memory_ref().remembered.is_empty());
    }

    #[tokio::test]
    async fn rejected_memory_write_does_not_fail_the_job() {
        let backend = MockBackend::script(["NO_TOOL", "still the deliverable"]);
        let memory = RecordingMemory {
            reject_writes: true,
            ..Default::default()
        };
        let mut m = monarch_with_memory(backend, memory);

        let report = m.execute_job("Tell me something ordinary").await;

        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.result.as_deref(), Some("still the deliverable"));
        assert_eq!(m.memory_ref().remembered.len(), 1);
        // The reward still landed despite the failed write.
        assert_eq!(m.treasury_balance(), 1075);
    }

    #[test]
    fn render_template_substitutes_request_and_artifacts() {
        let mut artifacts = BTreeMap::new();
        artifacts.insert("outline".to_string(), "I. Intro".to_string());
        let out = render_template(
            "Draft from {outline} for: {request}",
            "a history of tea",
            &artifacts,
        );
        assert_eq!(out, "Draft from I. Intro for: a history of tea");
    }

    #[test]
    fn snapshot_and_restore_roundtrip() {
        let mut m = monarch(MockBackend::failing());
        m.enlist(Worker::from_stored("ENG-001".into(), Specialty::Engineer, 650));
        let state = m.snapshot();

        let mut fresh = monarch(MockBackend::failing());
        fresh.restore(state);
        assert_eq!(fresh.roster()["ENG-001"].rank, Rank::B);
        assert_eq!(fresh.treasury_balance(), 1000);
    }
}
