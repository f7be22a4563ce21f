//! Monarch configuration loaded from `monarch.toml`.
//!
//! The [`GuildBook`] describes the guilds (keyword triggers, ordered
//! workflows, starting specialties), specialty prompts, career-path rules
//! and the economy tables. Values not present in the file use embedded
//! defaults. The `OPENAI_API_KEY` and `SERPAPI_API_KEY` environment
//! variables take precedence over the file.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::error::MonarchError;
use crate::worker::{CareerRule, Rank, Specialty};

const DEFAULT_PROMPT: &str = "You are a helpful assistant.";

/// Whether a workflow step produces text or an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    #[default]
    Text,
    Image,
}

/// One step of a guild workflow: a role requirement, a minimum rank, a
/// prompt template with `{request}`/`{artifact}` placeholders, and the name
/// the step's output is stored under.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowStep {
    pub role: Specialty,
    pub min_rank: Rank,
    pub template: String,
    pub output: String,
    #[serde(default)]
    pub kind: StepKind,
}

/// A configured request category with its own triggers and fixed workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub starting_specialty: Specialty,
    pub workflow: Vec<WorkflowStep>,
    /// The fallback guild used when no keywords match. Exactly one guild
    /// must carry this flag.
    #[serde(default)]
    pub default: bool,
}

impl Guild {
    /// The artifact name whose presence marks the job deliverable.
    pub fn final_artifact(&self) -> &str {
        self.workflow
            .last()
            .map(|s| s.output.as_str())
            .unwrap_or("final")
    }
}

/// A difficulty tier with its keyword triggers and settlement amounts.
/// Tiers are checked in order; the first match wins, and the tier with no
/// keywords is the default.
#[derive(Debug, Clone, Deserialize)]
pub struct DifficultyTier {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub reward: i64,
    pub penalty: i64,
}

/// Top-level configuration loaded from `monarch.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildBook {
    /// OpenAI API key.
    #[serde(default)]
    pub api_key: String,

    /// SerpApi key for the web-search tool.
    #[serde(default)]
    pub serpapi_key: String,

    /// Where the worker roster and treasury balance are persisted.
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Where completed-job memories are stored.
    #[serde(default = "default_memory_path")]
    pub memory_path: String,

    /// Budget ceiling given to each job at creation.
    #[serde(default = "default_budget")]
    pub default_budget: i64,

    /// Treasury balance for a fresh installation.
    #[serde(default = "default_starting_treasury")]
    pub starting_treasury: i64,

    #[serde(default = "default_guilds")]
    pub guilds: Vec<Guild>,

    #[serde(default = "default_prompts")]
    pub prompts: BTreeMap<Specialty, String>,

    #[serde(default = "default_career_path")]
    pub career_path: Vec<CareerRule>,

    #[serde(default = "default_rank_costs")]
    pub rank_costs: BTreeMap<Rank, i64>,

    #[serde(default = "default_tool_costs")]
    pub tool_costs: BTreeMap<String, i64>,

    #[serde(default = "default_difficulty")]
    pub difficulty: Vec<DifficultyTier>,
}

fn default_state_path() -> String {
    "monarch_state.json".to_string()
}

fn default_memory_path() -> String {
    "monarch_memory.json".to_string()
}

fn default_budget() -> i64 {
    200
}

fn default_starting_treasury() -> i64 {
    1000
}

fn default_prompts() -> BTreeMap<Specialty, String> {
    let mut prompts = BTreeMap::new();
    prompts.insert(
        Specialty::Generalist,
        "You are a capable generalist assistant. Answer clearly and completely.".to_string(),
    );
    prompts.insert(
        Specialty::Writer,
        "You are a professional writer. Produce clear, well-structured prose.".to_string(),
    );
    prompts.insert(
        Specialty::Editor,
        "You are a senior editor. Improve clarity, tone and flow without changing meaning."
            .to_string(),
    );
    prompts.insert(
        Specialty::Researcher,
        "You are a meticulous researcher. Gather and condense relevant facts.".to_string(),
    );
    prompts.insert(
        Specialty::Engineer,
        "You are a software engineer. Write correct, idiomatic, well-commented code.".to_string(),
    );
    prompts.insert(
        Specialty::Reviewer,
        "You are a code reviewer. Find defects and return a corrected final version.".to_string(),
    );
    prompts.insert(
        Specialty::Illustrator,
        "You are an illustrator. Turn requests into vivid visual prompts.".to_string(),
    );
    prompts.insert(
        Specialty::Planner,
        "You are a project planner. Decompose requests into ordered, concrete sub-tasks."
            .to_string(),
    );
    prompts
}

fn default_career_path() -> Vec<CareerRule> {
    vec![
        CareerRule {
            from: Specialty::Writer,
            at_rank: Rank::C,
            to: Specialty::Editor,
        },
        CareerRule {
            from: Specialty::Engineer,
            at_rank: Rank::C,
            to: Specialty::Reviewer,
        },
    ]
}

fn default_rank_costs() -> BTreeMap<Rank, i64> {
    [
        (Rank::F, 5),
        (Rank::E, 8),
        (Rank::D, 12),
        (Rank::C, 20),
        (Rank::B, 35),
        (Rank::A, 60),
        (Rank::S, 100),
    ]
    .into_iter()
    .collect()
}

fn default_tool_costs() -> BTreeMap<String, i64> {
    [("web_search".to_string(), 10), ("run_code".to_string(), 15)]
        .into_iter()
        .collect()
}

fn default_difficulty() -> Vec<DifficultyTier> {
    vec![
        DifficultyTier {
            name: "hard".to_string(),
            keywords: ["comprehensive", "detailed", "complete", "in-depth", "research", "complex"]
                .map(str::to_string)
                .to_vec(),
            reward: 120,
            penalty: 60,
        },
        DifficultyTier {
            name: "easy".to_string(),
            keywords: ["short", "simple", "quick", "brief", "list"]
                .map(str::to_string)
                .to_vec(),
            reward: 40,
            penalty: 20,
        },
        DifficultyTier {
            name: "medium".to_string(),
            keywords: vec![],
            reward: 80,
            penalty: 40,
        },
    ]
}

fn default_guilds() -> Vec<Guild> {
    vec![
        Guild {
            name: "scribes".to_string(),
            keywords: ["write", "summarize", "summary", "describe", "report", "essay", "article", "story"]
                .map(str::to_string)
                .to_vec(),
            starting_specialty: Specialty::Writer,
            workflow: vec![
                WorkflowStep {
                    role: Specialty::Writer,
                    min_rank: Rank::F,
                    template: "Produce a structured outline for the following request:\n\n{request}"
                        .to_string(),
                    output: "outline".to_string(),
                    kind: StepKind::Text,
                },
                WorkflowStep {
                    role: Specialty::Writer,
                    min_rank: Rank::E,
                    template: "Write a full draft that follows this outline.\n\nOutline:\n{outline}\n\nOriginal request: {request}"
                        .to_string(),
                    output: "draft".to_string(),
                    kind: StepKind::Text,
                },
                WorkflowStep {
                    role: Specialty::Editor,
                    min_rank: Rank::D,
                    template: "Edit and polish this draft for clarity and tone. Return only the final text.\n\nDraft:\n{draft}"
                        .to_string(),
                    output: "final".to_string(),
                    kind: StepKind::Text,
                },
            ],
            default: false,
        },
        Guild {
            name: "forge".to_string(),
            keywords: ["code", "script", "function", "program", "api", "bug", "debug"]
                .map(str::to_string)
                .to_vec(),
            starting_specialty: Specialty::Engineer,
            workflow: vec![
                WorkflowStep {
                    role: Specialty::Engineer,
                    min_rank: Rank::F,
                    template: "Describe a short implementation plan for: {request}".to_string(),
                    output: "plan".to_string(),
                    kind: StepKind::Text,
                },
                WorkflowStep {
                    role: Specialty::Engineer,
                    min_rank: Rank::E,
                    template: "Write the code for this request, following the plan.\n\nPlan:\n{plan}\n\nRequest: {request}"
                        .to_string(),
                    output: "code".to_string(),
                    kind: StepKind::Text,
                },
                WorkflowStep {
                    role: Specialty::Reviewer,
                    min_rank: Rank::C,
                    template: "Review this code for correctness and style. Return the corrected final version.\n\nCode:\n{code}"
                        .to_string(),
                    output: "final".to_string(),
                    kind: StepKind::Text,
                },
            ],
            default: false,
        },
        Guild {
            name: "atelier".to_string(),
            keywords: ["image", "draw", "illustration", "picture", "logo", "poster"]
                .map(str::to_string)
                .to_vec(),
            starting_specialty: Specialty::Illustrator,
            workflow: vec![WorkflowStep {
                role: Specialty::Illustrator,
                min_rank: Rank::F,
                template: "{request}".to_string(),
                output: "final".to_string(),
                kind: StepKind::Image,
            }],
            default: false,
        },
        Guild {
            name: "commons".to_string(),
            keywords: vec![],
            starting_specialty: Specialty::Generalist,
            workflow: vec![WorkflowStep {
                role: Specialty::Generalist,
                min_rank: Rank::F,
                template: "{request}".to_string(),
                output: "final".to_string(),
                kind: StepKind::Text,
            }],
            default: true,
        },
    ]
}

impl Default for GuildBook {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            serpapi_key: String::new(),
            state_path: default_state_path(),
            memory_path: default_memory_path(),
            default_budget: default_budget(),
            starting_treasury: default_starting_treasury(),
            guilds: default_guilds(),
            prompts: default_prompts(),
            career_path: default_career_path(),
            rank_costs: default_rank_costs(),
            tool_costs: default_tool_costs(),
            difficulty: default_difficulty(),
        }
    }
}

impl GuildBook {
    /// Load configuration from `monarch.toml` (or an explicit path).
    /// Missing file means embedded defaults. Environment variables take
    /// precedence over the file for API keys.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new("monarch.toml"));
        let mut book = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<GuildBook>(&contents)?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            book.api_key = key;
        }
        if let Ok(key) = std::env::var("SERPAPI_API_KEY")
            && !key.is_empty()
        {
            book.serpapi_key = key;
        }

        book.validate()?;
        Ok(book)
    }

    /// Cross-checks the loaded tables: one default guild, non-empty
    /// workflows, known prompts for every role, sane career rules.
    pub fn validate(&self) -> Result<(), MonarchError> {
        if self.guilds.is_empty() {
            return Err(MonarchError::Config("no guilds configured".into()));
        }
        let defaults = self.guilds.iter().filter(|g| g.default).count();
        if defaults != 1 {
            return Err(MonarchError::Config(format!(
                "exactly one guild must be marked default, found {defaults}"
            )));
        }
        for guild in &self.guilds {
            if guild.workflow.is_empty() {
                return Err(MonarchError::Config(format!(
                    "guild '{}' has an empty workflow",
                    guild.name
                )));
            }
            let mut outputs = std::collections::BTreeSet::new();
            for step in &guild.workflow {
                if !outputs.insert(step.output.as_str()) {
                    return Err(MonarchError::Config(format!(
                        "guild '{}' reuses artifact name '{}'",
                        guild.name, step.output
                    )));
                }
            }
        }
        for rule in &self.career_path {
            if rule.from == rule.to {
                return Err(MonarchError::Config(format!(
                    "career rule maps {} to itself",
                    rule.from
                )));
            }
        }
        Ok(())
    }

    /// System prompt for a specialty, with a generic fallback.
    pub fn prompt_for(&self, specialty: Specialty) -> &str {
        self.prompts
            .get(&specialty)
            .map(String::as_str)
            .unwrap_or(DEFAULT_PROMPT)
    }

    /// Per-task cost of a worker of the given rank.
    pub fn rank_cost(&self, rank: Rank) -> i64 {
        self.rank_costs.get(&rank).copied().unwrap_or(10)
    }

    /// Per-invocation cost of a tool. Unknown tools cost nothing.
    pub fn tool_cost(&self, tool: &str) -> i64 {
        self.tool_costs.get(tool).copied().unwrap_or(0)
    }

    pub fn default_guild(&self) -> &Guild {
        self.guilds
            .iter()
            .find(|g| g.default)
            .unwrap_or(&self.guilds[0])
    }

    pub fn guild_named(&self, name: &str) -> Option<&Guild> {
        self.guilds.iter().find(|g| g.name == name)
    }
}
