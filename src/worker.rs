//! Workers and their progression state machine.
//!
//! A [`Worker`] is a stateful task executor with an ordinal [`Rank`], a
//! [`Specialty`] and an experience counter. Rank is always a pure function
//! of experience; the prompt/model profile is derived from rank and
//! specialty and never stored.

use serde::{Deserialize, Serialize};

use crate::config::GuildBook;
use crate::extract::first_json_object;
use crate::memory::MemoryStore;
use crate::openai::ChatBackend;
use crate::tools::ToolRegistry;

/// Sentinel the tool-decision call may answer with when no tool is needed.
pub const NO_TOOL: &str = "NO_TOOL";

/// How many past-job memories to fold into a task prompt.
const RECALL_K: usize = 2;

const TOOL_DECIDER_PROMPT: &str =
    "You decide whether an assistant needs an external tool for a task. \
     Answer with exactly NO_TOOL, or with a single JSON object \
     {\"tool\": \"<name>\", \"input\": \"<tool input>\"} and nothing else.";

/// Proficiency tiers, weakest to strongest.
///
/// The derived `Ord` follows declaration order, so `Rank::F < Rank::S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    F,
    E,
    D,
    C,
    B,
    A,
    S,
}

impl Rank {
    pub const ALL: [Rank; 7] = [
        Rank::F,
        Rank::E,
        Rank::D,
        Rank::C,
        Rank::B,
        Rank::A,
        Rank::S,
    ];

    /// Cumulative experience required to hold this rank.
    pub fn threshold(self) -> u64 {
        match self {
            Rank::F => 0,
            Rank::E => 50,
            Rank::D => 150,
            Rank::C => 300,
            Rank::B => 600,
            Rank::A => 1200,
            Rank::S => 2500,
        }
    }

    /// The next rank up, or `None` for the terminal rank.
    pub fn next(self) -> Option<Rank> {
        match self {
            Rank::F => Some(Rank::E),
            Rank::E => Some(Rank::D),
            Rank::D => Some(Rank::C),
            Rank::C => Some(Rank::B),
            Rank::B => Some(Rank::A),
            Rank::A => Some(Rank::S),
            Rank::S => None,
        }
    }

    /// The highest rank whose threshold is at or below `experience`.
    pub fn for_experience(experience: u64) -> Rank {
        Rank::ALL
            .into_iter()
            .rev()
            .find(|r| r.threshold() <= experience)
            .unwrap_or(Rank::F)
    }

    /// Model tier a worker of this rank is entitled to.
    pub fn model_tier(self) -> ModelTier {
        match self {
            Rank::F | Rank::E | Rank::D => ModelTier::Mini,
            Rank::C | Rank::B | Rank::A | Rank::S => ModelTier::Standard,
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Rank::F => "F",
            Rank::E => "E",
            Rank::D => "D",
            Rank::C => "C",
            Rank::B => "B",
            Rank::A => "A",
            Rank::S => "S",
        };
        write!(f, "{s}")
    }
}

/// Map a rank's model entitlement to an OpenAI model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelTier {
    Mini,
    Standard,
}

impl ModelTier {
    pub fn api_name(self) -> &'static str {
        match self {
            ModelTier::Mini => "gpt-4o-mini",
            ModelTier::Standard => "gpt-4o",
        }
    }
}

/// The closed set of workflow roles a worker can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialty {
    Generalist,
    Writer,
    Editor,
    Researcher,
    Engineer,
    Reviewer,
    Illustrator,
    Planner,
}

impl Specialty {
    /// Worker-id prefix derived from the specialty.
    pub fn prefix(self) -> &'static str {
        match self {
            Specialty::Generalist => "GEN",
            Specialty::Writer => "WRI",
            Specialty::Editor => "EDT",
            Specialty::Researcher => "RES",
            Specialty::Engineer => "ENG",
            Specialty::Reviewer => "REV",
            Specialty::Illustrator => "ILL",
            Specialty::Planner => "PLN",
        }
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Specialty::Generalist => "generalist",
            Specialty::Writer => "writer",
            Specialty::Editor => "editor",
            Specialty::Researcher => "researcher",
            Specialty::Engineer => "engineer",
            Specialty::Reviewer => "reviewer",
            Specialty::Illustrator => "illustrator",
            Specialty::Planner => "planner",
        };
        write!(f, "{s}")
    }
}

/// A career-path rule: a worker of `from` specialty that reaches `at_rank`
/// advances to the `to` specialty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerRule {
    pub from: Specialty,
    pub at_rank: Rank,
    pub to: Specialty,
}

/// Derived behavior profile: system prompt and model tier for the worker's
/// current specialty and rank. Recomputed on demand, never persisted.
#[derive(Debug, Clone)]
pub struct Profile {
    pub system_prompt: String,
    pub model: ModelTier,
}

/// Outcome of a single task execution.
#[derive(Debug, Clone)]
pub struct TaskOutput {
    /// Generated text, or `None` if the backend failed.
    pub text: Option<String>,
    /// Name of the tool that was actually invoked, if any.
    pub tool_used: Option<String>,
}

/// A stateful task executor with rank, specialty and experience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    pub id: String,
    pub rank: Rank,
    pub specialty: Specialty,
    pub experience: u64,
}

impl Worker {
    /// Hire a fresh worker at the lowest rank.
    pub fn hire(id: String, specialty: Specialty) -> Self {
        Self {
            id,
            rank: Rank::F,
            specialty,
            experience: 0,
        }
    }

    /// Rebuild a worker from persisted state. The stored rank is never
    /// trusted: it is recomputed from experience to repair any drift.
    pub fn from_stored(id: String, specialty: Specialty, experience: u64) -> Self {
        Self {
            id,
            rank: Rank::for_experience(experience),
            specialty,
            experience,
        }
    }

    /// Current behavior profile, derived from rank and specialty.
    pub fn profile(&self, book: &GuildBook) -> Profile {
        Profile {
            system_prompt: book.prompt_for(self.specialty).to_string(),
            model: self.rank.model_tier(),
        }
    }

    /// Award experience, then run the rank-up check until no further
    /// promotion applies. A single award can cause several consecutive
    /// rank-ups; each advances exactly one rank, and career-path rules are
    /// evaluated once per rank reached (first matching rule wins).
    ///
    /// Returns the ranks reached, in order.
    pub fn gain_experience(&mut self, points: u64, career_path: &[CareerRule]) -> Vec<Rank> {
        self.experience += points;
        let mut reached = Vec::new();
        while let Some(next) = self.rank.next() {
            if self.experience < next.threshold() {
                break;
            }
            self.rank = next;
            reached.push(next);
            if let Some(rule) = career_path
                .iter()
                .find(|r| r.from == self.specialty && r.at_rank == next)
            {
                self.specialty = rule.to;
            }
        }
        reached
    }

    /// Execute a text task: recall memory context, decide on a tool, invoke
    /// it if one is warranted, and issue the final generation with this
    /// worker's specialty profile.
    ///
    /// Every backend failure is absorbed here and surfaced as an absent
    /// result; a malformed or unregistered tool decision simply means the
    /// task proceeds without a tool.
    pub async fn perform_task(
        &self,
        backend: &impl ChatBackend,
        memory: &impl MemoryStore,
        tools: &ToolRegistry,
        book: &GuildBook,
        prompt: &str,
    ) -> TaskOutput {
        let profile = self.profile(book);

        let recalled = memory.recall(prompt, RECALL_K);
        let task_prompt = if recalled.is_empty() {
            prompt.to_string()
        } else {
            format!(
                "Context from past jobs:\n{}\n\n{prompt}",
                recalled.join("\n")
            )
        };

        let decision_prompt = format!(
            "Available tools:\n{}\n\nTask:\n{task_prompt}",
            tools.catalog()
        );
        let decision = match backend
            .complete(TOOL_DECIDER_PROMPT, &decision_prompt, profile.model)
            .await
        {
            Ok(text) => decide_tool(&text, tools),
            Err(_) => None,
        };

        let (final_prompt, tool_used) = match decision {
            Some((tool, input)) => match tools.invoke(&tool, &input).await {
                Some(result) => (
                    format!(
                        "The user asked:\n{task_prompt}\n\n\
                         The {tool} tool returned:\n{result}\n\n\
                         Use the tool output to produce the final answer."
                    ),
                    Some(tool),
                ),
                None => (task_prompt, None),
            },
            None => (task_prompt, None),
        };

        let text = backend
            .complete(&profile.system_prompt, &final_prompt, profile.model)
            .await
            .ok();

        TaskOutput { text, tool_used }
    }

    /// Generate an image. A backend failure becomes `None`, never a fault.
    pub async fn create_image(&self, backend: &impl ChatBackend, prompt: &str) -> Option<String> {
        backend.generate_image(prompt).await.ok()
    }
}

/// Interpret a tool-decision response defensively: accept the bare
/// `NO_TOOL` sentinel, or the first well-formed JSON object embedded
/// anywhere in the text. Anything that fails to parse, or names an
/// unregistered tool, means "no tool".
fn decide_tool(text: &str, tools: &ToolRegistry) -> Option<(String, String)> {
    if text.trim() == NO_TOOL {
        return None;
    }
    let value = first_json_object(text)?;
    let tool = value.get("tool")?.as_str()?.to_string();
    if !tools.is_registered(&tool) {
        return None;
    }
    let input = value
        .get("input")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    Some((tool, input))
}
