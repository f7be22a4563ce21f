//! The two reference tools workers can reach for: a web-search lookup and
//! a sandboxed code runner.
//!
//! Tools return strings and never raise past this boundary — a failed
//! lookup or a crashed script comes back as an error string the worker can
//! fold into its follow-up prompt.

use std::time::Duration;

use tokio::process::Command;

pub const WEB_SEARCH: &str = "web_search";
pub const RUN_CODE: &str = "run_code";

const SEARCH_URL: &str = "https://serpapi.com/search";
const CODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry of the available tools. Unknown names are simply not invoked.
pub struct ToolRegistry {
    client: reqwest::Client,
    serpapi_key: String,
    search_url: String,
}

impl ToolRegistry {
    pub fn new(serpapi_key: String) -> Self {
        Self::with_search_url(serpapi_key, SEARCH_URL.to_string())
    }

    /// Point the web-search tool at a custom endpoint (useful for testing).
    pub fn with_search_url(serpapi_key: String, search_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            serpapi_key,
            search_url,
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        matches!(name, WEB_SEARCH | RUN_CODE)
    }

    /// One line per tool, for the tool-decision prompt.
    pub fn catalog(&self) -> String {
        format!(
            "- {WEB_SEARCH}: look up current facts on the web; input is a search query\n\
             - {RUN_CODE}: run a short Python snippet and capture its stdout; input is the code"
        )
    }

    /// Invoke a tool by name. Returns `None` only for unregistered names;
    /// registered tools always produce a string, error strings included.
    pub async fn invoke(&self, name: &str, input: &str) -> Option<String> {
        match name {
            WEB_SEARCH => Some(self.web_search(input).await),
            RUN_CODE => Some(self.run_code(input).await),
            _ => None,
        }
    }

    /// SerpApi-shaped lookup: answer box if present, else the first organic
    /// snippet, else a "no results" message.
    async fn web_search(&self, query: &str) -> String {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", &self.serpapi_key),
            ])
            .send()
            .await;

        let body: serde_json::Value = match response {
            Ok(resp) => match resp.json().await {
                Ok(json) => json,
                Err(e) => return format!("web search error: {e}"),
            },
            Err(e) => return format!("web search error: {e}"),
        };

        if let Some(answer) = body.get("answer_box") {
            return answer.to_string();
        }
        if let Some(snippet) = body
            .get("organic_results")
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("snippet"))
            .and_then(|s| s.as_str())
        {
            return snippet.to_string();
        }
        "No definitive results found.".to_string()
    }

    /// Run a Python snippet in a subprocess, capturing stdout. Reports
    /// either the captured output or an error string.
    async fn run_code(&self, code: &str) -> String {
        let run = Command::new("python3")
            .arg("-c")
            .arg(code)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(CODE_TIMEOUT, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return format!("code execution error: {e}"),
            Err(_) => return "code execution error: timed out".to_string(),
        };

        if output.status.success() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            format!(
                "code execution error: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )
        }
    }
}
