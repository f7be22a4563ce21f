use std::path::Path;

use anyhow::Result;
use clap::Parser;

use monarch::cli::{Cli, Command};
use monarch::config::GuildBook;
use monarch::memory::FileMemory;
use monarch::monarch::Monarch;
use monarch::openai::OpenAiClient;
use monarch::persist::SavedState;
use monarch::tools::ToolRegistry;
use monarch::ui::{JobProgress, roster_line};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let book = GuildBook::load(cli.config.as_deref().map(Path::new))?;
    let backend = OpenAiClient::new(book.api_key.clone());
    let memory = FileMemory::open(Path::new(&book.memory_path))?;
    let tools = ToolRegistry::new(book.serpapi_key.clone());
    let state_path = book.state_path.clone();

    let mut monarch = Monarch::new(book, backend, memory, tools);
    if let Some(state) = SavedState::load(Path::new(&state_path))? {
        monarch.restore(state);
    }

    match cli.command {
        Command::Run { request } => {
            run_one(&mut monarch, &request, cli.budget, cli.verbose).await;
            monarch.snapshot().save(Path::new(&state_path))?;
        }
        Command::Plan { request } => match monarch.run_plan(&request).await {
            Some(outcome) => {
                for line in &outcome.history {
                    println!("{line}");
                }
                println!();
                for (name, text) in &outcome.artifacts {
                    println!("--- {name} ---\n{text}\n");
                }
            }
            None => println!("Plan could not be completed."),
        },
        Command::Status => {
            println!("Treasury balance: {}", monarch.treasury_balance());
            println!();
            if monarch.roster().is_empty() {
                println!("No workers hired yet.");
            } else {
                for worker in monarch.roster().values() {
                    println!("{}", roster_line(worker));
                }
            }
        }
        Command::Demo => {
            run_one(
                &mut monarch,
                "Write a report on the rise and fall of the Mayan civilization",
                cli.budget,
                cli.verbose,
            )
            .await;
            run_one(
                &mut monarch,
                "Create a Python script that fetches the current weather for a given city",
                cli.budget,
                cli.verbose,
            )
            .await;
            monarch.snapshot().save(Path::new(&state_path))?;
        }
    }

    Ok(())
}

async fn run_one(
    monarch: &mut Monarch<OpenAiClient, FileMemory>,
    request: &str,
    budget: Option<i64>,
    verbose: bool,
) {
    let progress = JobProgress::start(request);
    let report = match budget {
        Some(b) => monarch.execute_job_with_budget(request, b).await,
        None => monarch.execute_job(request).await,
    };
    progress.complete(&report);

    if let Some(result) = &report.result {
        println!("\n--- Deliverable ---\n{result}");
    } else {
        println!("\nThe job could not be completed.");
        for line in &report.history {
            println!("  {line}");
        }
    }
    if verbose {
        progress.print_report(&report);
    }
}
