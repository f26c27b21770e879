use std::io::Write;

use clap::Parser;

use quill::agent::{memory, Agent};
use quill::cli::Cli;
use quill::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout is for model output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    // No arguments at all: print the welcome screen and exit cleanly.
    if std::env::args().len() == 1 {
        print_welcome();
        return Ok(());
    }

    let cli = Cli::parse();

    // A missing API key is an unrecoverable startup failure.
    config::require_api_key()?;

    let config = config::load_config(&cli)?;
    tracing::debug!(model = %config.model, workdir = %config.workdir.display(), "config loaded");

    let mut agent = Agent::new(&config)?;
    eprintln!("quill ready. Working directory: {}", agent.workdir().display());

    let result = if cli.interactive || cli.query.is_empty() {
        run_interactive(&mut agent).await
    } else {
        let query = cli.query.join(" ");
        run_single_query(&mut agent, &query).await
    };

    agent.shutdown().await;
    result
}

async fn run_single_query(agent: &mut Agent, query: &str) -> anyhow::Result<()> {
    let answer = agent.run(query).await?;
    if answer.is_empty() {
        eprintln!("(no answer produced)");
    }
    Ok(())
}

/// A line handled directly by the interactive loop, without a model
/// round-trip.
#[derive(Debug, PartialEq, Eq)]
enum Builtin {
    Quit,
    Help,
    Cd(String),
    CdUsage,
    Remember(String),
}

fn parse_builtin(input: &str) -> Option<Builtin> {
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return Some(Builtin::Quit);
    }
    if input.eq_ignore_ascii_case("help") {
        return Some(Builtin::Help);
    }
    if input == "cd" {
        return Some(Builtin::CdUsage);
    }
    if let Some(path) = input.strip_prefix("cd ") {
        return Some(Builtin::Cd(path.trim().to_string()));
    }
    if let Some(note) = input.strip_prefix("/remember ") {
        return Some(Builtin::Remember(note.to_string()));
    }
    None
}

async fn run_interactive(agent: &mut Agent) -> anyhow::Result<()> {
    eprintln!("Interactive mode. Type 'help' for commands, 'exit' to end.");

    loop {
        eprint!("\nquill> ");
        std::io::stderr().flush().ok();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        if input.is_empty() {
            continue;
        }

        match parse_builtin(input) {
            Some(Builtin::Quit) => break,
            Some(Builtin::Help) => print_interactive_help(),
            Some(Builtin::CdUsage) => eprintln!("usage: cd <path>"),
            // Direct working-directory change, no model round-trip.
            Some(Builtin::Cd(path)) => match agent.change_workdir(&path) {
                Ok(()) => eprintln!("Working directory: {}", agent.workdir().display()),
                Err(e) => eprintln!("cd failed: {e}"),
            },
            // Append a note to the project memory file.
            Some(Builtin::Remember(note)) => match memory::append(agent.workdir(), &note) {
                Ok(()) => eprintln!("Noted in {}", memory::MEMORY_FILE),
                Err(e) => eprintln!("Failed to write memory file: {e}"),
            },
            None => {
                if let Err(e) = agent.run(input).await {
                    eprintln!("Error: {e}");
                }
            }
        }
    }

    eprintln!("Goodbye.");
    Ok(())
}

fn print_interactive_help() {
    eprintln!(
        "\
Commands:
  help                 show this message
  cd <path>            change the working directory
  /remember <note>     append a note to {memory}
  exit | quit          end the session

Anything else is sent to the assistant, which can use these tools:
  view, edit, replace, glob, grep, ls, cd, shell, user_input",
        memory = memory::MEMORY_FILE
    );
}


fn print_welcome() {
    println!(
        "\
quill - a command-line coding assistant

USAGE:
  quill \"your question\"        ask a single question
  quill -i                     interactive mode
  quill --cwd /path \"question\"  set the working directory

TOOLS:
  view / edit / replace        read and modify files
  glob / grep / ls / cd        find and navigate
  shell                        run commands in a persistent session
  user_input                   the assistant can ask you questions

CONFIGURATION:
  DEEPSEEK_API_KEY             required API credential (environment)
  quill.toml                   optional per-project or global config

Try: quill -i"
    );
}
