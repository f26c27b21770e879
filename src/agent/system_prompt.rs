//! System prompt assembly.
//!
//! Builds the system message from the environment (working directory,
//! platform, date), the registry's tool listing, and the project memory
//! file when one exists.

use std::path::Path;

/// Build the system prompt for one agent run.
pub fn build_system_prompt(
    workdir: &Path,
    model: &str,
    tool_descriptions: &str,
    memory: Option<&str>,
) -> String {
    let workdir_display = workdir.display();
    let platform = std::env::consts::OS;
    let date = chrono::Local::now().format("%Y-%m-%d");

    let mut prompt = format!(
        "\
You are quill, a command-line coding assistant. You help with file
operations, code analysis, and project tasks by calling the tools below.

## Environment
- Model: {model}
- Working directory: {workdir_display}
- Platform: {platform}
- Date: {date}

## Available Tools
{tool_descriptions}
## Working Style
- Inspect before you act: view files and list directories before editing.
- Prefer the edit tool for small changes; replace only for new files or
  full rewrites.
- Shell commands run in a persistent session; `cd` and exported variables
  carry over between calls.
- Shell commands are filtered against a safety ban list and time out if
  they run too long.
- When a decision genuinely needs the user, ask with the user_input tool.
- When you have enough information, answer in plain text without calling
  further tools."
    );

    if let Some(memory) = memory {
        prompt.push_str(&format!(
            "\n\n## Project Memory\nNotes recorded in this project's memory file:\n\n{memory}"
        ));
    }

    prompt
}
