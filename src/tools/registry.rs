//! Static tool registry.
//!
//! The candidate tool set is closed and known in advance; only platform
//! availability varies. Discovery is a capability check over the fixed
//! [`ToolKind`] variants, not a plugin scan: unavailable variants (the
//! wrong-platform shell flavor) are skipped with a logged reason and the
//! surviving set becomes the dispatch loop's available-tools list.

use std::fmt::Write as _;

use genai::chat::Tool;
use serde_json::json;

use crate::exec::ShellFlavor;

/// The closed set of tool variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    View,
    Edit,
    Replace,
    Glob,
    Grep,
    Ls,
    Cd,
    Shell(ShellFlavor),
    UserInput,
}

/// One parameter in a tool's input schema. Order in the descriptor is the
/// order shown to the model.
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// Static metadata for a tool variant: name, description, parameter schema,
/// output type. Immutable once built.
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub output: &'static str,
}

impl ToolDescriptor {
    /// Render the descriptor as a `genai` tool schema for the chat request.
    pub fn to_genai_tool(&self) -> Tool {
        let mut properties = serde_json::Map::new();
        for p in &self.params {
            properties.insert(
                p.name.to_string(),
                json!({ "type": p.ty, "description": p.description }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        Tool::new(self.name)
            .with_description(self.description)
            .with_schema(json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }))
    }
}

impl ToolKind {
    /// The full candidate set, both shell flavors included. Platform
    /// filtering happens in [`ToolRegistry::discover`].
    pub fn candidates() -> Vec<ToolKind> {
        vec![
            ToolKind::View,
            ToolKind::Edit,
            ToolKind::Replace,
            ToolKind::Glob,
            ToolKind::Grep,
            ToolKind::Ls,
            ToolKind::Cd,
            ToolKind::Shell(ShellFlavor::Posix),
            ToolKind::Shell(ShellFlavor::Windows),
            ToolKind::UserInput,
        ]
    }

    /// Unique tool name. Both shell flavors expose the same `shell` tool --
    /// they are the platform substitution point, not different tools.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::View => "view",
            ToolKind::Edit => "edit",
            ToolKind::Replace => "replace",
            ToolKind::Glob => "glob",
            ToolKind::Grep => "grep",
            ToolKind::Ls => "ls",
            ToolKind::Cd => "cd",
            ToolKind::Shell(_) => "shell",
            ToolKind::UserInput => "user_input",
        }
    }

    /// Static capability check for the current host.
    pub fn available(&self) -> bool {
        match self {
            ToolKind::Shell(flavor) => flavor.available_on_host(),
            _ => true,
        }
    }

    /// Human-readable reason used when discovery skips this variant.
    pub fn unavailable_reason(&self) -> String {
        match self {
            ToolKind::Shell(flavor) => format!(
                "requires the {} interpreter, which is not the shell for this platform",
                flavor.binary()
            ),
            _ => String::from("always available"),
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        match self {
            ToolKind::View => ToolDescriptor {
                name: "view",
                description: "Read a file and return its content with line numbers. \
                              Output is capped; use offset/limit to page through large files.",
                params: vec![
                    ParamSpec { name: "path", ty: "string", description: "File path, relative to the working directory or absolute", required: true },
                    ParamSpec { name: "offset", ty: "integer", description: "1-based line number to start from", required: false },
                    ParamSpec { name: "limit", ty: "integer", description: "Maximum number of lines to return", required: false },
                ],
                output: "string",
            },
            ToolKind::Edit => ToolDescriptor {
                name: "edit",
                description: "Replace exactly one occurrence of old_string in a file with new_string. \
                              Fails if old_string is absent or matches more than once; include enough \
                              surrounding context to make the match unique.",
                params: vec![
                    ParamSpec { name: "path", ty: "string", description: "File to edit", required: true },
                    ParamSpec { name: "old_string", ty: "string", description: "Exact text to replace (must occur exactly once)", required: true },
                    ParamSpec { name: "new_string", ty: "string", description: "Replacement text", required: true },
                ],
                output: "string",
            },
            ToolKind::Replace => ToolDescriptor {
                name: "replace",
                description: "Create a file or fully overwrite an existing one with the given content. \
                              Missing parent directories are created.",
                params: vec![
                    ParamSpec { name: "path", ty: "string", description: "File to create or overwrite", required: true },
                    ParamSpec { name: "content", ty: "string", description: "Full new file content", required: true },
                ],
                output: "string",
            },
            ToolKind::Glob => ToolDescriptor {
                name: "glob",
                description: "Find files matching a glob pattern (supports ** for recursive descent). \
                              Results are sorted and stable across calls.",
                params: vec![
                    ParamSpec { name: "pattern", ty: "string", description: "Glob pattern, e.g. **/*.rs", required: true },
                    ParamSpec { name: "root", ty: "string", description: "Directory to search under (default: working directory)", required: false },
                ],
                output: "string",
            },
            ToolKind::Grep => ToolDescriptor {
                name: "grep",
                description: "Regex search across files. Matches are grouped by file with line numbers.",
                params: vec![
                    ParamSpec { name: "pattern", ty: "string", description: "Regular expression to search for", required: true },
                    ParamSpec { name: "root", ty: "string", description: "Directory to search under (default: working directory)", required: false },
                    ParamSpec { name: "file_filter", ty: "string", description: "Glob restricting which file names are searched, e.g. *.rs", required: false },
                ],
                output: "string",
            },
            ToolKind::Ls => ToolDescriptor {
                name: "ls",
                description: "Tree-structured directory listing, bounded in depth and entry count.",
                params: vec![
                    ParamSpec { name: "path", ty: "string", description: "Directory to list (default: working directory)", required: false },
                ],
                output: "string",
            },
            ToolKind::Cd => ToolDescriptor {
                name: "cd",
                description: "Change the working directory for subsequent tool calls. \
                              The target must exist and be a directory.",
                params: vec![
                    ParamSpec { name: "path", ty: "string", description: "Directory to change to", required: true },
                ],
                output: "string",
            },
            ToolKind::Shell(flavor) => ToolDescriptor {
                name: "shell",
                description: match flavor {
                    ShellFlavor::Posix => {
                        "Execute a bash command in a persistent session: working directory and \
                         environment variables carry over between calls. Commands are checked \
                         against a safety ban list and time out if they run too long."
                    }
                    ShellFlavor::Windows => {
                        "Execute a PowerShell command in a persistent session: working directory \
                         and variables carry over between calls. Commands are checked against a \
                         safety ban list and time out if they run too long."
                    }
                },
                params: vec![
                    ParamSpec { name: "command", ty: "string", description: "The shell command to execute", required: true },
                    ParamSpec { name: "timeout", ty: "integer", description: "Timeout in seconds (default from config)", required: false },
                ],
                output: "string",
            },
            ToolKind::UserInput => ToolDescriptor {
                name: "user_input",
                description: "Ask the human operator a question and wait for their one-line reply. \
                              Use this when a decision genuinely needs the user.",
                params: vec![
                    ParamSpec { name: "prompt", ty: "string", description: "The question to show the user", required: true },
                ],
                output: "string",
            },
        }
    }
}

/// The surviving tool set after platform filtering.
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
}

impl ToolRegistry {
    /// Run the startup capability check over the fixed candidate set.
    /// Skipped variants are logged with their reason.
    pub fn discover() -> Self {
        let mut tools: Vec<ToolKind> = Vec::new();
        for candidate in ToolKind::candidates() {
            if !candidate.available() {
                tracing::info!(
                    tool = candidate.name(),
                    reason = %candidate.unavailable_reason(),
                    "skipping unavailable tool"
                );
                continue;
            }
            if tools.iter().any(|t| t.name() == candidate.name()) {
                continue; // one shell flavor is enough
            }
            tools.push(candidate);
        }
        tracing::debug!(count = tools.len(), "tool registry ready");
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolKind] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<ToolKind> {
        self.tools.iter().copied().find(|t| t.name() == name)
    }

    /// Tool schemas for [`genai::chat::ChatRequest::with_tools`].
    pub fn schemas(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| t.descriptor().to_genai_tool())
            .collect()
    }

    /// Human-readable tool listing embedded in the system prompt.
    pub fn descriptions(&self) -> String {
        let mut out = String::new();
        for kind in &self.tools {
            let desc = kind.descriptor();
            let _ = writeln!(out, "### {}\n{}", desc.name, desc.description);
            for p in &desc.params {
                let _ = writeln!(
                    out,
                    "- **{}** ({}, {}): {}",
                    p.name,
                    p.ty,
                    if p.required { "required" } else { "optional" },
                    p.description
                );
            }
            out.push('\n');
        }
        out
    }
}
