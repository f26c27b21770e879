//! The dispatch loop.
//!
//! A thin request/response cycle: send the conversation plus tool schemas to
//! the model, stream assistant text to stdout, dispatch each captured tool
//! call through the registry, feed the results back, and repeat until the
//! model answers with text only. All events go to the JSONL session log.

use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent, ToolCall, ToolResponse,
};
use genai::Client;

use crate::agent::logging::{now_iso, LogEntry, SessionLogger};
use crate::agent::memory;
use crate::agent::system_prompt::build_system_prompt;
use crate::config::AppConfig;
use crate::error::AgentError;
use crate::exec::{ShellFlavor, ShellSession};
use crate::safety::SafetyGate;
use crate::tools::registry::ToolRegistry;
use crate::tools::{dispatch, ToolContext};

/// One agent run: the model, the discovered tool set, the mutable tool
/// context (working directory + shell session), and the session log.
///
/// The shell subprocess is owned by `cx.shell` for the lifetime of the run
/// and released by [`Agent::shutdown`] (or on drop).
pub struct Agent {
    client: Client,
    model: String,
    registry: ToolRegistry,
    cx: ToolContext,
    logger: SessionLogger,
    max_turns: u64,
}

impl Agent {
    /// Build an agent from resolved configuration. Discovers the tool set,
    /// compiles the safety gate, and opens the session log. The shell
    /// interpreter is not spawned until the first shell command runs.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let registry = ToolRegistry::discover();

        if let Some(parent) = config.security_log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let gate = SafetyGate::new(&config.banned_patterns, config.security_log_path.clone())?;
        let shell = ShellSession::new(ShellFlavor::host_default(), gate);

        let mut logger = SessionLogger::new(&config.workdir)?;
        logger.log_session_start(&config.model, &config.workdir)?;

        Ok(Self {
            client: Client::default(),
            model: config.model.clone(),
            registry,
            cx: ToolContext {
                workdir: config.workdir.clone(),
                shell,
                shell_timeout: Duration::from_secs(config.shell_timeout_secs),
            },
            logger,
            max_turns: config.max_turns,
        })
    }

    /// The current working directory of the tool context.
    pub fn workdir(&self) -> &std::path::Path {
        &self.cx.workdir
    }

    /// Change the working directory directly (interactive `cd` command).
    pub fn change_workdir(&mut self, path: &str) -> Result<(), crate::error::ToolError> {
        let new_cwd = crate::tools::cd::cd(&self.cx.workdir, path)?;
        self.cx.workdir = new_cwd;
        Ok(())
    }

    /// Run the dispatch loop for one user query and return the model's final
    /// text answer.
    pub async fn run(&mut self, query: &str) -> anyhow::Result<String> {
        let mem = memory::load(&self.cx.workdir);
        let system_prompt = build_system_prompt(
            &self.cx.workdir,
            &self.model,
            &self.registry.descriptions(),
            mem.as_deref(),
        );

        let mut chat_req = ChatRequest::from_system(&system_prompt)
            .with_tools(self.registry.schemas())
            .append_message(ChatMessage::user(query));

        let chat_options = ChatOptions::default()
            .with_capture_content(true)
            .with_capture_tool_calls(true);

        self.logger.log_event(&LogEntry::UserQuery {
            timestamp: now_iso(),
            query: query.to_string(),
        })?;

        let mut turn: u64 = 0;
        loop {
            turn += 1;
            if turn > self.max_turns {
                self.logger.log_session_end(turn - 1, "max_turns")?;
                return Err(AgentError::MaxTurns(self.max_turns).into());
            }

            // -- Stream the model response
            let stream_res = self
                .client
                .exec_chat_stream(&self.model, chat_req.clone(), Some(&chat_options))
                .await
                .map_err(|e| {
                    let msg = format!("LLM stream error: {e}");
                    let _ = self.logger.log_event(&LogEntry::Error {
                        timestamp: now_iso(),
                        turn,
                        message: msg.clone(),
                    });
                    AgentError::LlmError(msg)
                })?;

            let mut stream = stream_res.stream;
            let mut captured_text: Option<String> = None;
            let mut captured_tool_calls: Vec<ToolCall> = Vec::new();

            while let Some(event) = stream.next().await {
                match event {
                    Ok(ChatStreamEvent::Chunk(chunk)) => {
                        // Print text to stdout in real time.
                        print!("{}", chunk.content);
                        std::io::stdout().flush().ok();
                    }
                    Ok(ChatStreamEvent::End(end)) => {
                        if let Some(text) = end.captured_first_text() {
                            captured_text = Some(text.to_string());
                        }
                        if let Some(calls) = end.captured_tool_calls() {
                            captured_tool_calls = calls.into_iter().cloned().collect();
                        }
                    }
                    Ok(_) => {
                        // Start, ReasoningChunk, ToolCallChunk -- ignore.
                    }
                    Err(e) => {
                        eprintln!("\n[stream error] {e}");
                        // Continue -- the End event may still arrive.
                    }
                }
            }

            if let Some(ref text) = captured_text {
                self.logger.log_event(&LogEntry::AssistantText {
                    timestamp: now_iso(),
                    turn,
                    content: text.clone(),
                })?;
            }

            if captured_tool_calls.is_empty() {
                // Text-only response: that is the final answer.
                println!(); // newline after streamed text
                self.logger.log_session_end(turn, "answered")?;
                return Ok(captured_text.unwrap_or_default());
            }

            // -- Tool calls: dispatch each one in order.
            println!(); // newline after any streamed text
            let assistant_msg: ChatMessage = ChatMessage::from(captured_tool_calls.clone());
            chat_req = chat_req.append_message(assistant_msg);

            for call in &captured_tool_calls {
                self.logger.log_event(&LogEntry::ToolCall {
                    timestamp: now_iso(),
                    turn,
                    call_id: call.call_id.clone(),
                    fn_name: call.fn_name.clone(),
                    fn_arguments: call.fn_arguments.clone(),
                })?;

                let args_summary = serde_json::to_string(&call.fn_arguments)
                    .unwrap_or_else(|_| "{}".to_string());
                eprintln!("[tool] {}({})", call.fn_name, truncate(&args_summary, 100));

                let result =
                    dispatch(&self.registry, &call.fn_name, &call.fn_arguments, &mut self.cx)
                        .await?;

                self.logger.log_event(&LogEntry::ToolResult {
                    timestamp: now_iso(),
                    turn,
                    call_id: call.call_id.clone(),
                    fn_name: call.fn_name.clone(),
                    result: result.clone(),
                })?;
                eprintln!("[result] {}", truncate(&result, 200));

                chat_req = chat_req.append_message(ToolResponse::new(call.call_id.clone(), result));
            }
        }
    }

    /// Release the shell subprocess. Called at the end of a run; the session
    /// is also killed on drop as a backstop.
    pub async fn shutdown(&mut self) {
        self.cx.shell.close().await;
    }
}

/// Truncate a display string to at most `max` characters.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}
