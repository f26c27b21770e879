use std::io::Write;

/// Ask the human operator a question and return their reply.
///
/// Prints the model's prompt to stderr (stdout is for model output) and
/// blocks on one line of stdin. Runs on the blocking pool so the async
/// runtime is not stalled.
pub async fn user_input(prompt: String) -> String {
    let reply = tokio::task::spawn_blocking(move || {
        eprint!("\n[question] {prompt}\n> ");
        std::io::stderr().flush().ok();
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => String::from("(no reply: end of input)"),
            Ok(_) => line.trim_end_matches(['\r', '\n']).to_string(),
            Err(e) => format!("(no reply: {e})"),
        }
    })
    .await;

    reply.unwrap_or_else(|e| format!("(no reply: {e})"))
}
