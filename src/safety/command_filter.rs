use regex::RegexSet;

/// Checks candidate shell commands against a set of banned patterns.
pub struct CommandFilter {
    patterns: RegexSet,
    pattern_reasons: Vec<String>,
}

/// Outcome of a filter check. `reason` is set exactly when `allowed` is false.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: Option<String>,
    pub command: String,
}

impl Verdict {
    fn allow(command: &str) -> Self {
        Self {
            allowed: true,
            reason: None,
            command: command.to_string(),
        }
    }

    fn deny(command: &str, reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            command: command.to_string(),
        }
    }

    /// Serialize for the model-facing rejection payload and the security log.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!("{{\"allowed\":false,\"reason\":\"{:?}\"}}", self.reason)
        })
    }
}

impl CommandFilter {
    /// Create a new filter from a list of (pattern, reason) tuples.
    /// The RegexSet is compiled once for efficient multi-pattern matching.
    pub fn new(patterns: &[(String, String)]) -> Result<Self, regex::Error> {
        let (regexes, reasons): (Vec<_>, Vec<_>) = patterns.iter().cloned().unzip();
        Ok(Self {
            patterns: RegexSet::new(&regexes)?,
            pattern_reasons: reasons,
        })
    }

    /// Create a filter from the built-in ban list.
    pub fn from_defaults() -> Result<Self, regex::Error> {
        Self::new(&super::defaults::default_banlist())
    }

    /// Check whether a command is allowed to execute.
    ///
    /// The command is split on chaining operators (`&&`, `;`, `|`) and every
    /// segment is checked independently -- a benign prefix must not hide a
    /// banned suffix. The first banned segment short-circuits with its reason.
    ///
    /// An empty or whitespace-only command is allowed; it is a no-op
    /// downstream. This function never fails: no pattern match means allow,
    /// which is the documented default-allow gap of a ban-list filter.
    pub fn is_allowed(&self, command: &str) -> Verdict {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Verdict::allow(command);
        }

        // Whole-command check first: some rules (e.g. piping a download into a
        // shell) span an operator and would be invisible to per-segment checks.
        let matches: Vec<_> = self.patterns.matches(trimmed).into_iter().collect();
        if let Some(&first) = matches.first() {
            return Verdict::deny(command, self.pattern_reasons[first].clone());
        }

        for segment in split_segments(trimmed) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let normalized = normalize(segment);
            let matches: Vec<_> = self.patterns.matches(&normalized).into_iter().collect();
            if let Some(&first) = matches.first() {
                return Verdict::deny(command, self.pattern_reasons[first].clone());
            }
        }

        Verdict::allow(command)
    }
}

/// Split a command line on the shell chaining operators `&&`, `;`, `|`.
///
/// `||` splits into two empty-separated segments via its two pipes, which is
/// fine: both sides still get checked. No attempt is made to respect quoting;
/// over-splitting only makes the filter stricter.
fn split_segments(command: &str) -> impl Iterator<Item = &str> {
    command
        .split("&&")
        .flat_map(|part| part.split(';'))
        .flat_map(|part| part.split('|'))
}

/// Lowercase the leading token of a segment so prefix-style rules match
/// regardless of case. The remainder is left untouched (paths are
/// case-sensitive on unix).
fn normalize(segment: &str) -> String {
    match segment.split_once(char::is_whitespace) {
        Some((head, rest)) => format!("{} {}", head.to_lowercase(), rest),
        None => segment.to_lowercase(),
    }
}
