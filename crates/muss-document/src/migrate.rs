//! Protocol migration between USS v1.3 and MUSS v1.0 Markdown artifacts.
//!
//! Both directions are text rewrites over the Markdown form, so formatting
//! the reader would normalize away (spacing, prose layout) survives. Each
//! pass is idempotent: upgrading an artifact that already carries MUSS
//! fields or the LIVE MEMORY SNAPSHOT section leaves them alone.

pub const MUSS_PROTOCOL: &str = "Memory-Augmented Universal Seed System";
pub const USS_PROTOCOL: &str = "Universal Seed Summary Invoker";

/// Stamp used for `session_id` when no timestamp can be recovered.
pub const FALLBACK_SESSION_STAMP: &str = "UPGRADED";

const LIVE_MEMORY_HEADING: &str = "### LIVE MEMORY SNAPSHOT";
const HEADER_HEADING: &str = "### HEADER";
const MUSS_ONLY_FIELDS: [&str; 3] = ["session_id", "exchange_count", "drift_risk"];

const LIVE_MEMORY_SCAFFOLD: [&str; 4] = [
    "**SESSION_LOG_DIGEST**: No entries logged. (Scaffolded via USS->MUSS upgrade.)",
    "**NOTEBOOK_STATE**: No notebook entries. (Scaffolded via USS->MUSS upgrade.)",
    "**Active_Directives**: None.",
    "**Commands_Issued**: None.",
];

const USS_HOOK: &str = "> INGESTION:";
const MUSS_HOOK: &str = "> MUSS INGESTION:";

/// Rewrite a USS v1.3 artifact as MUSS v1.0.
///
/// `session_stamp` becomes the suffix of the injected
/// `session_id: MUSS_SESSION_<stamp>`.
pub fn upgrade_to_muss(content: &str, session_stamp: &str) -> String {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    if let Some(close) = frontmatter_close(&lines) {
        let has_session = lines[1..close].iter().any(|l| key_of(l) == Some("session_id"));
        let mut timestamp_at = None;
        for (i, line) in lines.iter_mut().enumerate().take(close).skip(1) {
            match key_of(line) {
                Some("protocol") => *line = format!("protocol: {}", MUSS_PROTOCOL),
                Some("version" | "protocol_version") => *line = "protocol_version: \"1.0\"".to_string(),
                Some("timestamp") => timestamp_at = Some(i),
                _ => {}
            }
        }
        if !has_session {
            let at = timestamp_at.map_or(close, |i| i + 1);
            let fields = [
                format!("session_id: MUSS_SESSION_{}", session_stamp),
                "exchange_count: 0".to_string(),
                "drift_risk: LOW".to_string(),
            ];
            lines.splice(at..at, fields);
        }
    }

    let has_live_memory = lines.iter().any(|l| l.trim_end() == LIVE_MEMORY_HEADING);
    if !has_live_memory {
        if let Some(start) = lines.iter().position(|l| l.starts_with(HEADER_HEADING)) {
            let end = section_end(&lines, start);
            insert_live_memory(&mut lines, end);
        } else {
            tracing::debug!("no HEADER section; LIVE MEMORY SNAPSHOT not scaffolded");
        }
    }

    for line in &mut lines {
        if line.contains(USS_HOOK) {
            *line = line.replace(USS_HOOK, MUSS_HOOK);
        }
    }

    join_like(content, &lines)
}

/// Rewrite a MUSS v1.0 artifact as USS v1.3.
pub fn downgrade_to_uss(content: &str) -> String {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    if let Some(close) = frontmatter_close(&lines) {
        let mut kept = Vec::with_capacity(lines.len());
        for (i, line) in lines.into_iter().enumerate() {
            if i == 0 || i >= close {
                kept.push(line);
                continue;
            }
            match key_of(&line) {
                Some("protocol") => kept.push(format!("protocol: {}", USS_PROTOCOL)),
                Some("protocol_version") => kept.push("version: \"1.3\"".to_string()),
                Some(key) if MUSS_ONLY_FIELDS.contains(&key) => {}
                _ => kept.push(line),
            }
        }
        lines = kept;
    }

    if let Some(start) = lines.iter().position(|l| l.trim_end() == LIVE_MEMORY_HEADING) {
        let end = next_heading(&lines, start);
        let was_last = end == lines.len();
        lines.drain(start..end);
        if was_last {
            // Removed the last section: drop the separator that led into it
            while lines
                .last()
                .is_some_and(|l| l.trim().is_empty() || l.trim() == "---")
            {
                lines.pop();
            }
        }
    }

    for line in &mut lines {
        if line.contains(MUSS_HOOK) {
            *line = line.replace(MUSS_HOOK, USS_HOOK);
        }
    }

    join_like(content, &lines)
}

/// Derive a `YYYYMMDD_HHMMSS` stamp from the frontmatter `timestamp:`.
///
/// A date-only timestamp yields `YYYYMMDD`; anything with fewer than eight
/// digits yields `None`.
pub fn session_stamp_from_timestamp(content: &str) -> Option<String> {
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    let close = frontmatter_close(&lines)?;
    let value = lines[1..close]
        .iter()
        .find(|l| key_of(l) == Some("timestamp"))
        .and_then(|l| l.split_once(':'))
        .map(|(_, v)| v)?;

    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        n if n >= 14 => Some(format!("{}_{}", &digits[..8], &digits[8..14])),
        n if n >= 8 => Some(digits[..8].to_string()),
        _ => None,
    }
}

/// Index of the closing frontmatter fence.
fn frontmatter_close(lines: &[String]) -> Option<usize> {
    if lines.first().map(|l| l.trim_end()) != Some("---") {
        return None;
    }
    lines
        .iter()
        .skip(1)
        .position(|l| l.trim_end() == "---")
        .map(|p| p + 1)
}

fn key_of(line: &str) -> Option<&str> {
    line.split_once(':').map(|(key, _)| key.trim())
}

/// First line after `start` that begins another `### ` heading.
fn next_heading(lines: &[String], start: usize) -> usize {
    lines
        .iter()
        .skip(start + 1)
        .position(|l| l.starts_with("### "))
        .map_or(lines.len(), |p| p + start + 1)
}

/// End of the section opened at `start`: the next heading, the next `---`
/// separator line, or the end of the document.
fn section_end(lines: &[String], start: usize) -> usize {
    lines
        .iter()
        .skip(start + 1)
        .position(|l| l.starts_with("### ") || l.trim() == "---")
        .map_or(lines.len(), |p| p + start + 1)
}

fn insert_live_memory(lines: &mut Vec<String>, end: usize) {
    // Keep the section's own trailing blank lines after the new block
    let mut at = end;
    while at > 0 && lines[at - 1].trim().is_empty() {
        at -= 1;
    }

    let mut block = vec![
        String::new(),
        "---".to_string(),
        String::new(),
        LIVE_MEMORY_HEADING.to_string(),
        String::new(),
    ];
    block.extend(LIVE_MEMORY_SCAFFOLD.iter().map(|l| l.to_string()));
    lines.splice(at..at, block);
}

fn join_like(original: &str, lines: &[String]) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out
}
