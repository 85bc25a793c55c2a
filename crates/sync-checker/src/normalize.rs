//! Subject line to card title mapping used by the sync.

const TASK_PREFIX: &str = "task:";

/// Convert an email subject to the card title the sync is expected to create.
///
/// `"Task: summarize the meeting"` becomes `"summarize the meeting"`, anything
/// without the (case-insensitive) `task:` prefix is only trimmed.
pub fn normalize_title(subject: &str) -> String {
    let mut title = subject.trim();
    while let Some(rest) = strip_prefix_ignore_case(title, TASK_PREFIX) {
        title = rest.trim();
    }
    title.to_string()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
