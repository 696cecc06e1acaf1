//! Transcript text cleanup.
//!
//! Raw transcripts carry timestamps, speaker tags, and markdown noise that
//! should never reach the user or be fed into summarization prompts.

use regex::Regex;
use std::sync::OnceLock;

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\d{2}:\d{2}:\d{2}\]").expect("valid regex"))
}

fn speaker_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Bolded "**name-number**:" speaker labels produced by the transcriber.
    RE.get_or_init(|| Regex::new(r"\*\*.*?-\d+\*\*:").expect("valid regex"))
}

fn greeting_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(hello|hi|welcome|hey|ok|bye)\b").expect("valid regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Clean raw transcript text for display and prompt building.
///
/// Removes `[HH:MM:SS]` timestamps, bolded speaker tags, common greeting
/// words, and markdown artifacts, then collapses whitespace. Total over all
/// inputs and idempotent: cleaning already-clean text is a no-op.
pub fn clean_text(text: &str) -> String {
    let text = timestamp_re().replace_all(text, "");
    let text = speaker_tag_re().replace_all(&text, "");
    let text = greeting_re().replace_all(&text, "");
    let text = text.replace("~~", "").replace('#', "");
    let text = whitespace_re().replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_timestamps() {
        let cleaned = clean_text("[00:01:23] data pipelines [12:34:56] are neat");
        assert_eq!(cleaned, "data pipelines are neat");
        assert!(!cleaned.contains('['));
    }

    #[test]
    fn test_removes_speaker_tags() {
        let cleaned = clean_text("**alice-42**: the lakehouse pattern");
        assert_eq!(cleaned, "the lakehouse pattern");
    }

    #[test]
    fn test_removes_greetings_case_insensitive() {
        let cleaned = clean_text("Hello everyone, WELCOME back. Hi!");
        assert_eq!(cleaned, "everyone, back. !");
    }

    #[test]
    fn test_greetings_only_whole_words() {
        // "hippo" contains "hi" but must survive
        assert_eq!(clean_text("hippo highway"), "hippo highway");
    }

    #[test]
    fn test_removes_markdown_artifacts() {
        assert_eq!(clean_text("## Heading ~~strike~~"), "Heading strike");
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(clean_text("  a \n\n b\tc  "), "a b c");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "[00:01:23] **bob-7**: hello ~~world~~ # done",
            "already clean text",
            "",
            "   \n  ",
        ];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once);
        }
    }
}
