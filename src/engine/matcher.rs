//! Command-line matching (first pass).
//!
//! Matching is anchored and deterministic:
//!
//! ```text
//! "/zp stats all 7d /fields:id"
//!   │
//!   ├─ head:  /<platform> <verb>          platform="zp", verb="stats"
//!   ├─ index: verb -> [grammar ids]       (grammars.rs)
//!   ├─ tokens: drop flag spans            "/fields:id", "/limit 3", "--ie"
//!   └─ for each candidate, in order:
//!        consume positional tokens left to right
//!          - token fits the kind          -> capture, advance
//!          - optional slot, no fit        -> skip slot
//!          - required slot, no fit        -> grammar fails
//!        leftover positional tokens fail the grammar
//!      first grammar that survives wins
//! ```
//!
//! Flags may sit before, between or after the positionals; a flag token and
//! the value its grammar consumes are never taken as positionals. Flag values
//! are read in the second pass; see `flags.rs`.

use tracing::debug;

use crate::config::Settings;
use crate::{FieldKind, Flag, Grammar};

use super::flags::resume_after;
use super::grammars::CompiledGrammars;

/// A positional token captured by the winning grammar, not yet coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub name: &'static str,
    pub kind: FieldKind,
    pub raw: String,
}

/// Output of the first pass.
#[derive(Debug, Clone)]
pub struct MatchedCommand<'a> {
    pub grammar: &'a Grammar,
    /// Platform token as typed (aliases are resolved by the dispatcher).
    pub platform: String,
    /// Verb token as typed, lower-cased.
    pub command: String,
    pub captures: Vec<Capture>,
}

/// Find the first grammar matching `text`.
pub(crate) fn match_command<'a>(
    compiled: &CompiledGrammars<'a>,
    settings: &Settings,
    text: &str,
) -> Option<MatchedCommand<'a>> {
    let head = regex!(r"(?i)^\s*/(?P<platform>[a-z0-9_]+)\s+(?P<command>[a-z][a-z0-9-]*)").captures(text)?;
    let platform = head.name("platform")?.as_str().to_ascii_lowercase();
    let command_match = head.name("command")?;
    let rest = &text[command_match.end()..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        debug!(text, "verb token is not followed by a boundary");
        return None;
    }
    let command = command_match.as_str().to_ascii_lowercase();
    let tokens = positional_tokens(&compiled.flags, rest);

    for grammar in compiled.candidates(&command) {
        match match_positionals(grammar, settings, &tokens) {
            Some(captures) => {
                debug!(grammar = grammar.name, platform = %platform, command = %command, "grammar matched");
                return Some(MatchedCommand { grammar, platform, command, captures });
            }
            None => debug!(grammar = grammar.name, "positional structure did not fit"),
        }
    }
    None
}

fn match_positionals(grammar: &Grammar, settings: &Settings, tokens: &[&str]) -> Option<Vec<Capture>> {
    let mut captures = Vec::new();
    let mut rest = tokens;

    for slot in &grammar.positionals {
        match rest.split_first() {
            Some((token, tail)) if token_fits(slot.kind, token, settings) => {
                captures.push(Capture { name: slot.name, kind: slot.kind, raw: token.to_string() });
                rest = tail;
            }
            _ if slot.optional => continue,
            _ => return None,
        }
    }

    if rest.is_empty() { Some(captures) } else { None }
}

/// Whitespace-delimited tokens of `rest` outside every flag occurrence.
///
/// A marker token no flag grammar accepts (unknown name, malformed value) is
/// dropped on its own.
fn positional_tokens<'t>(flags: &[&Flag], rest: &'t str) -> Vec<&'t str> {
    let mut spans = Vec::new();
    for flag in flags {
        let mut at = 0;
        while at < rest.len() {
            let Some(whole) = flag.pattern.find_at(rest, at) else { break };
            spans.push(whole.range());
            at = resume_after(whole);
        }
    }

    regex!(r"\S+")
        .find_iter(rest)
        .filter(|token| !spans.iter().any(|span| span.contains(&token.start())))
        .map(|token| token.as_str())
        .filter(|token| !is_flag_token(token))
        .collect()
}

fn is_flag_token(token: &str) -> bool {
    token.starts_with('/') || token.starts_with("--")
}

pub(crate) fn token_fits(kind: FieldKind, token: &str, settings: &Settings) -> bool {
    match kind {
        FieldKind::Identifier => {
            token.eq_ignore_ascii_case(&settings.all_alias)
                || regex!(r"(?i)^(?:\d+|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$").is_match(token)
        }
        FieldKind::Interval => regex!(r"(?i)^(?:\d+[dwmy]|[a-z]+)$").is_match(token),
        FieldKind::Threshold => regex!(r"^(?:\d+(?:\.\d+)?|\.\d+)$").is_match(token),
        FieldKind::Limit => regex!(r"^\d+$").is_match(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;

    fn matched(text: &str) -> Option<(&'static str, Vec<(&'static str, String)>)> {
        let grammars = rules::commands::get();
        let flags = rules::flags::get();
        let compiled = CompiledGrammars::new(&grammars, &flags, rules::commands::CONDITIONAL_DEFAULTS);
        let m = match_command(&compiled, &Settings::default(), text)?;
        Some((m.grammar.name, m.captures.into_iter().map(|c| (c.name, c.raw)).collect()))
    }

    #[test]
    fn head_is_case_insensitive() {
        let (name, captures) = matched("/MGID List 123").unwrap();
        assert_eq!(name, "list campaigns");
        assert_eq!(captures, [("campaign_id", "123".to_string())]);
    }

    #[test]
    fn optional_slot_is_skipped_when_token_does_not_fit() {
        let (_, captures) = matched("/mgid top-widgets 1023198 3d").unwrap();
        assert_eq!(captures, [("campaign_id", "1023198".to_string()), ("time_interval", "3d".to_string())]);

        let (_, captures) = matched("/mgid stats 7d").unwrap();
        assert_eq!(captures, [("time_interval", "7d".to_string())]);
    }

    #[test]
    fn required_slot_failure_rejects_the_grammar() {
        assert!(matched("/mgid widgets-high-cpa 123").is_none());
        assert!(matched("/mgid widgets-high-cpa 123 5").is_some());
    }

    #[test]
    fn trailing_flags_are_left_for_the_second_pass() {
        let (_, captures) = matched("/zeropark stats all 7d /fields:id,name").unwrap();
        assert_eq!(captures, [("campaign_id", "all".to_string()), ("time_interval", "7d".to_string())]);
    }

    #[test]
    fn positionals_after_a_flag_are_still_captured() {
        let (_, captures) = matched("/mgid stats /fields:id 123").unwrap();
        assert_eq!(captures, [("campaign_id", "123".to_string())]);

        let (_, captures) = matched("/mgid stats /ie 123 7d").unwrap();
        assert_eq!(captures, [("campaign_id", "123".to_string()), ("time_interval", "7d".to_string())]);

        let (_, captures) = matched("/zp stats --fields id,name 42 --limit 3 30d").unwrap();
        assert_eq!(captures, [("campaign_id", "42".to_string()), ("time_interval", "30d".to_string())]);
    }

    #[test]
    fn stray_tokens_reject_the_line() {
        assert!(matched("/mgid list /ie 123 456").is_none());
        assert!(matched("/mgid stats all 7d /fields:id extra").is_none());
        assert!(matched("/mgid list 123 456").is_none());
        assert!(matched("/mgid listing").is_none());
        assert!(matched("mgid list").is_none());
    }

    #[test]
    fn uuid_identifiers_are_accepted() {
        let (_, captures) = matched("/zp list 0b9f4a5c-1d2e-4f30-8a6b-7c8d9e0f1a2b").unwrap();
        assert_eq!(captures[0].1, "0b9f4a5c-1d2e-4f30-8a6b-7c8d9e0f1a2b");
    }
}
