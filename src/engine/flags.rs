//! Flag scanning (second pass).
//!
//! Each flag grammar is run once over the full command line, independently of
//! the grammar that won the first pass. Only flags in the winning grammar's
//! [`FlagSet`] are kept; the rest are logged and dropped.
//!
//! Repeats of one flag are resolved by [`FlagPolicy`].

use regex::Match;
use tracing::debug;

use crate::bag::{Arg, ArgumentBag};
use crate::config::FlagPolicy;
use crate::error::Error;
use crate::{Flag, FlagValue};

use super::grammars::FlagSet;

/// Scan `text` for every flag in `flags` accepted by `allowed`.
pub(crate) fn scan_flags(flags: &[&Flag], allowed: FlagSet, text: &str, policy: FlagPolicy) -> Result<ArgumentBag, Error> {
    let mut bag = ArgumentBag::new();

    for flag in flags {
        let values = occurrences(flag, text);
        if values.is_empty() {
            continue;
        }
        if !allowed.contains(flag.bit) {
            debug!(flag = flag.name, "flag not accepted by this command, ignored");
            continue;
        }
        if values.len() > 1 && policy == FlagPolicy::Reject {
            return Err(Error::InvalidCommandFlag { flag: flag.name, value: format!("repeated {} times", values.len()) });
        }

        let chosen = match policy {
            FlagPolicy::FirstWins => values.into_iter().next(),
            FlagPolicy::LastWins | FlagPolicy::Reject => values.into_iter().last(),
        };
        if let Some(value) = chosen {
            bag.insert(flag.name, value);
        }
    }

    Ok(bag)
}

/// All well-formed occurrences of `flag`, in order. Occurrences whose value
/// cannot be coerced are skipped.
fn occurrences(flag: &Flag, text: &str) -> Vec<Arg> {
    let mut values = Vec::new();
    let mut at = 0;

    while at < text.len() {
        let Some(caps) = flag.pattern.captures_at(text, at) else { break };
        let Some(whole) = caps.get(0) else { break };
        at = resume_after(whole);

        let raw = caps.name("value").map(|m| m.as_str());
        if let Some(value) = coerce(flag.value, raw) {
            values.push(value);
        }
    }

    values
}

/// Where the next search starts after a flag occurrence. The trailing
/// separator doubles as the leading one of an adjacent repeat, and may be
/// wider than one byte.
pub(super) fn resume_after(whole: Match<'_>) -> usize {
    let trailing = whole.as_str().chars().last().filter(|c| c.is_whitespace()).map_or(0, char::len_utf8);
    let at = whole.end() - trailing;
    if at > whole.start() { at } else { whole.end() }
}

fn coerce(kind: FlagValue, raw: Option<&str>) -> Option<Arg> {
    match kind {
        FlagValue::Switch => Some(Arg::Switch),
        FlagValue::Text => Some(Arg::Text(raw?.to_ascii_lowercase())),
        FlagValue::List => {
            let items: Vec<String> = raw?.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
            if items.is_empty() { None } else { Some(Arg::List(items)) }
        }
        FlagValue::Integer => raw?.parse().ok().map(Arg::Integer),
    }
}
