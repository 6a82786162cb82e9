//! Argument resolution.
//!
//! A matched command becomes an [`ArgumentBag`] through a fixed sequence of
//! pure steps. Each step only adds what is missing; none overwrites a value an
//! earlier step produced.
//!
//! ```text
//! MatchedCommand
//!   │ 1. capture_fields        platform, command, positionals (coerced)
//!   │ 2. static_defaults       e.g. time_interval <- default_time_interval
//!   │ 3. conditional_defaults  e.g. threshold <- low_cpa_threshold (low-cpa only)
//!   │ 4. substitute_sentinels  "all" -> Arg::None, missing identifiers -> Arg::None
//!   │ 5. merge_flags           second-pass flags, additive
//!   v
//! ArgumentBag ── dispatch ──▶ 6. expand_aliases (per route)
//! ```

use tracing::debug;

use crate::bag::{Arg, ArgumentBag};
use crate::config::Settings;
use crate::error::Error;
use crate::{ConditionalDefault, FieldKind};

use super::dispatch::Route;
use super::matcher::{Capture, MatchedCommand};

pub(crate) fn resolve(
    matched: &MatchedCommand<'_>,
    conditionals: &[ConditionalDefault],
    flags: ArgumentBag,
    settings: &Settings,
) -> ArgumentBag {
    let mut bag = capture_fields(matched);
    static_defaults(matched, settings, &mut bag);
    conditional_defaults(conditionals, settings, &mut bag);
    substitute_sentinels(matched, settings, &mut bag);
    merge_flags(&mut bag, flags);
    debug!(grammar = matched.grammar.name, args = bag.len(), "arguments resolved");
    bag
}

fn capture_fields(matched: &MatchedCommand<'_>) -> ArgumentBag {
    let mut bag = ArgumentBag::new();
    bag.insert("platform", Arg::Text(matched.platform.clone()));
    bag.insert("command", Arg::Text(matched.command.clone()));
    for capture in &matched.captures {
        bag.insert(capture.name, coerce(capture));
    }
    bag
}

fn coerce(capture: &Capture) -> Arg {
    let raw = capture.raw.as_str();
    match capture.kind {
        FieldKind::Identifier => Arg::Text(raw.to_string()),
        FieldKind::Interval => Arg::Text(raw.to_ascii_lowercase()),
        FieldKind::Threshold => raw.parse().map(Arg::Number).unwrap_or_else(|_| Arg::Text(raw.to_string())),
        FieldKind::Limit => raw.parse().map(Arg::Integer).unwrap_or_else(|_| Arg::Text(raw.to_string())),
    }
}

fn static_defaults(matched: &MatchedCommand<'_>, settings: &Settings, bag: &mut ArgumentBag) {
    for slot in &matched.grammar.positionals {
        let Some(key) = slot.default else { continue };
        if bag.is_absent(slot.name) {
            bag.insert(slot.name, settings.value_for(key));
        }
    }
}

fn conditional_defaults(conditionals: &[ConditionalDefault], settings: &Settings, bag: &mut ArgumentBag) {
    let Some(command) = bag.text("command").map(str::to_string) else { return };
    for rule in conditionals {
        if rule.commands.iter().any(|c| c.eq_ignore_ascii_case(&command)) && bag.is_absent(rule.field) {
            bag.insert(rule.field, settings.value_for(rule.setting));
        }
    }
}

fn substitute_sentinels(matched: &MatchedCommand<'_>, settings: &Settings, bag: &mut ArgumentBag) {
    for slot in &matched.grammar.positionals {
        if slot.kind != FieldKind::Identifier {
            continue;
        }
        let is_sentinel = bag.text(slot.name).is_some_and(|v| v.eq_ignore_ascii_case(&settings.all_alias));
        if is_sentinel || bag.is_absent(slot.name) {
            bag.insert(slot.name, Arg::None);
        }
    }
}

fn merge_flags(bag: &mut ArgumentBag, flags: ArgumentBag) {
    for (name, value) in flags.iter() {
        if !bag.insert_if_absent(name, value.clone()) {
            debug!(flag = name, "flag shadowed by a positional value");
        }
    }
}

/// Copy route aliases into the bag. The first present source is transformed
/// and stored under the alias name, unless that name is already set.
pub(crate) fn expand_aliases(route: &Route, bag: &mut ArgumentBag) -> Result<(), Error> {
    for alias in route.aliases {
        if !bag.is_absent(alias.name) {
            continue;
        }
        let source = alias.sources.iter().find_map(|s| bag.get(s).filter(|v| !v.is_empty() && **v != Arg::None));
        if let Some(value) = source {
            let value = (alias.transform)(value)?;
            bag.insert(alias.name, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammars::CompiledGrammars;
    use crate::engine::matcher::match_command;
    use crate::rules;

    fn resolve_text(text: &str, settings: &Settings) -> Option<ArgumentBag> {
        let grammars = rules::commands::get();
        let flags = rules::flags::get();
        let compiled = CompiledGrammars::new(&grammars, &flags, rules::commands::CONDITIONAL_DEFAULTS);
        let matched = match_command(&compiled, settings, text)?;
        let flag_bag =
            super::super::flags::scan_flags(&compiled.flags, matched.grammar.flags, text, settings.flag_policy).ok()?;
        Some(resolve(&matched, compiled.conditionals, flag_bag, settings))
    }

    #[test]
    fn static_default_fills_missing_interval() {
        let bag = resolve_text("/mgid stats 123", &Settings::default()).unwrap();
        assert_eq!(bag.text("time_interval"), Some("360d"));
        assert_eq!(bag.text("campaign_id"), Some("123"));
    }

    #[test]
    fn conditional_default_only_applies_to_listed_commands() {
        let settings = Settings::default();
        let low = resolve_text("/mgid widgets-low-cpa 123", &settings).unwrap();
        assert_eq!(low.number("threshold"), Some(5.0));

        let top = resolve_text("/mgid top-widgets 123", &settings).unwrap();
        assert_eq!(top.integer("filter_limit"), Some(5));
        assert!(!top.contains("threshold"));

        let explicit = resolve_text("/mgid widgets-low-cpa 123 2.5", &settings).unwrap();
        assert_eq!(explicit.number("threshold"), Some(2.5));
    }

    #[test]
    fn all_alias_and_missing_identifiers_become_none() {
        let settings = Settings { all_alias: "every".into(), ..Settings::default() };
        let bag = resolve_text("/zp stats EVERY 7d", &settings).unwrap();
        assert!(bag.is_none("campaign_id"));

        let bag = resolve_text("/zp stats 7d", &settings).unwrap();
        assert!(bag.is_none("campaign_id"));
    }

    #[test]
    fn flags_never_overwrite_positionals() {
        let bag = resolve_text("/mgid stats 1 7d /time:30d", &Settings::default()).unwrap();
        assert_eq!(bag.text("time_interval"), Some("7d"));
        assert_eq!(bag.text("time_range"), Some("30d"));
    }
}
