extern crate self as adsbot;

use std::fmt;

use regex::Regex;
use serde::Serialize;

#[macro_use]
mod macros;
mod api;
mod bag;
mod config;
mod engine;
mod error;
mod format;
mod handlers;
mod platform;
mod project;
mod reconcile;
mod record;
mod rules;

pub use api::{Context, EMPTY_RESULTS, Engine, ParsedCommand, Response, RunReport};
pub use bag::{Arg, ArgumentBag};
pub use config::{ConfigError, FlagPolicy, Settings};
pub use engine::RunMetrics;
pub use error::{Error, ErrorEntry, ErrorList, PlatformError};
pub use format::{BLOCK_JOINER, chunk, chunk_text, format_record, format_records, format_value};
pub use handlers::{Body, Outcome};
pub use platform::memory::{FixtureError, Fixtures, MemoryNetwork, MemoryTracker, NetworkFixture, TrackerFixture};
pub use platform::{AdNetwork, Backends, TimeWindow, Tracker};
pub use project::project;
pub use reconcile::{JoinMode, KeyMerge, Reconciled, join_key, merge_by_key, merge_tracker_stats};
pub use record::{MergedRecord, Record};

use crate::engine::FlagSet;

// --- Platforms and verbs ----------------------------------------------------

/// A backend a command can be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mgid,
    Zeropark,
    Thrive,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Mgid, Platform::Zeropark, Platform::Thrive];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Mgid => "mgid",
            Platform::Zeropark => "zeropark",
            Platform::Thrive => "thrive",
        }
    }

    /// Resolve the platform token of a command line, including short aliases
    /// (`mg`, `zp`, `tracker`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "mgid" | "mg" => Some(Platform::Mgid),
            "zeropark" | "zp" => Some(Platform::Zeropark),
            "thrive" | "tracker" => Some(Platform::Thrive),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical command verbs. Synonyms live on the grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    List,
    Stats,
    Spent,
    BotTraffic,
    Sources,
    WidgetsTop,
    WidgetsStats,
    WidgetsHighCpa,
    WidgetsLowCpa,
    WidgetsKillLongtail,
    WidgetsKillBot,
    WidgetsTurnOnAll,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Stats => "stats",
            Command::Spent => "spent",
            Command::BotTraffic => "bot-traffic",
            Command::Sources => "sources",
            Command::WidgetsTop => "widgets-top",
            Command::WidgetsStats => "widgets-stats",
            Command::WidgetsHighCpa => "widgets-high-cpa",
            Command::WidgetsLowCpa => "widgets-low-cpa",
            Command::WidgetsKillLongtail => "widgets-kill-longtail",
            Command::WidgetsKillBot => "widgets-kill-bot",
            Command::WidgetsTurnOnAll => "widgets-turn-on-all",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- Grammar definitions -----------------------------------------------------

/// How a positional token is recognised and coerced into an [`Arg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    /// Decimal integer, UUID, or the configured "all" sentinel.
    Identifier,
    /// `<N><unit>` (unit in d/w/m/y) or a bare keyword such as `today`.
    Interval,
    /// Integer or decimal.
    Threshold,
    /// Integer.
    Limit,
}

/// Names a configured value a positional can fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingKey {
    DefaultTimeInterval,
    LowCpaThreshold,
    DefaultFilterNumber,
}

/// One positional slot of a grammar.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Positional {
    pub name: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
    /// Static default, applied whenever the slot was not captured.
    pub default: Option<SettingKey>,
}

impl Positional {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Positional { name, kind, optional: false, default: None }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Positional { name, kind, optional: true, default: None }
    }

    pub const fn defaulted(name: &'static str, kind: FieldKind, default: SettingKey) -> Self {
        Positional { name, kind, optional: true, default: Some(default) }
    }
}

/// A command grammar: a verb (plus synonyms), an ordered list of positional
/// slots, and the set of flags that may accompany it.
///
/// ```text
/// /<platform> <verb> [positional ...] [/flag[:value] ...]
///              ^^^^^  ^^^^^^^^^^^^^^^^  ^^^^^^^^^^^^^^^^^
///              verbs  positionals       flags (second pass)
/// ```
pub(crate) struct Grammar {
    pub name: &'static str,
    pub command: Command,
    pub verbs: &'static [&'static str],
    pub positionals: Vec<Positional>,
    pub flags: FlagSet,
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("verbs", &self.verbs)
            .field("positionals", &self.positionals.iter().map(|p| p.name).collect::<Vec<_>>())
            .field("flags", &self.flags)
            .finish()
    }
}

/// A default that only applies when the resolved `command` is one of
/// `commands`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConditionalDefault {
    pub field: &'static str,
    pub setting: SettingKey,
    pub commands: &'static [&'static str],
}

/// How a flag's captured value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlagValue {
    /// Presence only.
    Switch,
    /// Lower-cased single token.
    Text,
    /// Comma-separated list, empty items dropped.
    List,
    /// Signed integer.
    Integer,
}

/// An optional, order-independent modifier matched by an unanchored search
/// over the whole command line.
pub(crate) struct Flag {
    /// Key the value is stored under in the [`ArgumentBag`].
    pub name: &'static str,
    pub bit: FlagSet,
    /// Regex with an optional `value` capture group.
    pub pattern: &'static Regex,
    pub value: FlagValue,
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("bit", &self.bit)
            .field("pattern", &self.pattern.as_str())
            .field("value", &self.value)
            .finish()
    }
}
