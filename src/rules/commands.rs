//! Command grammars.
//!
//! Order matters: the matcher tries grammars sharing a verb in list order and
//! the first one whose positional structure fits wins. Verbs are compared as
//! whole tokens, so `widgets-kill-bot` can never be shadowed by `widgets`, but
//! the list is still kept longest-verb-first.
//!
//! ```text
//! /mgid widgets-top 1023198 10 7d
//!       ^^^^^^^^^^^ ^^^^^^^ ^^ ^^
//!       verb        id      |  time_interval (defaulted)
//!                           filter_limit (optional, conditional default)
//! ```

use crate::engine::FlagSet;
use crate::{Command, ConditionalDefault, FieldKind, Grammar, Positional, SettingKey};

use FieldKind::{Identifier, Interval, Limit, Threshold};

const CAMPAIGN: Positional = Positional::required("campaign_id", Identifier);
const ANY_CAMPAIGN: Positional = Positional::optional("campaign_id", Identifier);
const INTERVAL: Positional = Positional::defaulted("time_interval", Interval, SettingKey::DefaultTimeInterval);

/// Defaults that only apply to some verbs of a shared field.
pub(crate) static CONDITIONAL_DEFAULTS: &[ConditionalDefault] = &[
    ConditionalDefault {
        field: "threshold",
        setting: SettingKey::LowCpaThreshold,
        commands: &["widgets-low-cpa"],
    },
    ConditionalDefault {
        field: "filter_limit",
        setting: SettingKey::DefaultFilterNumber,
        commands: &["widgets-top", "top-widgets"],
    },
];

pub(crate) fn get() -> Vec<Grammar> {
    vec![
        grammar! {
            name: "widgets turn on all",
            command: Command::WidgetsTurnOnAll,
            verbs: ["widgets-turn-on-all"],
            positionals: [CAMPAIGN],
            flags: FlagSet::COMMON,
        },
        grammar! {
            name: "widgets kill longtail",
            command: Command::WidgetsKillLongtail,
            verbs: ["widgets-kill-longtail"],
            positionals: [CAMPAIGN, Positional::required("threshold", Threshold), INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "widgets kill bot",
            command: Command::WidgetsKillBot,
            verbs: ["widgets-kill-bot"],
            positionals: [CAMPAIGN, Positional::required("threshold", Threshold), INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "widgets high cpa",
            command: Command::WidgetsHighCpa,
            verbs: ["widgets-high-cpa"],
            positionals: [CAMPAIGN, Positional::required("threshold", Threshold), INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "widgets low cpa",
            command: Command::WidgetsLowCpa,
            verbs: ["widgets-low-cpa"],
            positionals: [CAMPAIGN, Positional::optional("threshold", Threshold), INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "widgets stats",
            command: Command::WidgetsStats,
            verbs: ["widgets-stats"],
            positionals: [CAMPAIGN, Positional::optional("widget_id", Identifier), INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "widgets top",
            command: Command::WidgetsTop,
            verbs: ["widgets-top", "top-widgets"],
            positionals: [CAMPAIGN, Positional::optional("filter_limit", Limit), INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "campaign bot traffic",
            command: Command::BotTraffic,
            verbs: ["bot-traffic"],
            positionals: [ANY_CAMPAIGN, INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "traffic sources",
            command: Command::Sources,
            verbs: ["sources"],
            positionals: [INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "campaign stats",
            command: Command::Stats,
            verbs: ["stats"],
            positionals: [ANY_CAMPAIGN, INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "campaign spent",
            command: Command::Spent,
            verbs: ["spent"],
            positionals: [ANY_CAMPAIGN, INTERVAL],
            flags: FlagSet::WINDOWED,
        },
        grammar! {
            name: "list campaigns",
            command: Command::List,
            verbs: ["list", "camps"],
            positionals: [ANY_CAMPAIGN],
            flags: FlagSet::COMMON,
        },
    ]
}
