//! Flag grammars.
//!
//! Every pattern is unanchored and requires the flag marker (`/` or `--`) to
//! start a token. Values follow a `:` or whitespace. A value that does not fit
//! its pattern leaves the flag unmatched, which downstream means "absent".

use crate::engine::FlagSet;
use crate::{Flag, FlagValue};

pub(crate) fn get() -> Vec<Flag> {
    vec![
        Flag {
            name: "fields",
            bit: FlagSet::FIELDS,
            pattern: regex!(r"(?i)(?:^|\s)(?:/|--)fields(?::|\s+)(?P<value>[a-z0-9_.,-]+)(?:\s|$)"),
            value: FlagValue::List,
        },
        Flag {
            name: "limit",
            bit: FlagSet::LIMIT,
            pattern: regex!(r"(?i)(?:^|\s)(?:/|--)limit(?::|\s+)(?P<value>\d+)(?:\s|$)"),
            value: FlagValue::Integer,
        },
        Flag {
            name: "date_range",
            bit: FlagSet::DATE_RANGE,
            pattern: regex!(
                r"(?i)(?:^|\s)(?:/|--)(?:date_range|date)(?::|\s+)(?P<value>\d{4}-\d{2}-\d{2}(?:-\d{4}-\d{2}-\d{2})?)(?:\s|$)"
            ),
            value: FlagValue::Text,
        },
        Flag {
            name: "time_range",
            bit: FlagSet::TIME_RANGE,
            pattern: regex!(
                r"(?i)(?:^|\s)(?:/|--)(?:time_range|time|date_interval)(?::|\s+)(?P<value>\d+[dwmy]|[a-z]+)(?:\s|$)"
            ),
            value: FlagValue::Text,
        },
        Flag {
            name: "ignore_errors",
            bit: FlagSet::IGNORE_ERRORS,
            pattern: regex!(r"(?i)(?:^|\s)(?:/|--)(?:ignore-errors|ignore_errors|ie)(?:\s|$)"),
            value: FlagValue::Switch,
        },
        Flag {
            name: "list_fields",
            bit: FlagSet::LIST_FIELDS,
            pattern: regex!(r"(?i)(?:^|\s)(?:/|--)(?:list-fields|list_fields)(?:\s|$)"),
            value: FlagValue::Switch,
        },
    ]
}
