//! Command dispatch.
//!
//! A nested, immutable table `platform -> command -> route`, built once per
//! [`Engine`](crate::Engine) and only ever read afterwards. A route pairs the
//! handler with the argument aliases the handler expects.

use std::collections::HashMap;
use std::fmt;

use crate::bag::Arg;
use crate::error::Error;
use crate::handlers::{self, Invocation, Outcome};
use crate::rules::helpers::{as_text, mgid_date_interval, zeropark_interval};
use crate::{Command, Platform};

pub(crate) type Handler = fn(&Invocation<'_>) -> Result<Outcome, Error>;

/// Copies the first present `sources` argument, transformed, to `name`.
pub(crate) struct Alias {
    pub name: &'static str,
    pub sources: &'static [&'static str],
    pub transform: fn(&Arg) -> Result<Arg, Error>,
}

#[derive(Clone, Copy)]
pub(crate) struct Route {
    pub handler: Handler,
    pub aliases: &'static [Alias],
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alias").field("name", &self.name).field("sources", &self.sources).finish()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("aliases", &self.aliases).finish_non_exhaustive()
    }
}

/// Argument names that can carry the requested time window, by precedence.
const WINDOW_SOURCES: &[&str] = &["time_range", "time_interval"];

static MGID_ALIASES: &[Alias] = &[Alias { name: "date_interval", sources: WINDOW_SOURCES, transform: mgid_date_interval }];
static ZEROPARK_ALIASES: &[Alias] = &[Alias { name: "interval", sources: WINDOW_SOURCES, transform: zeropark_interval }];
static THRIVE_ALIASES: &[Alias] = &[Alias { name: "time_range", sources: &["time_interval"], transform: as_text }];

#[derive(Debug)]
pub(crate) struct DispatchTable {
    routes: HashMap<Platform, HashMap<Command, Route>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        let mut routes = HashMap::new();
        routes.insert(Platform::Mgid, network_routes(MGID_ALIASES));
        routes.insert(Platform::Zeropark, network_routes(ZEROPARK_ALIASES));
        routes.insert(Platform::Thrive, tracker_routes());
        DispatchTable { routes }
    }

    /// Resolve a platform token (aliases included) and a command to a route.
    pub fn lookup(&self, platform: &str, command: Command) -> Option<(Platform, &Route)> {
        let platform = Platform::from_token(platform)?;
        let route = self.routes.get(&platform)?.get(&command)?;
        Some((platform, route))
    }

    pub fn commands(&self, platform: Platform) -> Vec<Command> {
        let mut commands: Vec<Command> = self.routes.get(&platform).into_iter().flat_map(|r| r.keys().copied()).collect();
        commands.sort();
        commands
    }
}

fn network_routes(aliases: &'static [Alias]) -> HashMap<Command, Route> {
    use handlers::{campaigns, widgets};

    let table: [(Command, Handler); 11] = [
        (Command::List, campaigns::list),
        (Command::Stats, campaigns::stats),
        (Command::Spent, campaigns::spent),
        (Command::BotTraffic, campaigns::bot_traffic),
        (Command::WidgetsTop, widgets::top),
        (Command::WidgetsStats, widgets::stats),
        (Command::WidgetsHighCpa, widgets::high_cpa),
        (Command::WidgetsLowCpa, widgets::low_cpa),
        (Command::WidgetsKillLongtail, widgets::kill_longtail),
        (Command::WidgetsKillBot, widgets::kill_bot),
        (Command::WidgetsTurnOnAll, widgets::turn_on_all),
    ];
    table.into_iter().map(|(command, handler)| (command, Route { handler, aliases })).collect()
}

fn tracker_routes() -> HashMap<Command, Route> {
    use handlers::tracker;

    let table: [(Command, Handler); 3] =
        [(Command::List, tracker::list), (Command::Sources, tracker::sources), (Command::Stats, tracker::stats)];
    table.into_iter().map(|(command, handler)| (command, Route { handler, aliases: THRIVE_ALIASES })).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_aliases_resolve_before_lookup() {
        let table = DispatchTable::new();
        let (platform, _) = table.lookup("zp", Command::Stats).unwrap();
        assert_eq!(platform, Platform::Zeropark);
        let (platform, _) = table.lookup("TRACKER", Command::Sources).unwrap();
        assert_eq!(platform, Platform::Thrive);
    }

    #[test]
    fn missing_pairs_have_no_route() {
        let table = DispatchTable::new();
        assert!(table.lookup("thrive", Command::WidgetsTop).is_none());
        assert!(table.lookup("mgid", Command::Sources).is_none());
        assert!(table.lookup("facebook", Command::List).is_none());
    }

    #[test]
    fn tracker_serves_list_sources_and_stats() {
        let table = DispatchTable::new();
        assert_eq!(table.commands(Platform::Thrive), [Command::List, Command::Stats, Command::Sources]);
        assert_eq!(table.commands(Platform::Mgid).len(), 11);
    }
}
