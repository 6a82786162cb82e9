use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::bag::ArgumentBag;
use crate::config::{ConfigError, Settings};
use crate::engine::{self, CompiledGrammars, DispatchTable, Route, RunMetrics};
use crate::error::Error;
use crate::format::{BLOCK_JOINER, chunk, chunk_text, format_record, format_records, format_value};
use crate::handlers::{Body, Invocation, Outcome};
use crate::platform::Backends;
use crate::project::project;
use crate::record::Record;
use crate::{Command, Flag, Grammar, Platform, rules};

static DEFAULT_GRAMMARS: Lazy<Vec<Grammar>> = Lazy::new(rules::commands::get);
static DEFAULT_FLAGS: Lazy<Vec<Flag>> = Lazy::new(rules::flags::get);

/// Body sent when a command succeeded but produced nothing to show.
pub const EMPTY_RESULTS: &str = "Empty Results for Given Command (Try Widening the Time-Interval for Requested Data)";

/// Execution context.
///
/// This holds environment needed to resolve relative windows (like "7d").
#[derive(Debug, Clone)]
pub struct Context {
    /// Day relative windows end on.
    pub reference_date: NaiveDate,
}

impl Default for Context {
    fn default() -> Self {
        if cfg!(test) {
            Self { reference_date: NaiveDate::from_ymd_opt(2013, 2, 12).unwrap_or_default() }
        } else {
            Self { reference_date: Local::now().date_naive() }
        }
    }
}

/// A command line resolved to a route and its arguments.
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    pub platform: Platform,
    pub command: Command,
    /// Name of the grammar that matched.
    pub grammar: &'static str,
    pub args: ArgumentBag,
    route: Route,
}

/// What goes back to the transport: body and error chunks, each at most
/// `max_message_size` characters unless a single block is larger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub body: Vec<String>,
    pub errors: Vec<String>,
}

impl Response {
    /// Body and errors as one text, errors under an `ERRORS:` header.
    pub fn text(&self) -> String {
        let mut text = self.body.join(BLOCK_JOINER);
        if !self.errors.is_empty() {
            text.push_str("\n\nERRORS:\n");
            text.push_str(&self.errors.join(BLOCK_JOINER));
        }
        text
    }
}

/// Result from [`Engine::handle_message_verbose`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub text: String,
    /// `None` when the line did not resolve.
    pub parsed: Option<ParsedCommand>,
    pub response: Response,
    /// Category of the fatal error, if any.
    pub failure: Option<&'static str>,
    pub metrics: RunMetrics,
}

/// Parses command lines and runs them against a set of backends.
///
/// Grammars and the dispatch table are built once and never change.
pub struct Engine {
    settings: Settings,
    grammars: CompiledGrammars<'static>,
    dispatch: DispatchTable,
    backends: Backends,
}

impl Engine {
    pub fn new(settings: Settings, backends: Backends) -> Result<Self, ConfigError> {
        settings.validate()?;
        let grammars = CompiledGrammars::new(&DEFAULT_GRAMMARS, &DEFAULT_FLAGS, rules::commands::CONDITIONAL_DEFAULTS);
        debug!(verbs = grammars.verbs().count(), "grammars compiled");
        Ok(Engine { settings, grammars, dispatch: DispatchTable::new(), backends })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Commands routed for `platform`.
    pub fn commands(&self, platform: Platform) -> Vec<Command> {
        self.dispatch.commands(platform)
    }

    /// Resolve `text` to a route and a complete argument bag.
    pub fn parse(&self, text: &str) -> Result<ParsedCommand, Error> {
        self.parse_timed(text, &mut RunMetrics::default())
    }

    /// Run a parsed command. Projection (`/fields`), `/limit` and
    /// `/ignore-errors` are applied to the handler's outcome here. A panicking
    /// handler or backend becomes [`Error::Internal`].
    pub fn execute(&self, parsed: &ParsedCommand, context: &Context) -> Result<Outcome, Error> {
        let invocation = Invocation {
            platform: parsed.platform,
            command: parsed.command,
            args: &parsed.args,
            backends: &self.backends,
            settings: &self.settings,
            context,
            route: &parsed.route,
        };
        info!(platform = %parsed.platform, command = %parsed.command, "dispatching");
        let mut outcome = panic::catch_unwind(AssertUnwindSafe(|| (parsed.route.handler)(&invocation)))
            .unwrap_or_else(|payload| Err(Error::Internal(panic_message(payload.as_ref()))))?;

        if let Body::Records(records) = outcome.body {
            let mut records = project(records, parsed.args.list("fields"), false);
            if let Some(limit) = parsed.args.integer("limit") {
                records.truncate(limit.max(0) as usize);
            }
            outcome.body = Body::Records(records);
        }
        if parsed.args.switch("ignore_errors") {
            outcome.errors.clear();
        }
        Ok(outcome)
    }

    /// Parse, run and render one message. Never fails: a fatal error becomes
    /// an error record in the body.
    pub fn handle_message(&self, text: &str, context: &Context) -> Response {
        self.handle_message_verbose(text, context).response
    }

    /// [`Engine::handle_message`] plus the parsed command and timings.
    pub fn handle_message_verbose(&self, text: &str, context: &Context) -> RunReport {
        let started = Instant::now();
        let mut metrics = RunMetrics::default();

        let parsed = self.parse_timed(text, &mut metrics);
        let result = parsed.as_ref().map_err(Error::clone).and_then(|p| {
            let t = Instant::now();
            let outcome = self.execute(p, context);
            metrics.execute = t.elapsed();
            outcome
        });

        let t = Instant::now();
        let failure = result.as_ref().err().map(Error::kind);
        let response = match result {
            Ok(outcome) => self.render(outcome),
            Err(err) => {
                error!(text, kind = err.kind(), error = %err, "command failed");
                self.render_error(&err, text)
            }
        };
        metrics.format = t.elapsed();
        metrics.total = started.elapsed();

        RunReport { text: text.to_string(), parsed: parsed.ok(), response, failure, metrics }
    }

    fn parse_timed(&self, text: &str, metrics: &mut RunMetrics) -> Result<ParsedCommand, Error> {
        let invalid = || Error::InvalidCommand { command: text.trim().to_string() };

        let t = Instant::now();
        let matched = engine::match_command(&self.grammars, &self.settings, text).ok_or_else(invalid)?;
        let flags = engine::scan_flags(&self.grammars.flags, matched.grammar.flags, text, self.settings.flag_policy)?;
        metrics.matching = t.elapsed();

        let t = Instant::now();
        let mut args = engine::resolve(&matched, self.grammars.conditionals, flags, &self.settings);
        let (platform, route) = self.dispatch.lookup(&matched.platform, matched.grammar.command).ok_or_else(invalid)?;
        engine::expand_aliases(route, &mut args)?;
        metrics.resolve = t.elapsed();

        Ok(ParsedCommand { platform, command: matched.grammar.command, grammar: matched.grammar.name, args, route: *route })
    }

    fn render(&self, outcome: Outcome) -> Response {
        let max = self.settings.max_message_size;
        let errors = format_records(&outcome.errors.to_records());

        if outcome.is_empty() && errors.is_empty() {
            return Response { body: vec![EMPTY_RESULTS.to_string()], errors };
        }
        let body = match outcome.body {
            Body::Records(records) => chunk(&format_records(&records), max, BLOCK_JOINER),
            Body::Text(text) if text.trim().is_empty() => Vec::new(),
            Body::Text(text) => chunk_text(&format_value(&Value::String(text)), max),
        };
        Response { body, errors: chunk(&errors, max, BLOCK_JOINER) }
    }

    fn render_error(&self, err: &Error, text: &str) -> Response {
        let record = Record::new()
            .with("Response", "ERROR")
            .with("Type", err.kind())
            .with("message", err.to_string())
            .with("command", text.trim());
        Response { body: chunk(&[format_record(&record)], self.settings.max_message_size, BLOCK_JOINER), errors: Vec::new() }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
