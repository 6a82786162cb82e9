//! Command engine.
//!
//! This module is the internal entry point used by [`Engine`](crate::Engine).
//! A command line flows through the submodules as a pipeline:
//!
//! ```text
//! rules::commands + rules::flags ──┐
//!                                  │  CompiledGrammars::new       (grammars.rs)
//!                                  └───────────────┬───────────
//!                                                  │
//! text ── match_command ───────────────────────────┤  first pass (matcher.rs)
//!         - head /<platform> <verb>                │
//!         - ordered candidates, positionals        │
//!                                                  v
//!         scan_flags                                  second pass (flags.rs)
//!                                                  │
//!                                                  v
//!         resolve                                     defaults, sentinels, flags (resolve.rs)
//!                                                  │
//!                                                  v
//!         DispatchTable::lookup + expand_aliases      route per platform/verb (dispatch.rs)
//!                                                  │
//!                                                  v
//!                                        (Route, ArgumentBag)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `grammars.rs`: indexes grammars by verb and defines [`FlagSet`].
//! - `matcher.rs`: anchored first pass; picks the winning grammar.
//! - `flags.rs`: unanchored second pass; applies the duplicate-flag policy.
//! - `resolve.rs`: turns captures into an `ArgumentBag` in fixed, pure steps.
//! - `dispatch.rs`: the immutable platform → verb → route table.
//! - `metrics.rs`: per-message timings.
//!
//! ## Adding a command
//!
//! - Add a `Command` variant and a grammar in `rules/commands.rs`.
//! - Add a handler under `handlers/` and register it in `dispatch.rs` for each
//!   platform that supports it.
//! - If it needs a new flag, add a `FlagSet` bit and a grammar in
//!   `rules/flags.rs`.
//!
//! ## Debugging
//!
//! Set `RUST_LOG=adsbot=debug` to trace grammar selection and resolution.

#[path = "engine/dispatch.rs"]
mod dispatch;
#[path = "engine/flags.rs"]
mod flags;
#[path = "engine/grammars.rs"]
mod grammars;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolve.rs"]
mod resolve;

pub(crate) use dispatch::{DispatchTable, Route};
pub(crate) use flags::scan_flags;
pub(crate) use grammars::CompiledGrammars;
pub use grammars::FlagSet;
pub(crate) use matcher::match_command;
pub use metrics::RunMetrics;
pub(crate) use resolve::{expand_aliases, resolve};
