//! Built-in grammars.
//!
//! - `commands.rs`: the ordered command grammars and conditional defaults.
//! - `flags.rs`: flag grammars, matched in a second pass over the whole line.
//! - `helpers.rs`: interval/date coercions shared with the handlers.

pub(crate) mod commands;
pub(crate) mod flags;
pub(crate) mod helpers;

#[cfg(test)]
mod tests;
