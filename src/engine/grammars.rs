//! Grammar compilation and indexing.
//!
//! This module holds the *static* side of the engine: structures derived once
//! from the full grammar list so that matching a line only looks at grammars
//! that can possibly apply.
//!
//! The index is keyed by verb token. Synonyms (`camps` for `list`) are indexed
//! individually and point at the same grammar id.
//!
//! ## Invariants
//!
//! - `GrammarId` is an index into `CompiledGrammars::grammars`.
//! - Each `by_verb` bucket lists ids in the original list order, which is the
//!   priority order the matcher relies on.

use std::collections::HashMap;

use crate::{ConditionalDefault, Flag, Grammar};

/// Grammar identifier (index into the grammars vector).
pub(crate) type GrammarId = usize;

bitflags::bitflags! {
    /// Flags a grammar accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlagSet: u8 {
        const FIELDS        = 1 << 0;
        const LIMIT         = 1 << 1;
        const DATE_RANGE    = 1 << 2;
        const TIME_RANGE    = 1 << 3;
        const IGNORE_ERRORS = 1 << 4;
        const LIST_FIELDS   = 1 << 5;

        /// Accepted by every command.
        const COMMON = Self::FIELDS.bits() | Self::LIMIT.bits() | Self::IGNORE_ERRORS.bits() | Self::LIST_FIELDS.bits();
        /// Accepted by commands that read a time window.
        const WINDOWED = Self::COMMON.bits() | Self::DATE_RANGE.bits() | Self::TIME_RANGE.bits();
    }
}

#[derive(Default, Debug)]
pub struct GrammarIndex {
    pub by_verb: HashMap<&'static str, Vec<GrammarId>>,
}

/// Pre-compiled grammar set.
#[derive(Debug)]
pub struct CompiledGrammars<'a> {
    pub grammars: Vec<&'a Grammar>,
    pub flags: Vec<&'a Flag>,
    pub conditionals: &'a [ConditionalDefault],
    pub index: GrammarIndex,
}

impl<'a> CompiledGrammars<'a> {
    pub fn new(grammars: &'a [Grammar], flags: &'a [Flag], conditionals: &'a [ConditionalDefault]) -> Self {
        let mut index = GrammarIndex::default();
        for (id, grammar) in grammars.iter().enumerate() {
            for verb in grammar.verbs {
                index.by_verb.entry(*verb).or_default().push(id);
            }
        }

        CompiledGrammars { grammars: grammars.iter().collect(), flags: flags.iter().collect(), conditionals, index }
    }

    /// Grammars registered for `verb`, in priority order. `verb` must already
    /// be lower-cased.
    pub fn candidates(&self, verb: &str) -> impl Iterator<Item = &'a Grammar> + '_ {
        self.index.by_verb.get(verb).into_iter().flatten().map(|id| self.grammars[*id])
    }

    pub fn verbs(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.grammars.iter().flat_map(|g| g.verbs.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;

    #[test]
    fn synonyms_share_a_grammar() {
        let grammars = rules::commands::get();
        let flags = rules::flags::get();
        let compiled = CompiledGrammars::new(&grammars, &flags, rules::commands::CONDITIONAL_DEFAULTS);

        let list: Vec<_> = compiled.candidates("list").map(|g| g.name).collect();
        let camps: Vec<_> = compiled.candidates("camps").map(|g| g.name).collect();
        assert_eq!(list, camps);
        assert_eq!(list, ["list campaigns"]);
        assert_eq!(compiled.candidates("bogus-verb").count(), 0);
    }

    #[test]
    fn every_verb_is_unique_to_one_canonical_command() {
        let grammars = rules::commands::get();
        let flags = rules::flags::get();
        let compiled = CompiledGrammars::new(&grammars, &flags, &[]);

        for verb in compiled.verbs() {
            let commands: Vec<_> = compiled.candidates(verb).map(|g| g.command).collect();
            assert!(commands.windows(2).all(|w| w[0] == w[1]), "{verb} maps to {commands:?}");
        }
    }

    #[test]
    fn windowed_is_a_superset_of_common() {
        assert!(FlagSet::WINDOWED.contains(FlagSet::COMMON));
        assert!(!FlagSet::COMMON.contains(FlagSet::TIME_RANGE));
    }
}
