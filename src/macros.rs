#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

#[macro_export]
macro_rules! grammar {
    (
        name: $name:expr,
        command: $command:expr,
        verbs: [ $($verb:expr),+ $(,)? ],
        positionals: [ $($pos:expr),* $(,)? ]
        $(, flags: $flags:expr)?
        $(,)?
    ) => {{
        $crate::Grammar {
            name: $name,
            command: $command,
            verbs: &[ $($verb),+ ],
            positionals: vec![ $($pos),* ],
            flags: { $crate::engine::FlagSet::empty() $(| $flags)? },
        }
    }};
}
