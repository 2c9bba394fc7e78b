pub mod init;
pub mod migrate;
pub mod schema;

/// A titled block of sample invocations shown under a command's `--help`.
#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

/// Subcommand name paired with its help examples.
pub const COMMAND_EXAMPLES: &[(&str, &[ExampleGroup])] = &[
    ("init", init::EXAMPLES),
    ("migrate", migrate::EXAMPLES),
    ("schema", schema::EXAMPLES),
];
