mod backend;
mod commands;
mod context;
mod output;
mod theme;
mod utils;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, Style},
    },
    error::ErrorKind,
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};
use std::fmt::Write;

use commands::{
    COMMAND_EXAMPLES, ExampleGroup,
    init::{InitArgs, handle_init},
    migrate::{MigrateCommands, handle_migrate_commands},
    schema::{SchemaCommands, handle_schema_commands},
};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL, referenced from strata.toml as ${REDIS_URL}"),
    ("RUST_LOG", "Log filter for runner diagnostics (e.g. strata=debug)"),
];

#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(
    about = "Versioned, reversible collection-schema migrations",
    long_about = r#"Versioned, reversible collection-schema migrations.

Each migration is a JSON file holding an ordered list of "up" steps and the
"down" steps that revert them. strata applies pending files in timestamp order
and records each one in a ledger kept next to the schemas.

Commands:
  init      Create strata.toml and the migrations directory
  migrate   Create, apply, revert and inspect migrations
  schema    Show the collections currently in the store
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize strata in the current directory
    Init(InitArgs),

    /// Create, apply and revert migrations
    #[command(subcommand)]
    Migrate(MigrateCommands),

    /// Inspect stored collection schemas
    #[command(subcommand)]
    Schema(SchemaCommands),
}

impl Cli {
    fn parse_with_styles() -> Self {
        let matches = build_cli_command().styles(help_styles()).try_get_matches();
        match matches.and_then(|matches| Cli::from_arg_matches(&matches)) {
            Ok(cli) => cli,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                println!();
                let _ = err.print();
                println!();
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!();
                let _ = err.print();
                eprintln!();
                std::process::exit(err.exit_code());
            }
        }
    }
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .after_long_help(render_appendix(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });

    for (name, groups) in COMMAND_EXAMPLES {
        if let Some(subcommand) = command.find_subcommand_mut(name) {
            *subcommand = subcommand.clone().after_long_help(render_examples(groups, use_color));
        }
    }
    command
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", stylize("Examples:", THEME.highlight, true, use_color));

    for (index, group) in groups.iter().enumerate() {
        let _ = writeln!(buffer, "  {}", stylize(group.title, THEME.primary, true, use_color));
        for command in group.commands {
            let arrow = stylize(ICONS.arrow, THEME.secondary, false, use_color);
            let _ = writeln!(buffer, "    {arrow} {}", stylize(command, THEME.secondary, false, use_color));
        }
        if index + 1 < groups.len() {
            buffer.push('\n');
        }
    }
    buffer
}

fn render_appendix(use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", stylize("Environment Variables:", THEME.highlight, true, use_color));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(
            buffer,
            "  {}  {}",
            stylize(key, THEME.key, true, use_color),
            stylize(description, THEME.value, false, use_color)
        );
    }
    buffer.push('\n');
    let _ = writeln!(
        buffer,
        "{} {}",
        stylize("Tip:", THEME.highlight, true, use_color),
        stylize(
            "Use 'strata <command> --help' to view examples for each command.",
            THEME.secondary,
            false,
            use_color
        )
    );
    buffer
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    match (use_color, bold) {
        (false, _) => text.to_string(),
        (true, true) => text.color(color).bold().to_string(),
        (true, false) => text.color(color).to_string(),
    }
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(style_from_color(theme.primary).bold())
        .header(style_from_color(theme.highlight).bold())
        .literal(style_from_color(theme.secondary))
        .placeholder(style_from_color(theme.muted))
        .valid(style_from_color(theme.success))
        .invalid(style_from_color(theme.warning))
        .error(style_from_color(theme.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    let ansi = match color {
        ThemeColor::Red => AnsiColor::Red,
        ThemeColor::Green => AnsiColor::Green,
        ThemeColor::Yellow => AnsiColor::Yellow,
        ThemeColor::Blue => AnsiColor::Blue,
        ThemeColor::Magenta => AnsiColor::Magenta,
        ThemeColor::Cyan => AnsiColor::Cyan,
        ThemeColor::BrightBlack => AnsiColor::BrightBlack,
        ThemeColor::BrightBlue => AnsiColor::BrightBlue,
        ThemeColor::BrightCyan => AnsiColor::BrightCyan,
        _ => AnsiColor::White,
    };
    Style::new().fg_color(Some(ClapColor::Ansi(ansi)))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    let no_color = cli.no_color;
    if no_color {
        colored::control::set_override(false);
    }

    println!();
    match execute(cli).await {
        Ok(()) => println!(),
        Err(err) => {
            let output = OutputManager::new(GlobalOptions {
                no_color,
                ..Default::default()
            });
            output.error(&format!("{err:#}"));
            println!();
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    match cli.command {
        Commands::Init(args) => handle_init(args, &output).await,
        Commands::Migrate(command) => handle_migrate_commands(command, &output).await,
        Commands::Schema(command) => handle_schema_commands(command, &output).await,
    }
}
