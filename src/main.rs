mod report;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use adsbot::{Context, Engine, Fixtures, Platform, Settings};
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(LevelFilter::WARN.into()).from_env_lossy())
        .with_writer(io::stderr)
        .with_ansi(config.color)
        .init();

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let ctx = match config.reference_date {
        Some(reference_date) => Context { reference_date },
        None => Context::default(),
    };
    let report = engine.handle_message_verbose(&config.input, &ctx);
    if config.plain {
        println!("{}", report.response.text());
    } else {
        report::print_run(&report, config.color);
    }
}

struct CliConfig {
    input: String,
    settings: Option<PathBuf>,
    fixtures: Option<PathBuf>,
    reference_date: Option<NaiveDate>,
    color: bool,
    plain: bool,
}

fn build_engine(config: &CliConfig) -> Result<Engine, String> {
    let settings = Settings::load_or_default(config.settings.as_deref()).map_err(|err| err.to_string())?;
    let fixtures = match &config.fixtures {
        Some(path) => Fixtures::load(path).map_err(|err| err.to_string())?,
        None => Fixtures::default(),
    };
    Engine::new(settings, fixtures.into_backends()).map_err(|err| err.to_string())
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut settings = None;
    let mut fixtures = None;
    let mut reference_date = None;
    let mut color = io::stdout().is_terminal();
    let mut plain = false;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("adsbot {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--commands" => {
                print_commands()?;
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--plain" => plain = true,
            "--reference" => {
                let value = args.next().ok_or_else(|| "error: --reference expects a value".to_string())?;
                reference_date = Some(parse_reference(&value)?);
            }
            "--config" => {
                let value = args.next().ok_or_else(|| "error: --config expects a path".to_string())?;
                settings = Some(PathBuf::from(value));
            }
            "--fixtures" => {
                let value = args.next().ok_or_else(|| "error: --fixtures expects a path".to_string())?;
                fixtures = Some(PathBuf::from(value));
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--reference=") => {
                reference_date = Some(parse_reference(arg.trim_start_matches("--reference="))?);
            }
            _ if arg.starts_with("--config=") => {
                settings = Some(PathBuf::from(arg.trim_start_matches("--config=")));
            }
            _ if arg.starts_with("--fixtures=") => {
                fixtures = Some(PathBuf::from(arg.trim_start_matches("--fixtures=")));
            }
            _ if arg.starts_with("--input=") => {
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(arg.trim_start_matches("--input=").to_string());
            }
            // Commands start with `/`, so only `--x` and `-x` are options here.
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, settings, fixtures, reference_date, color, plain })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_reference(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("error: invalid --reference '{value}' (expected YYYY-MM-DD)"))
}

fn print_commands() -> Result<(), String> {
    let engine = Engine::new(Settings::default(), Fixtures::default().into_backends()).map_err(|err| err.to_string())?;
    for platform in Platform::ALL {
        let commands: Vec<&str> = engine.commands(platform).into_iter().map(|c| c.name()).collect();
        println!("{:<10} {}", platform.name(), commands.join(", "));
    }
    Ok(())
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "adsbot {version}

Run one ad-platform command against fixture backends.

Usage:
  adsbot [OPTIONS] [--] <command...>
  adsbot [OPTIONS] --input <text>

Example:
  adsbot --fixtures fixtures.json -- /mgid stats all 7d /fields:id,name,spent

Options:
  -i, --input <text>         Command line to run. If omitted, reads remaining args
                             or stdin when no args are provided.
  --config <path>            Settings TOML. Default: $ADSBOT_CONFIG, else built-in.
  --fixtures <path>          Backend fixtures JSON. Default: no ad networks and an
                             empty tracker.
  --reference <date>         Day relative windows end on, YYYY-MM-DD.
                             Default: today.
  --plain                    Print only the response text.
  --commands                 List the commands each platform supports.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   Log filter for stderr diagnostics. Default: warn.

Exit codes:
  0  Success (command errors are part of the response).
  1  Settings or fixtures could not be loaded.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION")
    )
}
