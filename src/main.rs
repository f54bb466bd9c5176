//! Purpose: `flashdeck` CLI entry point.
//! Role: Binary crate root; parses args, runs the server or config check, emits errors on stderr.
//! Invariants: `check` prints one JSON object on stdout and never connects or binds.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: The store connection string is never printed or logged.
//! Invariants: A `.env` file only fills variables the environment does not already set.
use std::io::{self, IsTerminal};
use std::net::{IpAddr, SocketAddr};

use clap::{Args, Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};

mod command_dispatch;
mod serve;

use flashdeck::api::{Error, ErrorKind, to_exit_code};
use flashdeck::store::{DEFAULT_COLLECTION, DEFAULT_DB_NAME, StoreConfig};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    // Must run before parsing so `env = ...` fallbacks see `.env` values.
    dotenv::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `flashdeck --help` for usage."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command)
}

#[derive(Parser)]
#[command(
    name = "flashdeck",
    version,
    about = "Flashcard-set service: JSON CRUD API plus a browser UI",
    long_about = None,
    after_help = r#"EXAMPLES
  $ flashdeck serve --store-uri mongodb://localhost:27017
  $ MONGO_URI=mongodb+srv://user:pw@cluster0.example.net flashdeck serve --port 8080
  $ flashdeck serve --store-uri memory://          # in-process store, data lost on exit
  $ flashdeck check --store-uri memory://          # print resolved config as JSON

ENVIRONMENT
  MONGO_URI, DB_NAME, COLLECTION, BIND, PORT fill in the matching flags.
  A .env file in the working directory (or a parent) is loaded first.
  RUST_LOG controls log verbosity (default: info)."#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Start the HTTP server")]
    Serve(ServeArgs),
    #[command(about = "Validate configuration and print it as JSON without starting")]
    Check(ServeArgs),
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone)]
struct ServeArgs {
    #[arg(
        long,
        env = "MONGO_URI",
        hide_env_values = true,
        value_name = "URI",
        help = "Store connection string (mongodb://, mongodb+srv://, or memory://)",
        help_heading = "Store"
    )]
    store_uri: Option<String>,
    #[arg(
        long,
        env = "DB_NAME",
        default_value = DEFAULT_DB_NAME,
        help = "Database name",
        help_heading = "Store"
    )]
    db_name: String,
    #[arg(
        long,
        env = "COLLECTION",
        default_value = DEFAULT_COLLECTION,
        help = "Collection holding flashcard sets",
        help_heading = "Store"
    )]
    collection: String,
    #[arg(
        long,
        env = "BIND",
        default_value = "127.0.0.1",
        help = "Address to listen on",
        help_heading = "Connection"
    )]
    bind: IpAddr,
    #[arg(
        long,
        env = "PORT",
        default_value_t = 3000,
        help = "Port to listen on",
        help_heading = "Connection"
    )]
    port: u16,
    #[arg(
        long,
        default_value_t = serve::DEFAULT_MAX_BODY_BYTES,
        help = "Max request body size in bytes",
        help_heading = "Safety"
    )]
    max_body_bytes: u64,
}

fn serve_config_from_args(args: ServeArgs) -> Result<serve::ServeConfig, Error> {
    let Some(uri) = args.store_uri.filter(|uri| !uri.trim().is_empty()) else {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("store connection string is required")
            .with_hint("Pass --store-uri or set MONGO_URI (use memory:// for a throwaway store)."));
    };
    Ok(serve::ServeConfig {
        bind: SocketAddr::new(args.bind, args.port),
        store: StoreConfig::new(uri)
            .with_db_name(args.db_name)
            .with_collection(args.collection),
        max_body_bytes: args.max_body_bytes,
    })
}

fn check_report(config: &serve::ServeConfig) -> Result<Value, Error> {
    let backend = serve::validate_config(config)?;
    let base = format!("http://{}", config.bind);
    Ok(json!({
        "bind": config.bind.to_string(),
        "store": {
            "backend": backend.as_str(),
            "db_name": config.store.db_name,
            "collection": config.store.collection,
        },
        "max_body_bytes": config.max_body_bytes,
        "endpoints": {
            "ui": format!("{base}/"),
            "api": format!("{base}{}", flashdeck::ui::API_BASE),
            "health": format!("{base}/healthz"),
        },
    }))
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_json(value: Value) {
    let json = serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = std::error::Error::source(err);
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}
