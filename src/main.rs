//! omni-sqlite CLI - drive the extension functions outside the host

use clap::{Parser, Subcommand};
use omni_host::{Outcome, Report, Request};
use omni_sqlite::config::CONFIG_FILE;
use omni_sqlite::{call, install_script, Config, Datum, Registry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "omni-sqlite")]
#[command(about = "Run SQLite commands through the omni_sqlite extension functions", long_about = None)]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Database location, overriding the config (`:memory:` for in-memory)
    #[arg(short, long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one or more commands in order, stopping at the first error
    Exec {
        #[arg(required = true)]
        commands: Vec<String>,
    },

    /// Run a query and print its rows as JSON
    Query {
        /// The query to run
        query: String,
    },

    /// Start interactive REPL mode
    Repl,

    /// Print the extension install script
    InstallScript {
        /// Schema to install into (defaults to the configured schema)
        #[arg(long)]
        schema: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    match cli.command {
        Commands::Exec { commands } => run_exec(&config, &commands),
        Commands::Query { query } => run_query(&config, &query),
        Commands::Repl => run_repl(&config),
        Commands::InstallScript { schema } => {
            let schema = schema.unwrap_or_else(|| config.schema.clone());
            print!("{}", install_script(&schema)?);
            Ok(())
        }
    }
}

/// Open the configured database as a registered session
fn open(config: &Config) -> anyhow::Result<(Registry, Datum)> {
    let mut registry = Registry::with_options(config.open_options());
    let db = request(|| call(&mut registry, "sqlite_open", &[Datum::from(config.database.as_str())]))?;
    Ok((registry, db))
}

/// Run one host request, printing the report if it raised
fn request<F>(f: F) -> anyhow::Result<Datum>
where
    F: FnOnce() -> Result<Datum, omni_host::HostError>,
{
    match Request::call(f) {
        Outcome::Returned(datum) => Ok(datum),
        Outcome::Raised(report) => {
            print_report(&report);
            anyhow::bail!("{}", report.message)
        }
    }
}

fn print_report(report: &Report) {
    eprintln!("{}:  {}", report.severity, report.message);
    if let Some(detail) = &report.detail {
        eprintln!("DETAIL:  {}", detail);
    }
    if let Some(hint) = &report.hint {
        eprintln!("HINT:  {}", hint);
    }
}

fn print_datum(datum: &Datum) {
    match datum {
        Datum::Null => println!("(null)"),
        Datum::Void => {}
        Datum::Text(s) => println!("{}", s),
        Datum::Sqlite(id) => println!("{}", id),
        Datum::Json(value) => match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        },
    }
}

fn run_exec(config: &Config, commands: &[String]) -> anyhow::Result<()> {
    let (mut registry, db) = open(config)?;

    for command in commands {
        let returned = request(|| {
            call(&mut registry, "sqlite_exec", &[db.clone(), Datum::from(command.as_str())])
        })?;
        print_datum(&returned);
    }

    request(|| call(&mut registry, "sqlite_close", &[db.clone()]))?;
    Ok(())
}

fn run_query(config: &Config, query: &str) -> anyhow::Result<()> {
    let (mut registry, db) = open(config)?;
    let rows = request(|| call(&mut registry, "sqlite_query", &[db.clone(), Datum::from(query)]))?;
    print_datum(&rows);
    request(|| call(&mut registry, "sqlite_close", &[db.clone()]))?;
    Ok(())
}

fn run_repl(config: &Config) -> anyhow::Result<()> {
    use std::io::{self, BufRead, Write};

    println!("omni_sqlite interactive shell on {}", config.database);
    println!("Type '\\h' for help, '\\q' to quit.");
    println!();

    let (mut registry, db) = open(config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("sqlite> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (function, text) = match line {
            "exit" | "quit" | "\\q" => break,
            "help" | "\\h" => {
                println!("Commands:");
                println!("  <sql>          - Run with sqlite_exec (rows are discarded)");
                println!("  \\query <sql>   - Run with sqlite_query and print rows");
                println!();
                println!("Special:");
                println!("  \\h  - Show this help");
                println!("  \\q  - Exit the shell");
                continue;
            }
            _ => match line.strip_prefix("\\query") {
                Some(rest) => ("sqlite_query", rest.trim()),
                None => ("sqlite_exec", line),
            },
        };

        match Request::call(|| call(&mut registry, function, &[db.clone(), Datum::from(text)])) {
            Outcome::Returned(datum) => print_datum(&datum),
            Outcome::Raised(report) => print_report(&report),
        }
        println!();
    }

    request(|| call(&mut registry, "sqlite_close", &[db.clone()]))?;
    println!("Goodbye!");
    Ok(())
}
