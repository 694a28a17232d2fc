use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use tether::{Params, Registry, SearchPath, iter_plugins, plugin_value};

const GREETERS: &str = "tether.greeters";
type Greeter = fn(&str) -> String;

/// Load Tether plugins and show what they registered
#[derive(Parser)]
#[command(name = "tether-host", version, about)]
struct Cli {
    /// Plugin files or directories to load [default: $TETHER_PLUGIN_PATH, else the plugins dir]
    paths: Vec<PathBuf>,

    /// Initializer parameter as key=value (value parsed as JSON, else string)
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,

    /// Greet this name with every registered greeter
    #[arg(long)]
    greet: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_param(s: &str) -> Result<(String, Value), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    let value = serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_owned()));
    Ok((k.to_owned(), value))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,tether=info",
        1 => "info,tether=debug",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(failed) if failed == 0 => ExitCode::SUCCESS,
        Ok(failed) => {
            tracing::error!("{failed} plugin(s) failed to load");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<usize> {
    let registry = tether::registry();
    register_builtins(&registry);

    let params: Params = cli.params.into_iter().collect();
    let search = search_path(cli.paths);

    let outcomes = registry.load_search_path(&search, &params)?;
    let mut failed = 0;
    for (path, res) in &outcomes {
        if let Err(e) = res {
            failed += 1;
            eprintln!("{}: {e}", path.display());
        }
    }

    if let Some(who) = cli.greet.as_deref() {
        greet_all(&registry, who);
    }

    println!("{}", serde_json::to_string_pretty(&registry.snapshot())?);
    Ok(failed)
}

/// Explicit paths win; otherwise the OS path list in `TETHER_PLUGIN_PATH`.
fn search_path(paths: Vec<PathBuf>) -> SearchPath {
    if paths.is_empty() {
        SearchPath::from_env()
    } else {
        SearchPath::new(paths)
    }
}

fn plain(who: &str) -> String {
    format!("Hi, {who}")
}

fn register_builtins(registry: &Registry) {
    registry.register(
        GREETERS,
        "plain",
        plugin_value(plain as Greeter),
        [
            tether::name("Built-in greeter"),
            tether::version(env!("CARGO_PKG_VERSION")),
            tether::api_version(1),
        ],
    );
}

fn greet_all(registry: &Registry, who: &str) {
    let Some(ns) = registry.get(GREETERS, false) else {
        return;
    };
    for key in ns.keys() {
        let Some(all) = ns.get_all(&key) else { continue };
        for meta in iter_plugins(all) {
            match meta.plugin_as::<Greeter>() {
                Some(greet) if meta.api_version == 1 => println!("[{key}] {}", greet(who)),
                _ => tracing::warn!(key = %key, filename = %meta.filename, "skipping greeter with unexpected shape"),
            }
        }
    }
}
