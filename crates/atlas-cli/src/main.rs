mod ui;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use atlas_core::config::AtlasConfig;
use atlas_core::state::{DashState, UiTheme};
use atlas_feed::chat::{ChatAdapter, CommandAssistant, SimulatedAssistant};
use atlas_feed::feed::{CommandFeed, SignalFeed, SimulatedFeed};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

struct CliArgs {
    simulate: bool,
    config_path: Option<PathBuf>,
    theme: Option<String>,
}

fn print_help() {
    println!("atlas - terminal hazard dashboard with an assistant");
    println!();
    println!("Usage: atlas [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --simulate         Use the built-in simulated feed and assistant");
    println!("  --config <path>    Read configuration from <path> instead of the default");
    println!("  --theme <name>     classic | cyberpunk | neon-noir | solar-flare | forest-zen");
    println!("  -h, --help         Print help");
    println!("  -V, --version      Print version");
    println!();
    println!("Default config: <config dir>/atlas/config.toml");
}

fn parse_args() -> Result<Option<CliArgs>, Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut parsed = CliArgs {
        simulate: false,
        config_path: None,
        theme: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--simulate" => parsed.simulate = true,
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--config requires a path".into());
                };
                parsed.config_path = Some(PathBuf::from(value));
                i += 1;
            }
            "--theme" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--theme requires a name".into());
                };
                parsed.theme = Some(value.clone());
                i += 1;
            }
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("atlas {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            other => {
                return Err(format!("unknown argument: {other} (try --help)").into());
            }
        }
        i += 1;
    }
    Ok(Some(parsed))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("atlas").join("config.toml"))
}

fn load_config(explicit: Option<&PathBuf>) -> Result<AtlasConfig, Box<dyn std::error::Error>> {
    let (path, required) = match explicit {
        Some(path) => (path.clone(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(AtlasConfig::default()),
        },
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AtlasConfig::default());
        }
        Err(err) => return Err(format!("cannot read {}: {err}", path.display()).into()),
    };

    toml::from_str(&text).map_err(|err| format!("invalid config {}: {err}", path.display()).into())
}

fn resolve_theme(
    flag: Option<&str>,
    config: &AtlasConfig,
) -> Result<UiTheme, Box<dyn std::error::Error>> {
    if let Some(name) = flag {
        return UiTheme::parse(name).ok_or_else(|| format!("unknown theme: {name}").into());
    }
    // A bad theme name in the config falls back instead of refusing to start.
    Ok(config
        .ui
        .theme
        .as_deref()
        .and_then(UiTheme::parse)
        .unwrap_or(UiTheme::Classic))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let config = load_config(args.config_path.as_ref())?;
    let theme = resolve_theme(args.theme.as_deref(), &config)?;
    let state = DashState::new(theme);

    let feed: Box<dyn SignalFeed> = match (&config.feed.command, args.simulate) {
        (Some(command), false) => Box::new(CommandFeed::from_command_line(command)?),
        _ => Box::new(SimulatedFeed::new()),
    };

    let assistant: Arc<dyn ChatAdapter + Sync> = match (&config.assistant.command, args.simulate) {
        (Some(command), false) => Arc::new(CommandAssistant::from_command_line(
            command,
            config.assistant.model.clone(),
        )?),
        _ => Arc::new(SimulatedAssistant::new()),
    };

    let refresh = Duration::from_secs(config.feed.refresh_secs.max(1));
    ui::run(state, feed, assistant, refresh)
}
