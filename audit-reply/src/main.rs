use anyhow::{Context, Result, bail};
use audit_reply::generator::PROGRAM_NAME;
use audit_reply::{
    AppConfig, HistoryItem, HistoryStore, Intensity, ReplyGenerator, ResponseTriple,
    normalize,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use llm_client::{Config, ModelPreset};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncReadExt;

#[derive(Parser, Debug)]
#[command(
    name = "audit-reply",
    about = "Draft replies to an audited party's statement",
    long_about = "Generates three auditor replies in different styles at a chosen tone intensity (1 = gentle, 10 = forceful)"
)]
#[command(version)]
struct Args {
    /// What the audited party said ("-" reads it from stdin)
    message: Option<String>,

    /// Tone intensity from 1 to 10 (defaults to the configured value)
    #[arg(short, long)]
    intensity: Option<Intensity>,

    /// Model preset to use (overrides default from config)
    #[arg(short, long)]
    model: Option<String>,

    /// Wait for the whole completion instead of streaming it
    #[arg(long)]
    no_stream: bool,

    /// Don't record this generation in history
    #[arg(long)]
    no_history: bool,

    /// Enable debug mode for verbose output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize raw model output from a file or stdin without calling a model
    Parse {
        /// File holding the raw completion (defaults to stdin)
        file: Option<PathBuf>,
    },
    /// Check that the configured model answers
    Test,
    /// Past generations
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Show recent generations, newest first
    List,
    /// Delete all history
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Set the default model preset
    SetDefault {
        /// Name of the preset to use as default
        preset: String,
    },
    /// Set the default tone intensity
    SetIntensity {
        /// Intensity from 1 to 10
        level: Intensity,
    },
    /// List available presets
    List,
    /// Show current configuration
    Show,
    /// Add a new preset
    AddPreset {
        /// Preset name
        name: String,
        /// Provider (openrouter, openai-compatible)
        #[arg(short, long)]
        provider: String,
        /// Model identifier
        #[arg(short = 'M', long)]
        model: String,
        /// Models to try, in order, when the primary model fails
        #[arg(long = "fallback")]
        fallback_models: Vec<String>,
    },
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::SetDefault { preset } => {
            let mut config = Config::load()?;
            // Verify preset exists
            config.get_preset(preset)?;
            config
                .defaults
                .insert(PROGRAM_NAME.to_string(), preset.clone());
            config.save()?;
            println!("Default preset for {} set to: {}", PROGRAM_NAME, preset);
        }
        ConfigAction::SetIntensity { level } => {
            let mut app_config = AppConfig::load()?;
            app_config.default_intensity = *level;
            app_config.save()?;
            println!("Default intensity set to: {} ({})", level, level.describe());
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let current_default = config.get_default_for_program(PROGRAM_NAME);
            println!("Available presets:");
            let mut names: Vec<&String> = config.presets.keys().collect();
            names.sort();
            for name in names {
                let preset = &config.presets[name];
                let default_marker = if name == current_default {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {} - {} / {}{}",
                    name,
                    preset.provider,
                    preset.models().collect::<Vec<_>>().join(" -> "),
                    default_marker
                );
            }
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("LLM config file: {}", Config::config_path()?.display());
            println!();
            println!("{:#?}", config);
            println!();
            let app_config = AppConfig::load()?;
            println!("App config file: {}", AppConfig::config_path()?.display());
            println!();
            println!("{:#?}", app_config);
        }
        ConfigAction::AddPreset {
            name,
            provider,
            model,
            fallback_models,
        } => {
            let mut config = Config::load()?;
            config.presets.insert(
                name.clone(),
                ModelPreset {
                    provider: provider.clone(),
                    model: model.clone(),
                    fallback_models: fallback_models.clone(),
                },
            );
            config.save()?;
            println!("Added preset: {}", name);
        }
    }
    Ok(())
}

fn handle_history_command(action: &HistoryAction, app_config: &AppConfig) -> Result<()> {
    let history = HistoryStore::open_default(app_config.history_limit)?;

    match action {
        HistoryAction::List => {
            let items = history.load();
            if items.is_empty() {
                println!("No history yet");
                return Ok(());
            }
            for item in &items {
                println!(
                    "[{}] intensity {}: {}",
                    item.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    item.intensity,
                    item.message
                );
                print_responses(&item.responses);
                println!();
            }
        }
        HistoryAction::Clear => {
            history.clear()?;
            println!("History cleared");
        }
    }
    Ok(())
}

fn print_responses(responses: &ResponseTriple) {
    for (i, response) in responses.iter().enumerate() {
        println!("  {}. {}", i + 1, response);
    }
}

async fn read_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read stdin")?;
    Ok(input)
}

async fn run_parse(file: Option<&PathBuf>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .context(format!("Failed to read {}", path.display()))?,
        None => read_stdin().await?,
    };

    print_responses(&normalize(&raw));
    Ok(())
}

async fn run_test(model: Option<&str>) -> Result<()> {
    let config = Config::load().context("Failed to load LLM configuration")?;
    let generator = ReplyGenerator::from_config(&config, model, false)?;

    let spinner = spinner("Testing connection...")?;
    let result = generator.check_connection().await;
    spinner.finish_and_clear();

    let report = result?;
    println!("Connection OK ({} / {})", report.provider, report.model);
    println!("Reply: {}", report.reply);
    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("  {spinner} {msg} {elapsed}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

/// Echo streamed text to stderr, printing only what is new since the last call.
struct StreamEcho {
    printed: Mutex<String>,
}

impl StreamEcho {
    fn new() -> Self {
        Self {
            printed: Mutex::new(String::new()),
        }
    }

    fn update(&self, accumulated: &str) {
        let Ok(mut printed) = self.printed.lock() else {
            return;
        };
        let mut stderr = std::io::stderr().lock();

        match accumulated.strip_prefix(printed.as_str()) {
            Some(delta) => {
                let _ = write!(stderr, "{}", delta);
            }
            // A fallback model started over
            None => {
                let _ = write!(stderr, "\n\n{}", accumulated);
            }
        }
        let _ = stderr.flush();

        printed.clear();
        printed.push_str(accumulated);
    }

    fn printed_anything(&self) -> bool {
        self.printed.lock().map(|p| !p.is_empty()).unwrap_or(false)
    }
}

async fn run_generate(args: &Args, message: &str, app_config: &AppConfig) -> Result<()> {
    let message = if message == "-" {
        read_stdin().await?
    } else {
        message.to_string()
    };
    let message = message.trim();
    if message.is_empty() {
        bail!("Message is empty");
    }

    let intensity = args.intensity.unwrap_or(app_config.default_intensity);
    let stream = app_config.stream && !args.no_stream;

    let config = Config::load().context("Failed to load LLM configuration")?;
    let generator = ReplyGenerator::from_config(&config, args.model.as_deref(), stream)?;

    eprintln!("Intensity {}: {}", intensity, intensity.describe());

    let generation = if stream {
        let echo = StreamEcho::new();
        let on_partial = |text: &str| echo.update(text);
        let result = generator
            .generate(message, intensity, Some(&on_partial))
            .await;
        if echo.printed_anything() {
            eprintln!("\n");
        }
        result?
    } else {
        let spinner = spinner("Generating replies...")?;
        let result = generator.generate(message, intensity, None).await;
        spinner.finish_and_clear();
        result?
    };

    if args.debug {
        eprintln!("Model: {}", generation.model);
    }

    print_responses(&generation.responses);

    if !args.no_history {
        let history = HistoryStore::open_default(app_config.history_limit)?;
        if let Err(e) = history.push(HistoryItem::new(message, intensity, generation.responses)) {
            log::warn!("Failed to save history: {:#}", e);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Handle config subcommands first (before LLM initialization)
    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let app_config = AppConfig::load().context("Failed to load audit-reply configuration")?;

    match &args.command {
        Some(Commands::Parse { file }) => run_parse(file.as_ref()).await,
        Some(Commands::Test) => run_test(args.model.as_deref()).await,
        Some(Commands::History { action }) => handle_history_command(action, &app_config),
        Some(Commands::Config { .. }) => Ok(()),
        None => match &args.message {
            Some(message) => run_generate(&args, message, &app_config).await,
            None => bail!("No message given. Usage: audit-reply <MESSAGE>, or '-' to read stdin"),
        },
    }
}
