use set_version::generate::{Config, Generator};
use set_version::manifest::DEFAULT_VERSION_KEY;

#[derive(clap::Parser)]
#[command(name = "set-version", version)]
#[command(about = "Generate build files by replacing %__version__% tokens in template files")]
struct Cli {
    /// Key in package.json that specifies the project version
    #[arg(short = 'k', long, default_value = DEFAULT_VERSION_KEY)]
    version_key: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    use clap::{CommandFactory as _, FromArgMatches as _};
    let defaults = Config::default();
    let matches = Cli::command()
        .after_help(format!(
            "Processed files (TEMPLATE -> OUTPUT): {}",
            defaults.describe_file_pairs()
        ))
        .get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config {
        version_key: cli.version_key,
        ..defaults
    };
    Generator::new(config).run()?;

    Ok(())
}
