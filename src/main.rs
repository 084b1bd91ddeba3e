// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use csub::app_config::{self, Config};
use csub::errors;
use csub::{NegativeTimePolicy, OutputMode, TimeShiftEngine};

/// CLI Wrapper for NegativeTimePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliNegativeTime {
    Keep,
    Clamp,
    Reject,
}

impl From<CliNegativeTime> for NegativeTimePolicy {
    fn from(cli_policy: CliNegativeTime) -> Self {
        match cli_policy {
            CliNegativeTime::Keep => NegativeTimePolicy::Keep,
            CliNegativeTime::Clamp => NegativeTimePolicy::Clamp,
            CliNegativeTime::Reject => NegativeTimePolicy::Reject,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for csub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// csub - utility for *.srt subtitle files synchronization
#[derive(Parser, Debug)]
#[command(name = "csub")]
#[command(version)]
#[command(about = "Utility for *.srt subtitle files synchronization")]
#[command(disable_help_flag = true)]
#[command(long_about = "csub shifts every timestamp of an SRT subtitle file by a fixed delta
and optionally renumbers the cues.

EXAMPLES:
    csub -i subfile.srt -o newsubsfile.srt -M 15 -s 11 -m -1
    cat subfile.srt | csub -c 2                 # read from stdin, write on stdout
    csub -i subfile.srt -o subfile.srt -s -3    # rewrite the input file in place
    csub completions bash > csub.bash           # generate bash completions

CONFIGURATION:
    Default delta, negative-time policy and log level can be stored in a JSON
    file given with --config, or in csub.json in the working directory.
    Command line values take precedence.

EXIT STATUS:
    0 success, 2 usage/config error, 16 --ms out of range, 41/42 cannot open
    input/output, 43/44 read/write failure, 88 out of memory, 91 bad cue
    index, 92 bad timing line, 93 negative timestamp rejected")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Change the milliseconds values (must be in range -999..999)
    #[arg(short = 'M', long = "ms", value_name = "NUM", allow_negative_numbers = true)]
    ms: Option<i32>,

    /// Change the seconds values
    #[arg(short = 's', long = "sec", value_name = "NUM", allow_negative_numbers = true)]
    sec: Option<i32>,

    /// Change the minutes values
    #[arg(short = 'm', long = "min", value_name = "NUM", allow_negative_numbers = true)]
    min: Option<i32>,

    /// Change the hours values
    #[arg(short = 'h', long = "hour", value_name = "NUM", allow_negative_numbers = true)]
    hour: Option<i32>,

    /// Change the subtitles count numbers
    #[arg(short = 'c', long = "count", value_name = "NUM", allow_negative_numbers = true)]
    count: Option<i32>,

    /// Subtitles file to change (default: stdin)
    #[arg(short = 'i', long = "input-file", value_name = "INFILE")]
    input_file: Option<PathBuf>,

    /// New subtitles file to create (default: stdout); same as INFILE rewrites in place
    #[arg(short = 'o', long = "output-file", value_name = "OUTFILE")]
    output_file: Option<PathBuf>,

    /// Print the parsed delta and paths on stderr
    #[arg(short = 'd', long)]
    debug: bool,

    /// What to do with timestamps shifted below zero
    #[arg(long, value_enum, value_name = "POLICY")]
    negative_time: Option<CliNegativeTime>,

    /// Configuration file path
    #[arg(long = "config", value_name = "FILE")]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Print this help
    #[arg(short = 'H', long = "help", action = ArgAction::Help)]
    help: Option<bool>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself accepts everything; log::max_level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Label and ANSI colour for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("error", "1;31"),
            Level::Warn => ("warn ", "1;33"),
            Level::Info => ("info ", "1;32"),
            Level::Debug => ("debug", "1;36"),
            Level::Trace => ("trace", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (label, colour) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, label, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> ExitCode {
    // Warnings and errors only until the configuration says otherwise
    if let Err(e) = CustomLogger::init(LevelFilter::Warn) {
        eprintln!("Failed to initialise logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "csub", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    match run_shift(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(errors::exit_code_for(&e))
        }
    }
}

fn run_shift(options: CommandLineOptions) -> Result<()> {
    let mut config = Config::load(options.config_path.as_deref())?;

    // Override config with CLI options if provided
    if let Some(ms) = options.ms {
        config.delta.ms = ms;
    }
    if let Some(s) = options.sec {
        config.delta.s = s;
    }
    if let Some(m) = options.min {
        config.delta.m = m;
    }
    if let Some(h) = options.hour {
        config.delta.h = h;
    }
    if let Some(count) = options.count {
        config.delta.count = count;
    }
    if let Some(policy) = options.negative_time {
        config.negative_time = policy.into();
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    } else if options.debug {
        config.log_level = app_config::LogLevel::Debug;
    }
    log::set_max_level(config.log_level.to_level_filter());

    let delta = config.time_delta()?;
    let input = options.input_file.as_deref();
    let output = options.output_file.as_deref();

    debug!("delta: {}", delta);
    debug!("negative time policy: {:?}", config.negative_time);
    debug!("input: {}", input.map_or("<stdin>".into(), |p| p.display().to_string()));
    debug!("output: {}", output.map_or("<stdout>".into(), |p| p.display().to_string()));

    let mode = OutputMode::select(input, output);
    if let OutputMode::InPlace(path) = &mode {
        info!("Input and output are the same file, rewriting {} in place", path.display());
    }

    let engine = TimeShiftEngine::new(delta, config.negative_time);
    let summary = engine
        .run(input, &mode)
        .with_context(|| match input {
            Some(path) => format!("Failed to shift subtitles from {}", path.display()),
            None => "Failed to shift subtitles from stdin".to_string(),
        })?;

    info!("Shifted {} cues ({} lines read)", summary.cues, summary.lines);
    Ok(())
}
