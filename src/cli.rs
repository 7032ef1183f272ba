use clap::Parser;
use lapwatch::FormattingMode;

/// Runs each command in turn and records how long it took as a lap.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about)]
pub struct Arguments {
    #[arg(short = 'v', long = None, env = "LAPWATCH_VERBOSITY", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// JSON_ARRAY, JSON_OBJECT or JSON_OBJECT_MS. Anything else renders as JSON_ARRAY.
    #[arg(short, long, env = "LAPWATCH_FORMAT", default_value_t = FormattingMode::JsonArray)]
    pub format: FormattingMode,

    /// Milliseconds already on the clock when the first command starts.
    #[arg(short, long, env = "LAPWATCH_OFFSET_MS", default_value_t = 0, allow_negative_numbers = true)]
    pub offset_ms: i64,

    /// Render lap times as HH:MM:SS.cs.
    #[arg(long, env = "LAPWATCH_CLOCK")]
    pub clock: bool,

    #[arg(required = true)]
    pub commands: Vec<String>,
}
