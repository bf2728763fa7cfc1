use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;
use anyhow::Result;

/// Pattern of every line written to a run log file.
pub const FILE_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

const CONSOLE_LOG_PATTERN: &str = "{h({l})} {m}{n}";

/// Installs the global logger: console output on stderr, plus a log file when
/// `log_file` is given.
pub fn setup_logging(log_file: Option<&Path>, log_level: LevelFilter) -> Result<()> {
    let config = build_config(log_file, log_level)?;
    log4rs::init_config(config)?;
    Ok(())
}

fn build_config(log_file: Option<&Path>, log_level: LevelFilter) -> Result<Config> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_LOG_PATTERN)))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(log_file) = log_file {
        // Create log directory if it doesn't exist
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file_appender = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(FILE_LOG_PATTERN)))
            .build(log_file)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file_appender)));
        root = root.appender("file");
    }

    Ok(builder.build(root.build(log_level))?)
}
