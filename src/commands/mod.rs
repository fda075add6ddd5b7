use clap::Args;
use std::path::PathBuf;

use wildkit::corpus::{exclusion_from_config, FsCorpus};
use wildkit::defaults::{self, ExclusionConfig, WildkitConfig};

pub type CmdResult<T> = wildkit::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

/// Corpus selection shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub struct CorpusArgs {
    /// Corpus root directory (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,
}

impl CorpusArgs {
    pub fn root(&self) -> wildkit::Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir().map_err(|e| {
                wildkit::Error::internal_io(e.to_string(), Some("resolve current dir".to_string()))
            }),
        }
    }
}

/// Which tool's traversal rules to apply.
#[derive(Debug, Clone, Copy)]
pub enum Tool {
    Replace,
    Lint,
    Refactor,
}

impl Tool {
    fn exclusion(self, config: &WildkitConfig) -> &ExclusionConfig {
        match self {
            Tool::Replace => &config.tools.replace,
            Tool::Lint => &config.tools.lint,
            Tool::Refactor => &config.tools.refactor,
        }
    }
}

/// Open the corpus under `args` with the tool's exclusion rules.
pub fn open_corpus(args: &CorpusArgs, tool: Tool) -> wildkit::Result<(FsCorpus, WildkitConfig)> {
    let root = args.root()?;
    let config = defaults::load_config(&root);
    let corpus = FsCorpus::open(&root, &config.extension)?
        .with_exclusion(exclusion_from_config(tool.exclusion(&config)));
    Ok((corpus, config))
}

pub mod config;
pub mod lint;
pub mod refactor;
pub mod replace;
pub mod report;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (wildkit::Result<serde_json::Value>, i32) {
    crate::tty::status("wildkit is working...");

    match command {
        crate::Commands::Replace(args) => dispatch!(args, global, replace),
        crate::Commands::Lint(args) => dispatch!(args, global, lint),
        crate::Commands::Refactor(args) => dispatch!(args, global, refactor),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
