use clap::{Args, Subcommand};
use serde::Serialize;

use wildkit::defaults::{self, WildkitConfig};

use super::{CmdResult, CorpusArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration for a corpus
    Show {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Write a wildkit.json with default settings
    Init {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Replace an existing wildkit.json
        #[arg(long)]
        force: bool,
    },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ConfigOutput {
    #[serde(rename = "config.show")]
    Show {
        path: String,
        exists: bool,
        config: WildkitConfig,
    },
    #[serde(rename = "config.init")]
    Init {
        path: String,
        config: WildkitConfig,
    },
}

pub fn run(args: ConfigArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { corpus } => {
            let root = corpus.root()?;
            let path = defaults::config_path(&root);
            let config = defaults::read_config(&root)?;

            Ok((
                ConfigOutput::Show {
                    exists: path.exists(),
                    path: path.display().to_string(),
                    config,
                },
                0,
            ))
        }
        ConfigCommand::Init { corpus, force } => {
            let root = corpus.root()?;
            if !root.is_dir() {
                return Err(wildkit::Error::corpus_not_found(root.display().to_string()));
            }

            let config = WildkitConfig::default();
            let path = defaults::save_config(&root, &config, force)?;

            Ok((
                ConfigOutput::Init {
                    path: path.display().to_string(),
                    config,
                },
                0,
            ))
        }
    }
}
