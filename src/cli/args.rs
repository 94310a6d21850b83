//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// devup-ui build coordinator
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: devup-ui.toml)
    #[arg(short = 'C', long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the coordinator until Ctrl+C
    #[command(visible_alias = "s")]
    Serve {
        /// Aggregate every rule into devup-ui.css
        #[arg(long)]
        single_css: bool,

        /// Port to listen on (default: ephemeral)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Extract styles from a source file and print the rewritten code
    #[command(visible_alias = "x")]
    Extract {
        /// Source file to extract
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Module path used to locate the CSS directory (default: FILE)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        resource_path: Option<PathBuf>,

        /// Fail instead of extracting locally when no coordinator answers
        #[arg(long)]
        no_fallback: bool,
    },

    /// Print a stylesheet from the running coordinator
    Css {
        /// Chunk number (default: the base stylesheet)
        #[arg(short = 'n', long)]
        file_num: Option<u32>,

        /// Prefix chunks with an import of devup-ui.css
        #[arg(short, long)]
        import_main_css: bool,

        /// Wait until extraction has gone quiet
        #[arg(short, long)]
        wait: bool,
    },

    /// Check whether a coordinator is running
    Health,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["devup-coordinator", "serve", "--single-css", "-p", "4000"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                single_css: true,
                port: Some(4000)
            }
        ));
        assert_eq!(cli.config, PathBuf::from("devup-ui.toml"));
    }

    #[test]
    fn test_parse_extract_global_flags() {
        let cli = Cli::try_parse_from([
            "devup-coordinator",
            "extract",
            "src/App.tsx",
            "--no-fallback",
            "-V",
            "-C",
            "conf/devup-ui.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("conf/devup-ui.toml"));
        match cli.command {
            Commands::Extract {
                file,
                resource_path,
                no_fallback,
            } => {
                assert_eq!(file, PathBuf::from("src/App.tsx"));
                assert!(resource_path.is_none());
                assert!(no_fallback);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_css() {
        let cli = Cli::try_parse_from(["devup-coordinator", "css", "-n", "3", "--wait"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Css {
                file_num: Some(3),
                import_main_css: false,
                wait: true
            }
        ));
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["devup-coordinator"]).is_err());
    }
}
