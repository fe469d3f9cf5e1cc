use clap::{Args, Parser, Subcommand, ValueEnum};
use dupe_reconciler::model::ActionMode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dupe-reconciler")]
#[command(
    about = "Clean up library duplicates against the files Radarr/Sonarr track",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (defaults to Config.toml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find redundant copies and delete or quarantine them
    Reconcile(ReconcileArgs),
    /// Print configuration values with credentials masked
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Report what would be removed without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Approve every decision without prompting
    #[arg(long, requires = "mode")]
    pub yes: bool,

    /// Action applied to approved files when running with --yes
    #[arg(long, value_enum, requires = "yes")]
    pub mode: Option<ModeArg>,

    /// Only process the named instance (repeatable)
    #[arg(long = "instance")]
    pub instances: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Permanently delete redundant files
    Delete,
    /// Move redundant files into the trash directory
    Trash,
}

impl From<ModeArg> for ActionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Delete => ActionMode::Delete,
            ModeArg::Trash => ActionMode::Move,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_yes_requires_mode() {
        assert!(Cli::try_parse_from(["dupe-reconciler", "reconcile", "--yes"]).is_err());
        let cli = Cli::try_parse_from([
            "dupe-reconciler",
            "-c",
            "alt.toml",
            "reconcile",
            "--yes",
            "--mode",
            "trash",
            "--instance",
            "Movies",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        match cli.command {
            Some(Commands::Reconcile(args)) => {
                assert!(args.yes);
                assert!(!args.dry_run);
                assert_eq!(args.instances, vec!["Movies".to_string()]);
                assert_eq!(args.mode.map(ActionMode::from), Some(ActionMode::Move));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
