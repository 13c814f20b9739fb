//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sitewright static site build engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared build arguments for Build and Serve commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// The path to your website
    #[arg(default_value = ".")]
    pub site: PathBuf,

    /// Output directory to create or update (default: <site>/output)
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Rebuild everything, ignoring freshness
    #[arg(short, long)]
    pub force: bool,

    /// Report elapsed time per composed file
    #[arg(short, long)]
    pub timing: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build a site in an output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Watch the site for changes and serve the output directory
    Serve {
        #[command(flatten)]
        build_args: BuildArgs,

        /// The port to serve on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_defaults() {
        let cli = Cli::parse_from(["sitewright", "build"]);
        let Commands::Build { build_args } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(build_args.site, PathBuf::from("."));
        assert!(!build_args.force);
        assert!(build_args.outdir.is_none());
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from([
            "sitewright",
            "serve",
            "mysite",
            "--force",
            "--port",
            "9000",
        ]);
        let Commands::Serve { build_args, port } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(build_args.site, PathBuf::from("mysite"));
        assert!(build_args.force);
        assert_eq!(port, 9000);
    }
}
