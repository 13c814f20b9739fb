//! Sitewright - a composable static site build engine with incremental
//! rebuilds.

mod cli;
mod composers;
mod config;
mod director;
mod error;
mod extensions;
mod feed;
mod frontmatter;
mod logger;
mod resolver;
mod serve;
mod signals;
mod site;
mod template;
#[cfg(test)]
mod test_support;
mod watch;

use anyhow::Result;
use clap::Parser;
use cli::{BuildArgs, Cli, Commands};
use config::Configuration;
use director::Director;
use site::Site;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Build { build_args } => {
            let (config, site) = load(build_args)?;
            Director::new(config, site)?.produce()?;
            log!("build"; "complete");
        }
        Commands::Serve { build_args, port } => {
            let (config, site) = load(build_args)?;
            Director::new(config.clone(), site.clone())?.produce()?;
            serve::serve_site(config, site, *port)?;
        }
    }
    Ok(())
}

/// Resolve the site and its configuration from the command line.
fn load(args: &BuildArgs) -> Result<(Configuration, Site)> {
    let site = Site::new(&args.site)?;
    let mut config = Configuration::load(&site.path)?;
    config.update_with_cli(args);
    Ok((config, site))
}
