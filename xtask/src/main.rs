use anyhow::Result;
use clap::Parser;

mod build;
mod cli;
mod tests;

fn main() -> Result<()> {
    let cli = crate::cli::Cli::parse();
    match cli.cmd {
        crate::cli::Cmd::Test { package } => crate::tests::unit::run(package.as_deref()),
        crate::cli::Cmd::Check { release } => crate::build::check_bare_metal(release),
    }
}
