use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Mosaic kernel developer tasks")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Run the host unit and property tests.
    ///
    /// Library crates are built with their `std` feature so the IRQ lock,
    /// console, and allocator can run on the development machine.
    Test {
        /// Only test this package (e.g. `mos_hal`).
        #[arg(long, short)]
        package: Option<String>,
    },

    /// Build the no_std crates for the bare-metal target.
    Check {
        #[arg(long)]
        release: bool,
    },
}
