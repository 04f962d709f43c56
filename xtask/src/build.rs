use anyhow::{Context, Result, bail};
use std::process::Command;

const TARGET: &str = "x86_64-unknown-none";

/// Crates that must stay `no_std` clean.
const NO_STD_PACKAGES: &[&str] = &["mos_error", "mos_utils", "mos_hal", "mosaic-kernel"];

/// Build every no_std crate for the bare-metal target, features off.
pub fn check_bare_metal(release: bool) -> Result<()> {
    println!("Building for {TARGET}...");
    let mut cmd = Command::new("cargo");
    cmd.args(["build", "--target", TARGET]);
    for package in NO_STD_PACKAGES {
        cmd.args(["-p", package]);
    }
    if release {
        cmd.arg("--release");
    }

    let status = cmd
        .status()
        .context("Failed to run cargo build")?;
    if !status.success() {
        bail!("bare-metal build failed (is the {TARGET} target installed?)");
    }
    println!("✅ {TARGET} build succeeded");
    Ok(())
}
