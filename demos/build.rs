//! Build script for the krill demos
//!
//! Not required when using krill as a library

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: CC0-1.0

use std::{env, error::Error, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    arm_targets::process();
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        let out_dir = PathBuf::from(env::var("OUT_DIR")?);
        // put the kernel's memory layout in the linker search path as the
        // package root isn't always searched
        fs::copy("../kernel.ld", out_dir.join("kernel.ld"))?;
        println!("cargo::rustc-link-search={}", out_dir.display());
        println!("cargo::rustc-link-arg-bins=-Tkernel.ld");
    }
    // important - if the file changes, re-run the build
    println!("cargo::rerun-if-changed=../kernel.ld");
    Ok(())
}

// End of File
