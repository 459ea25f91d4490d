//! Generates man pages for `netmaint` and its subcommands at build time.

use std::env;
use std::fs;
use std::path::Path;

use clap::CommandFactory;

// cli.rs is self-contained over clap + clap_complete, so the build script
// compiles it without the rest of the crate.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = env::var_os("OUT_DIR").expect("OUT_DIR not set by Cargo");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("failed to create man output directory");

    write_pages(&cli::Cli::command(), &man_dir);
}

fn write_pages(cmd: &clap::Command, dir: &Path) {
    let name = cmd.get_name().to_owned();

    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut page)
        .unwrap_or_else(|e| panic!("man page for `{name}`: {e}"));
    fs::write(dir.join(format!("{name}.1")), page)
        .unwrap_or_else(|e| panic!("writing man page for `{name}`: {e}"));

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let sub = sub.clone().name(format!("{name}-{}", sub.get_name()));
        write_pages(&sub, dir);
    }
}
