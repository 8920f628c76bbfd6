// build.rs

use clap::CommandFactory;
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "src/cli/mod.rs"]
mod cli;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli/mod.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    // One page for the tool, one per subcommand
    let cmd = cli::Cli::command();
    let mut pages = vec![("uring-kitchen".to_string(), cmd.clone())];
    for sub in cmd.get_subcommands() {
        pages.push((format!("uring-kitchen-{}", sub.get_name()), sub.clone()));
    }

    for (name, page) in pages {
        let mut buffer = Vec::new();
        if let Err(e) = Man::new(page).title(name.clone()).render(&mut buffer) {
            println!("cargo:warning=Failed to render man page {}: {}", name, e);
            return;
        }

        let man_path = man_dir.join(format!("{name}.1"));
        if let Err(e) = fs::write(&man_path, buffer) {
            println!("cargo:warning=Failed to write man page: {}", e);
            return;
        }
    }
}
