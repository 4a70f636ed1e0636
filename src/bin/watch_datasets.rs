//! Watch the datasets directory and rebuild the index on every change.
//! Run: cargo run --bin watch_datasets (stop with ctrl-c)

use std::process;

fn main() {
    process::exit(vitrine::cli::handle_watch());
}
