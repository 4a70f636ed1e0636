//! Validate, merge, and write the gallery index plus its summary metadata.
//! Run: cargo run --bin build_index

use std::process;

fn main() {
    process::exit(vitrine::cli::handle_build());
}
