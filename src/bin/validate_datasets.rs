//! Validate every dataset file against the schema and the cross-file invariants.
//! Run: cargo run --bin validate_datasets

use std::process;

fn main() {
    process::exit(vitrine::cli::handle_validate());
}
