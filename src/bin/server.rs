//! Supportline server binary.
//! Run with: cargo run --bin supportline-server

use std::process::ExitCode;

use supportline::start_supportline;

fn main() -> ExitCode {
    start_supportline::run()
}
