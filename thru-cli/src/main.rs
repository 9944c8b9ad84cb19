//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = thru_cli::run() {
        eprintln!("thru: {err}");
        std::process::exit(1);
    }
}
