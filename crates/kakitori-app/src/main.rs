//! Command-line entry point (native).

#[cfg(feature = "native")]
fn main() {
    use clap::Parser;
    use kakitori_app::cli::{self, Cli};

    env_logger::init();
    let args = Cli::parse();
    log::info!("Starting Kakitori");

    if let Err(e) = cli::run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
