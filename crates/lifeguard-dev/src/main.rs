use clap::Parser;
use lifeguard_dev::{app, commands::Cli};
use std::process;

#[tokio::main]
async fn main() {
    let code = app::run(Cli::parse()).await;
    if code != 0 { process::exit(code); }
}
