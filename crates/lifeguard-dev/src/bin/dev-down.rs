use lifeguard_dev::{app, commands::{Cli, Commands}};
use std::process;

#[tokio::main]
async fn main() {
    let code = app::run(Cli::for_command(Commands::Down {})).await;
    if code != 0 { process::exit(code); }
}
