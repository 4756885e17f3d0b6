use clap::Parser;
use libhelper::cli;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let code = cli.run().await;
    std::process::exit(code);
}
