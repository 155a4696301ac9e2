// Duplex - component library builder
// Entry point; all work happens in the library crate

use duplex::cli::CliHandler;

#[tokio::main]
async fn main() {
    let handler = CliHandler::new();

    if let Err(e) = handler.run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
