//! Thin entrypoint for the `tradedesk-cli` binary.

#[tokio::main]
async fn main() {
    let exit_code = tradedesk_cli::run().await;
    std::process::exit(exit_code);
}
