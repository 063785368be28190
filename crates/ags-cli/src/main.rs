//! Thin entrypoint for the `ags-console` binary.

#[tokio::main]
async fn main() {
    std::process::exit(ags_cli::run().await);
}
