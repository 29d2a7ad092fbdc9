use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    porcher_cli::run().await
}
