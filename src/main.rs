use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dataclaro_lib::run().await
}
