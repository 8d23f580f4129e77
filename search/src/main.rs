use std::process::ExitCode;

use advisor_search::core::CoreApp;

#[tokio::main]
async fn main() -> ExitCode {
    match CoreApp::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\nError: {:#}\n", e);
            ExitCode::FAILURE
        }
    }
}
