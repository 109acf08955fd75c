//! Main entry point for the mbpack CLI app

fn main() -> std::process::ExitCode {
    match mbpack::cli_runner::run_cli_app() {
        Ok(true) => std::process::ExitCode::SUCCESS,
        Ok(false) => std::process::ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
