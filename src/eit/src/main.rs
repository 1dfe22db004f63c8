use std::process::ExitCode;

fn main() -> ExitCode {
    match eit_cli::main() {
        Ok(()) => ExitCode::SUCCESS,
        // already logged
        Err(_) => ExitCode::FAILURE,
    }
}
