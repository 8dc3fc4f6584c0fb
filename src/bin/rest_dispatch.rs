use std::process::ExitCode;

fn main() -> ExitCode {
    match restful_dispatch::cli::run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rest-dispatch: {err:#}");
            ExitCode::FAILURE
        }
    }
}
