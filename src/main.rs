use std::process::ExitCode;

fn main() -> ExitCode {
    match formweave::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            formweave::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
