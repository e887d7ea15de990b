use std::process::ExitCode;

fn main() -> ExitCode {
    cutquote_cli::run()
}
