use std::process::ExitCode;

fn main() -> ExitCode {
    wrh_quote_cli::run()
}
