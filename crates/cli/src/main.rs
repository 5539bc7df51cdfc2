use std::process::ExitCode;

fn main() -> ExitCode {
    panier_cli::run()
}
