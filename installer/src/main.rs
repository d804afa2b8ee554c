use std::process::ExitCode;

fn main() -> ExitCode {
    longwar_installer_lib::run()
}
