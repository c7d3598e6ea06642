use std::process::ExitCode;

fn main() -> ExitCode {
    prisma_typegen::cli::run()
}
