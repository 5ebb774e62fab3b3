use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = asgen::cli::Cli::parse();
    match asgen::cli::run(cli) {
        Ok(code) => std::process::ExitCode::from(code.as_i32() as u8),
        Err(err) => {
            eprintln!("asgen: {err:#}");
            std::process::ExitCode::from(1)
        }
    }
}
