mod cli;

fn main() {
    // Logging is initialized inside `run` once the workspace is known.
    match cli::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("defsync error: {:#}", err);
            std::process::exit(cli::EXIT_FAILURE);
        }
    }
}
