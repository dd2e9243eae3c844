use jsonbuf::cli;

fn main() {
    // stdout carries schema text only; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
