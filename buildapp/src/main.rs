use buildapp::cli::{print_help, Cli, USAGE_EXIT_CODE};
use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.help {
        if let Err(error) = print_help() {
            eprintln!("{error}");
        }
        std::process::exit(USAGE_EXIT_CODE);
    }

    if let Err(error) = cli.run() {
        const BOLD_RED: &str = "\x1b[1;31m";
        const BOLD: &str = "\x1b[1m";
        const RESET: &str = "\x1b[0m";
        eprintln!("{BOLD_RED}error{RESET}{BOLD}:{RESET} {error}");
        std::process::exit(1);
    }
}
