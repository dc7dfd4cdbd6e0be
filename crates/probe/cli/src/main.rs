use colored::Colorize;

fn main() {
    if let Err(e) = probe_cli::run() {
        eprintln!("{} {}", "✗".red(), e);
        std::process::exit(1);
    }
}
