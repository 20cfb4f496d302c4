fn main() {
    if let Err(e) = jsonextract::cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
