fn main() {
    if let Err(err) = csv_structing::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
