fn main() {
    if let Err(err) = scriven::run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
