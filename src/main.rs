fn main() {
    if let Err(err) = dynview::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
