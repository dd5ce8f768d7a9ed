fn main() {
    if let Err(err) = xlsx_wrangler::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
