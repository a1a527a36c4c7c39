fn main() {
    if let Err(err) = chargeamps_report::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
