fn main() {
    if let Err(err) = chargeamps_report::app::run_cli() {
        eprintln!("report command failed: {err}");
        std::process::exit(1);
    }
}
