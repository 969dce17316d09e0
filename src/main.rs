#[tokio::main]
async fn main() {
    let code = watchdog::app::startup::startup().await;
    std::process::exit(code);
}
