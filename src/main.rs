use swapbot::arguments::Arguments;

#[tokio::main]
async fn main() {
    let args = Arguments::parse_args();

    if let Err(e) = swapbot::run::run(args).await {
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}
