use clap::Parser;
use sheet_player_lib::cli::Cli;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = sheet_player_lib::run(cli).await {
        sheet_player_lib::notifications::notify_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
