use clap::Parser;
use status_resolver::utils::logger;
use status_resolver::{CliConfig, StatusConfig, StatusEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting status-resolver");
    tracing::info!("📁 Loading configuration from: {}", cli.config);

    // 設定錯誤在啟動時就結束，不進入解析流程
    let engine = match StatusConfig::from_file(&cli.config).and_then(|c| StatusEngine::from_config(&c)) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("❌ Startup failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    for read in 0..cli.repeat.max(1) {
        // 只有第一次讀取會略過快取，之後的讀取用來觀察快取行為
        let bypass = cli.no_cache && read == 0;
        let result = engine.current_status(bypass).await;
        println!("{}", result.to_json_pretty()?);
    }

    Ok(())
}
