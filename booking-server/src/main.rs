use booking_server::{Config, Server, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载 .env (如果存在)
    let _ = dotenv::dotenv();

    // 2. 加载配置并设置日志
    let config = Config::from_env();
    setup_environment(&config);

    print_banner();
    tracing::info!("📅 Booking server starting...");

    // 3. 启动 HTTP 服务器 (Server::run 会自动启动后台任务)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
