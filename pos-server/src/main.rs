use pos_server::{Server, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 配置, 日志)
    let config = setup_environment()?;

    print_banner();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        work_dir = %config.work_dir,
        "POS server starting..."
    );

    // 2. 初始化状态并启动 HTTP 服务器
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
