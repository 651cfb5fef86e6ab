use anyhow::{Context, Result};
use clap::Parser;

use doi_verify::utils::logging;
use doi_verify::{App, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = cli.resolve_config()?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("无法创建输出目录: {}", config.output_dir.display()))?;

    // 初始化日志
    logging::init(&config.log_path(), config.verbose_logging)?;

    // 初始化并运行应用
    let _summary = App::initialize(config, &cli.input_file)?.run().await?;

    Ok(())
}
