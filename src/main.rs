use anyhow::Result;
use carousel_pdf::utils::logging;
use carousel_pdf::{App, Config};
use clap::Parser;
use tracing::warn;

/// 把网页轮播中的全部图片导出为一个 PDF
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// 轮播所在页面的 URL
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let outcome = App::initialize(config, args.url).await?.run().await?;

    // 没有生成文档不算错误，输出文件是否存在才是结果
    if outcome.output.is_none() {
        warn!("没有生成任何文档");
    }

    Ok(())
}
