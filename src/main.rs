// ==========================================
// 面包生产线设定系统 - HTTP 服务主入口
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use reglages_ligne::app::{serve, sweep_stale_uploads, AppSettings, AppState, UPLOAD_TTL};
use reglages_ligne::config::SettingsReader;
use reglages_ligne::{i18n, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", reglages_ligne::APP_NAME);
    tracing::info!("系统版本: {}", reglages_ligne::VERSION);
    tracing::info!("==================================================");

    let settings = AppSettings::from_env();
    tracing::info!("使用数据库: {}", settings.db_path);

    let state = AppState::new(&settings)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    // 清理上次运行遗留的暂存文件
    sweep_stale_uploads(&state.upload_dir, UPLOAD_TTL).await;

    let locale = state
        .config_manager
        .get_locale()
        .await
        .context("读取界面语言失败")?;
    let locale = i18n::apply_locale(&locale);
    tracing::info!("界面语言: {}", locale);

    serve(Arc::new(state), &settings.listen_addr)
        .await
        .with_context(|| format!("HTTP 服务异常退出 ({})", settings.listen_addr))?;

    tracing::info!("服务已退出");
    Ok(())
}
