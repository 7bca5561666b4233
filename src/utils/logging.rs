/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，未设置时 `verbose` 决定默认级别（debug / info）。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("interview_assessment={},warn", default_level).into()
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent: usize, model_name: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 面试答案批量评估模式");
    info!("📊 最大并发评估数: {}", max_concurrent);
    info!("🤖 评价模型: {}", model_name);
    info!("{}", "=".repeat(60));
}

/// 记录测评文件加载信息
pub fn log_assessments_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待评估的测评文件", total);
    info!("📋 最多同时评估 {} 道题\n", max_concurrent);
}

/// 最终统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationStats {
    pub success: usize,
    pub transcription_failed: usize,
    pub feedback_failed: usize,
    pub errors: usize,
}

impl EvaluationStats {
    pub fn total(&self) -> usize {
        self.success + self.transcription_failed + self.feedback_failed + self.errors
    }

    pub fn merge(&mut self, other: EvaluationStats) {
        self.success += other.success;
        self.transcription_failed += other.transcription_failed;
        self.feedback_failed += other.feedback_failed;
        self.errors += other.errors;
    }
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &EvaluationStats, assessments: usize, report_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部评估完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📁 测评文件: {}", assessments);
    info!("✅ 评估成功: {}/{}", stats.success, stats.total());
    info!("🎙️ 转写失败: {}", stats.transcription_failed);
    info!("⚠️ 评价使用默认值: {}", stats.feedback_failed);
    info!("❌ 错误: {}", stats.errors);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
