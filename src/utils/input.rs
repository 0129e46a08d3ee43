/// 操作员交互模块
///
/// 登录凭证、验证码介入和提交确认都要阻塞等待操作员输入。
/// 标准输入读取放在阻塞线程上执行，避免卡住运行时。
use anyhow::{Context, Result};
use std::io::Write;

/// 提示操作员输入一行文本
pub async fn prompt(label: &str) -> Result<String> {
    let label = label.to_string();
    tokio::task::spawn_blocking(move || {
        print!("{}: ", label);
        std::io::stdout().flush().context("刷新标准输出失败")?;
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("读取标准输入失败")?;
        Ok(line.trim().to_string())
    })
    .await
    .context("输入任务执行失败")?
}

/// 询问操作员是否继续（y/n）
pub async fn confirm(label: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N]", label)).await?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// 阻塞等待操作员按回车（验证码等人工介入场景）
pub async fn wait_for_enter(label: &str) -> Result<()> {
    prompt(&format!("{} (完成后按回车)", label)).await?;
    Ok(())
}
