//! 运行参数与汇总模型

use std::str::FromStr;

use crate::config::Config;
use crate::error::ConfigError;

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 演示模式：走完整流程但绝不提交
    Demo,
    /// 实投模式：确认闸门通过后真实提交
    Live,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "demo" => Ok(RunMode::Demo),
            "live" => Ok(RunMode::Live),
            other => Err(ConfigError::UnknownRunMode {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunMode::Demo => "演示",
            RunMode::Live => "实投",
        };
        write!(f, "{}", s)
    }
}

/// 一次运行的输入参数（由命令面提供）
#[derive(Debug, Clone)]
pub struct RunParams {
    pub keywords: String,
    pub location: String,
    pub results_cap: usize,
    pub submission_cap: usize,
    pub mode: RunMode,
}

impl RunParams {
    /// 从配置构造运行参数
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            keywords: config.keywords.clone(),
            location: config.location.clone(),
            results_cap: config.results_cap,
            submission_cap: config.submission_cap,
            mode: config.run_mode.parse()?,
        })
    }
}

/// 运行汇总
///
/// 逐个职位增量累计，运行中途被打断也能报告部分进度
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub jobs_found: usize,
    pub submitted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("demo".parse::<RunMode>().unwrap(), RunMode::Demo);
        assert_eq!(" Live ".parse::<RunMode>().unwrap(), RunMode::Live);
        assert!("turbo".parse::<RunMode>().is_err());
    }

    #[test]
    fn test_params_from_config() {
        let config = Config::default();
        let params = RunParams::from_config(&config).unwrap();
        assert_eq!(params.mode, RunMode::Demo);
        assert_eq!(params.submission_cap, 3);
    }
}
