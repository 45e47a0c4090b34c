/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 论坛 API 配置 ---
    /// API 根地址
    pub api_base_url: String,
    /// 登录层下发的访问令牌
    pub api_token: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 演练模式：使用内存远端，不发任何网络请求
    pub dry_run: bool,
    /// 完成测试时是否调用发布接口
    pub publish_on_finalize: bool,
    // --- 草稿配置 ---
    /// 草稿存储目录
    pub draft_dir: String,
    /// 草稿有效期（毫秒）
    pub draft_ttl_ms: i64,
    // --- 批处理配置 ---
    /// TOML 测试定义存放目录
    pub toml_folder: String,
    /// 同时处理的社区数量
    pub max_concurrent_communities: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
    /// 孤儿实体报告文件
    pub warn_file: String,
}

/// 草稿默认有效期：1 小时
pub const DEFAULT_DRAFT_TTL_MS: i64 = 3_600_000;

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            api_token: String::new(),
            request_timeout_secs: 30,
            dry_run: false,
            publish_on_finalize: true,
            draft_dir: ".drafts".to_string(),
            draft_ttl_ms: DEFAULT_DRAFT_TTL_MS,
            toml_folder: "tests_toml".to_string(),
            max_concurrent_communities: 4,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            warn_file: "warn.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("FORUM_API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("FORUM_API_TOKEN").unwrap_or(default.api_token),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            dry_run: std::env::var("DRY_RUN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dry_run),
            publish_on_finalize: std::env::var("PUBLISH_ON_FINALIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.publish_on_finalize),
            draft_dir: std::env::var("DRAFT_DIR").unwrap_or(default.draft_dir),
            draft_ttl_ms: std::env::var("DRAFT_TTL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.draft_ttl_ms),
            toml_folder: std::env::var("TEST_TOML_FOLDER").unwrap_or(default.toml_folder),
            max_concurrent_communities: std::env::var("MAX_CONCURRENT_COMMUNITIES").ok().and_then(|v| v.parse().ok()).filter(|n: &usize| *n > 0).unwrap_or(default.max_concurrent_communities),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            warn_file: std::env::var("WARN_FILE").unwrap_or(default.warn_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_is_one_hour() {
        let config = Config::default();
        assert_eq!(config.draft_ttl_ms, 3_600_000);
        assert!(config.max_concurrent_communities > 0);
    }
}
