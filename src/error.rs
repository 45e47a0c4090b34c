use thiserror::Error;

use crate::services::materialize::{EntityKind, MaterializationLog};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 远程 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 草稿存储错误
    #[error("草稿错误: {0}")]
    Draft(#[from] DraftError),
    /// 本地校验失败（提交前拦截，不触发任何远程调用）
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 会话状态机错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 题目物化失败（已提交的步骤不会回滚）
    #[error("物化失败: {0}")]
    Materialize(#[from] MaterializeError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// 面向用户的错误消息
    ///
    /// 远程错误只保证"有消息"，这里直接取出消息本身，不带分类前缀
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(e) => e.message(),
            AppError::Materialize(e) => e.source.message(),
            other => other.to_string(),
        }
    }

    /// 物化失败时已在远端创建的孤儿实体
    pub fn orphans(&self) -> Option<&MaterializationLog> {
        match self {
            AppError::Materialize(e) => Some(&e.committed),
            _ => None,
        }
    }
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 成功响应中缺少 id
    #[error("API响应缺少 id: {endpoint}")]
    MissingId { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    /// 人类可读的错误消息
    pub fn message(&self) -> String {
        match self {
            ApiError::BadResponse { message, .. } => message.clone(),
            ApiError::RequestFailed { source, .. } => source.to_string(),
            ApiError::MissingId { endpoint } => format!("响应缺少 id ({})", endpoint),
            ApiError::JsonParseFailed { source } => source.to_string(),
        }
    }

    /// 构造错误响应
    pub fn bad_response(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }
}

/// 草稿存储错误
#[derive(Debug, Error)]
pub enum DraftError {
    /// 未初始化的测试（testId 为空）不允许携带题目
    #[error("testId 为空的草稿不能包含题目 (题目数: {count})")]
    QuestionsWithoutTest { count: usize },
    /// 序列化失败
    #[error("草稿序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 读写存储槽失败
    #[error("草稿存储槽 {key} 读写失败: {source}")]
    Slot {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// 本地校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("题干不能为空")]
    EmptyBody,
    #[error("函数签名不能为空")]
    EmptySignature,
    #[error("至少需要 1 个测试用例")]
    NoTestCases,
    #[error("测试用例 #{case} 的期望输出不能为空")]
    EmptyExpectedOutput { case: usize },
    #[error("测试用例 #{case} 的参数 #{argument} 不能为空")]
    EmptyArgument { case: usize, argument: usize },
    #[error("测试用例 #{case} 的参数个数为 {actual}，应为 {expected}")]
    ArgumentShape {
        case: usize,
        expected: usize,
        actual: usize,
    },
    #[error("选择题至少需要 2 个选项，当前 {count} 个")]
    TooFewOptions { count: usize },
    #[error("选项 #{option} 的内容不能为空")]
    EmptyOptionBody { option: usize },
    #[error("至少需要 1 个正确选项")]
    NoCorrectOption,
    #[error("不能移除最后一个正确选项")]
    LastCorrectOption,
    #[error("测试标题不能为空")]
    EmptyTitle,
    #[error("索引 {index} 超出范围 [0, {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// 会话状态机错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 当前状态不允许该操作
    #[error("当前状态 {state} 不允许执行 {action}")]
    InvalidState { state: String, action: &'static str },
    /// 已有题目正在编辑
    #[error("已有题目正在编辑，请先提交或取消")]
    QuestionInProgress,
    /// 没有正在编辑的题目
    #[error("没有正在编辑的题目")]
    NoQuestionInProgress,
    /// 测试元信息已锁定
    #[error("测试元信息已锁定，请先进入编辑模式")]
    MetadataLocked,
    /// 题目索引超出范围
    #[error("题目索引 {index} 超出范围 (共 {len} 题)")]
    QuestionIndexOutOfRange { index: usize, len: usize },
}

/// 物化失败：某一步远程调用失败，后续步骤全部中止
#[derive(Debug, Error)]
#[error("{failed_step} 步骤失败 (已提交 {} 步): {source}", .committed.len())]
pub struct MaterializeError {
    /// 失败的步骤
    pub failed_step: EntityKind,
    /// 底层 API 错误
    #[source]
    pub source: ApiError,
    /// 失败前已经在远端提交的步骤
    pub committed: MaterializationLog,
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 无法构建 HTTP 客户端
    #[error("无法构建 HTTP 客户端: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// 缺少必需的配置项
    #[error("缺少配置项 {var_name}")]
    Missing { var_name: &'static str },
    /// API 根地址无法解析
    #[error("API 根地址无效 {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonParseFailed {
            source: Box::new(err),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// API 调用结果类型
pub type ApiResult<T> = Result<T, ApiError>;
