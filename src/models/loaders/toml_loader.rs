use crate::models::definition::TestDefinition;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载一份测试定义
pub async fn load_toml_to_definition(toml_file_path: &Path) -> Result<TestDefinition> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let definition: TestDefinition = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(definition.with_file_path(toml_file_path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有 TOML 测试定义
///
/// 单个文件解析失败只记录警告并跳过；结果按文件名排序，保证同一社区内的处理顺序稳定
pub async fn load_all_toml_files(folder_path: &str) -> Result<Vec<TestDefinition>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut definitions = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_toml_to_definition(&path).await {
            Ok(definition) => {
                tracing::info!(
                    "成功加载测试 \"{}\" ({} 道题目)",
                    definition.title,
                    definition.questions.len()
                );
                definitions.push(definition);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(definitions)
}
