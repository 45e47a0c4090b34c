//! 批量测试处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量测试定义的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写运行日志头、选择远端、打开草稿目录
//! 2. **批量加载**：扫描并加载所有待处理的测试定义（`Vec<TestDefinition>`）
//! 3. **按社区分组**：每个社区只有一个草稿槽，同组内顺序处理
//! 4. **并发控制**：使用 Semaphore 限制同时处理的社区数量
//! 5. **资源管理**：持有远端、草稿存储和孤儿报告写入器
//! 6. **全局统计**：汇总所有测试的处理结果

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::clients::ApiBackend;
use crate::config::Config;
use crate::infrastructure::{FileSlot, SystemClock};
use crate::models::TestDefinition;
use crate::orchestrator::test_processor;
use crate::services::{DraftStore, OrphanWriter};
use crate::utils::logging::{
    init_log_file, log_group_complete, log_group_start, log_startup, log_tests_loaded,
    print_final_stats,
};

/// 应用主结构
pub struct App {
    config: Config,
    api: Arc<ApiBackend>,
    store: Arc<DraftStore<FileSlot>>,
    orphans: Arc<OrphanWriter>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let api = ApiBackend::from_config(&config)?;
        if api.is_dry_run() {
            warn!("🧪 演练模式：所有远程写操作只发生在内存中");
        }

        let store = DraftStore::with_clock(
            FileSlot::new(&config.draft_dir),
            config.draft_ttl_ms,
            Arc::new(SystemClock),
        );
        let orphans = OrphanWriter::with_path(config.warn_file.clone());

        Ok(Self {
            config,
            api: Arc::new(api),
            store: Arc::new(store),
            orphans: Arc::new(orphans),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let definitions = self.load_definitions().await?;

        if definitions.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(());
        }

        let total = definitions.len();
        let groups = group_by_community(definitions);
        log_tests_loaded(total, groups.len(), self.config.max_concurrent_communities);

        let stats = self.process_all_groups(groups, total).await?;

        print_final_stats(stats.success, stats.failed, stats.total, &self.config.output_log_file);

        Ok(())
    }

    async fn load_definitions(&self) -> Result<Vec<TestDefinition>> {
        info!("\n📁 正在扫描待处理的测试定义...");
        crate::models::load_all_toml_files(&self.config.toml_folder).await
    }

    /// 并发处理所有社区分组
    async fn process_all_groups(
        &self,
        groups: BTreeMap<String, Vec<TestDefinition>>,
        total: usize,
    ) -> Result<ProcessingStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_communities));
        let group_count = groups.len();
        let mut handles = Vec::with_capacity(group_count);
        let mut next_index = 1;

        for (group_num, (community_id, definitions)) in groups.into_iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let first_index = next_index;
            next_index += definitions.len();

            let api = self.api.clone();
            let store = self.store.clone();
            let orphans = self.orphans.clone();
            let config = self.config.clone();

            log_group_start(group_num + 1, group_count, &community_id, definitions.len());

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let mut result = GroupResult {
                    community_id,
                    ..Default::default()
                };

                // 同一社区共用一个草稿槽，必须顺序处理
                for (offset, definition) in definitions.iter().enumerate() {
                    let test_index = first_index + offset;
                    match test_processor::process_test(
                        api.as_ref(),
                        store.as_ref(),
                        definition,
                        test_index,
                        &config,
                        orphans.as_ref(),
                    )
                    .await
                    {
                        Ok(true) => result.success += 1,
                        Ok(false) => result.failed += 1,
                        Err(e) => {
                            error!("[测试 {}] ❌ 处理过程中发生错误: {:#}", test_index, e);
                            result.failed += 1;
                        }
                    }
                }
                result
            });
            handles.push(handle);
        }

        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };
        for joined in join_all(handles).await {
            match joined {
                Ok(result) => {
                    log_group_complete(&result.community_id, result.success, result.success + result.failed);
                    stats.success += result.success;
                    stats.failed += result.failed;
                }
                Err(e) => error!("社区任务执行失败: {}", e),
            }
        }
        // 任务崩溃时其中的测试按失败计
        stats.failed = stats.total - stats.success;

        Ok(stats)
    }
}

/// 按社区分组，组内保持加载顺序
fn group_by_community(definitions: Vec<TestDefinition>) -> BTreeMap<String, Vec<TestDefinition>> {
    let mut groups: BTreeMap<String, Vec<TestDefinition>> = BTreeMap::new();
    for definition in definitions {
        groups
            .entry(definition.community_id.clone())
            .or_default()
            .push(definition);
    }
    groups
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 单个社区分组的处理结果
#[derive(Debug, Default)]
struct GroupResult {
    community_id: String,
    success: usize,
    failed: usize,
}
