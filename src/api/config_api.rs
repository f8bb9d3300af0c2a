// ==========================================
// 面包生产线设定系统 - 区块配置 API
// ==========================================
// 职责: 配置读取（含内置默认）、整体保存、恢复默认、可见性查询、
//       区块产线覆写规则维护
// 保存流程: 认证 → 补齐技术名 → 重排 order → 结构校验 → 写入
// ==========================================

use std::sync::Arc;

use crate::api::auth::require_operator;
use crate::api::error::ApiResult;
use crate::api::validator::validate_configuration;
use crate::config::config_manager::ConfigManager;
use crate::config::settings_reader::SettingsReader;
use crate::domain::block::{blocks_in_order, Block};
use crate::domain::config_document::ConfigSnapshot;
use crate::domain::types::BlockLineOverride;
use crate::engine::config_editor::{normalize_orders, repair_technical_names};
use crate::engine::default_config::default_blocks;
use crate::engine::visibility::VisibilityResolver;
use crate::repository::config_store::ConfigurationStore;

// ==========================================
// ConfigApi - 区块配置 API
// ==========================================
pub struct ConfigApi {
    store: Arc<dyn ConfigurationStore>,
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    /// 创建新的ConfigApi实例
    pub fn new(store: Arc<dyn ConfigurationStore>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            store,
            config_manager,
        }
    }

    /// 读取当前配置
    ///
    /// # 返回
    /// - 尚未保存过时返回内置默认配置（revision = 0, is_default = true）
    pub async fn load_configuration(&self) -> ApiResult<ConfigSnapshot> {
        match self.store.load().await? {
            Some(doc) => Ok(doc.into()),
            None => {
                tracing::debug!("配置文档不存在，使用内置默认配置");
                Ok(ConfigSnapshot {
                    blocks: default_blocks(),
                    revision: 0,
                    is_default: true,
                })
            }
        }
    }

    /// 保存整份配置
    ///
    /// # 参数
    /// - operator: 操作人（必填）
    /// - blocks: 完整区块列表
    /// - expected_revision: Some 时做版本比对
    pub async fn save_configuration(
        &self,
        operator: Option<&str>,
        blocks: Vec<Block>,
        expected_revision: Option<i64>,
    ) -> ApiResult<ConfigSnapshot> {
        let operator = require_operator(operator)?;

        let (repaired, repaired_count) = repair_technical_names(&blocks);
        if repaired_count > 0 {
            tracing::info!(repaired_count, "保存前补齐缺失的技术名");
        }
        let blocks = normalize_orders(&repaired);
        validate_configuration(&blocks)?;

        let revision = self.store.save(&blocks, expected_revision, operator).await?;
        tracing::info!(operator, revision, block_count = blocks.len(), "区块配置已保存");

        Ok(ConfigSnapshot {
            blocks,
            revision,
            is_default: false,
        })
    }

    /// 恢复内置默认配置（作为一次普通保存写入）
    pub async fn reset_to_default(
        &self,
        operator: Option<&str>,
        expected_revision: Option<i64>,
    ) -> ApiResult<ConfigSnapshot> {
        tracing::warn!(operator = operator.unwrap_or(""), "请求恢复默认配置");
        self.save_configuration(operator, default_blocks(), expected_revision)
            .await
    }

    /// 按当前覆写规则构建可见性判定器
    pub async fn resolver(&self) -> ApiResult<VisibilityResolver> {
        let overrides = self.config_manager.get_block_line_overrides().await?;
        Ok(VisibilityResolver::new(overrides))
    }

    /// 指定产线下可见的区块（按 order 排序，字段已过滤并排序）
    pub async fn visible_blocks(&self, line: Option<&str>) -> ApiResult<Vec<Block>> {
        let snapshot = self.load_configuration().await?;
        let resolver = self.resolver().await?;
        Ok(filter_visible(&resolver, &snapshot.blocks, line))
    }

    /// 当前区块产线覆写规则
    pub async fn line_overrides(&self) -> ApiResult<Vec<BlockLineOverride>> {
        Ok(self.config_manager.get_block_line_overrides().await?)
    }

    /// 替换区块产线覆写规则
    pub async fn set_line_overrides(
        &self,
        operator: Option<&str>,
        overrides: Vec<BlockLineOverride>,
    ) -> ApiResult<Vec<BlockLineOverride>> {
        let operator = require_operator(operator)?;
        self.config_manager.set_block_line_overrides(&overrides)?;
        tracing::info!(operator, rule_count = overrides.len(), "区块产线覆写规则已更新");
        Ok(overrides)
    }
}

/// 过滤并排序：区块按 order，字段按 order
pub fn filter_visible(resolver: &VisibilityResolver, blocks: &[Block], line: Option<&str>) -> Vec<Block> {
    blocks_in_order(blocks)
        .into_iter()
        .filter(|b| resolver.block_passes(b, line))
        .map(|block| {
            let mut fields: Vec<_> = resolver
                .visible_fields(block, line)
                .into_iter()
                .cloned()
                .collect();
            fields.sort_by_key(|f| f.order);
            Block {
                fields,
                ..block.clone()
            }
        })
        .collect()
}
