// ==========================================
// 薪资单分发系统 - 分发协调器
// ==========================================
// 单个收件人协议:
// 1. 解析附件: 存储中不存在则由行数据生成并写入; 失败 → Failed("attachment not found")
// 2. 查询台账: (period, email) 已有 SENT → Skipped
// 3. 发送: 成功 → 追加 SENT; 失败 → 追加 FAILED, 继续下一个
// 并发:
// - 同一 (period, email) 的 查询-发送-记账 由键控异步锁串行化
// - 跨进程由台账部分唯一索引兜底, 记账冲突视为 Skipped
// - 结果按输入顺序汇总
// ==========================================

use crate::dispatch::document_store::{document_dir, sanitize_filename, DocumentStore};
use crate::dispatch::error::{DispatchError, DispatchResult};
use crate::dispatch::mail_transport::{MailAttachment, MailTransport, OutgoingMail};
use crate::dispatch::planner::{
    decide, find_row_for_document, DeliveryAction, DocumentResolution, ATTACHMENT_NOT_FOUND,
};
use crate::dispatch::template::{slip_body, slip_subject};
use crate::domain::delivery::{DispatchSummary, DispatchTarget, Recipient, RecipientOutcome};
use crate::domain::slip::FlatRow;
use crate::render::slip_renderer::{PayslipRenderer, RenderOptions};
use crate::repository::delivery_log_repo::DeliveryLedger;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};

/// 默认并发度 (顺序处理)
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1;

// ==========================================
// RecipientLocks - (period, email) 键控锁
// ==========================================
#[derive(Default)]
pub struct RecipientLocks {
    slots: Mutex<HashMap<(String, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl RecipientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(period: &str, email: &str) -> (String, String) {
        (period.to_string(), email.trim().to_lowercase())
    }

    fn slot(&self, key: &(String, String)) -> Arc<tokio::sync::Mutex<()>> {
        match self.slots.lock() {
            Ok(mut slots) => slots.entry(key.clone()).or_default().clone(),
            // 锁表中毒时退化为独立锁, 由台账唯一索引兜底
            Err(_) => Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// 释放后清理无人持有的槽位
    fn release(&self, key: &(String, String)) {
        if let Ok(mut slots) = self.slots.lock() {
            if slots.get(key).map(|s| Arc::strong_count(s) == 1).unwrap_or(false) {
                slots.remove(key);
            }
        }
    }

    /// 当前槽位数
    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// DispatchCoordinator
// ==========================================
pub struct DispatchCoordinator {
    renderer: PayslipRenderer,
    ledger: Arc<dyn DeliveryLedger>,
    store: Arc<dyn DocumentStore>,
    transport: Arc<dyn MailTransport>,
    locks: Arc<RecipientLocks>,
    max_in_flight: usize,
    logo: Option<Vec<u8>>,
    print_date: Option<NaiveDate>,
}

impl DispatchCoordinator {
    pub fn new(
        ledger: Arc<dyn DeliveryLedger>,
        store: Arc<dyn DocumentStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            renderer: PayslipRenderer::default(),
            ledger,
            store,
            transport,
            locks: Arc::new(RecipientLocks::new()),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            logo: None,
            print_date: None,
        }
    }

    /// 共享键控锁 (多个协调器实例之间)
    pub fn with_locks(mut self, locks: Arc<RecipientLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// 生成缺失附件时使用的 logo
    pub fn with_logo(mut self, logo: Option<Vec<u8>>) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_print_date(mut self, date: NaiveDate) -> Self {
        self.print_date = Some(date);
        self
    }

    /// 批量分发
    ///
    /// # 参数
    /// - rows: 导入得到的行 (用于生成缺失附件)
    /// - target: 机构/期间/收件人
    ///
    /// # 返回
    /// - Ok(summary): 逐个收件人的结果汇总 (单个失败不影响其他)
    /// - Err(InvalidInput): 收件人为空
    #[instrument(skip(self, rows, target), fields(
        period = %target.period,
        organization = %target.organization_name,
        recipients = target.recipients.len()
    ))]
    pub async fn dispatch(
        &self,
        rows: &[FlatRow],
        target: &DispatchTarget,
    ) -> DispatchResult<DispatchSummary> {
        let outcomes = self.dispatch_detailed(rows, target).await?;

        let mut summary = DispatchSummary {
            dir: document_dir(&target.organization_name, &target.period),
            ..Default::default()
        };
        for (recipient, outcome) in target.recipients.iter().zip(outcomes.iter()) {
            summary.record(&recipient.email, outcome);
        }

        info!(
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "批量分发完成"
        );
        Ok(summary)
    }

    /// 批量分发, 按输入顺序返回每个收件人的结果
    pub async fn dispatch_detailed(
        &self,
        rows: &[FlatRow],
        target: &DispatchTarget,
    ) -> DispatchResult<Vec<RecipientOutcome>> {
        if target.recipients.is_empty() {
            return Err(DispatchError::InvalidInput("recipients required".to_string()));
        }

        let options = RenderOptions {
            organization_name: target.organization_name.clone(),
            organization_address: target.organization_address.clone().unwrap_or_default(),
            period: target.period.clone(),
            print_date: self.print_date,
            logo: self.logo.clone(),
        };

        let outcomes = stream::iter(
            target
                .recipients
                .iter()
                .map(|recipient| self.process_recipient(rows, target, &options, recipient)),
        )
        .buffered(self.max_in_flight)
        .collect::<Vec<_>>()
        .await;

        Ok(outcomes)
    }

    async fn process_recipient(
        &self,
        rows: &[FlatRow],
        target: &DispatchTarget,
        options: &RenderOptions,
        recipient: &Recipient,
    ) -> RecipientOutcome {
        let period = target.period.as_str();
        let email = recipient.email.trim();
        let name = recipient.salutation_name();
        let filename = sanitize_filename(&recipient.document_key);

        // 1. 附件
        let resolution = self.resolve_document(rows, target, options, &filename).await;

        // 2-3. 查询-发送-记账 (同键串行)
        let key = RecipientLocks::key(period, email);
        let slot = self.locks.slot(&key);
        let outcome = {
            let _guard = slot.lock().await;
            self.check_and_act(target, email, &name, &filename, &resolution)
                .await
        };
        drop(slot);
        self.locks.release(&key);

        outcome
    }

    /// 查询台账并执行动作 (调用方持有该收件人的键控锁)
    async fn check_and_act(
        &self,
        target: &DispatchTarget,
        email: &str,
        name: &str,
        filename: &str,
        resolution: &DocumentResolution,
    ) -> RecipientOutcome {
        let already_sent = if resolution.is_available() {
            match self.ledger.exists(&target.period, email).await {
                Ok(sent) => sent,
                Err(e) => {
                    warn!(email, error = %e, "台账查询失败");
                    let error = e.to_string();
                    self.record_failure(target, email, name, &error).await;
                    return RecipientOutcome::Failed { error };
                }
            }
        } else {
            false
        };

        match decide(resolution, already_sent) {
            DeliveryAction::Skip => {
                debug!(email, "已发送, 跳过");
                RecipientOutcome::Skipped
            }
            DeliveryAction::Fail { error } => {
                self.record_failure(target, email, name, &error).await;
                RecipientOutcome::Failed { error }
            }
            DeliveryAction::Send => self.send_and_record(target, email, name, filename).await,
        }
    }

    /// 解析附件 (缺失时生成)
    async fn resolve_document(
        &self,
        rows: &[FlatRow],
        target: &DispatchTarget,
        options: &RenderOptions,
        filename: &str,
    ) -> DocumentResolution {
        let org = target.organization_name.as_str();
        let period = target.period.as_str();

        if self.store.exists(org, period, filename).await {
            return DocumentResolution::Present;
        }

        let row = match find_row_for_document(&self.renderer, rows, filename) {
            Some(row) => row,
            None => {
                return DocumentResolution::Unavailable {
                    reason: format!("no row for {}", filename),
                }
            }
        };

        let bytes = match self.renderer.render(row, options) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(filename, error = %e, "附件生成失败");
                return DocumentResolution::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        match self.store.write(org, period, filename, &bytes).await {
            Ok(()) => {
                debug!(filename, "附件已生成");
                DocumentResolution::Generated
            }
            Err(e) => {
                warn!(filename, error = %e, "附件写入失败");
                DocumentResolution::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn send_and_record(
        &self,
        target: &DispatchTarget,
        email: &str,
        name: &str,
        filename: &str,
    ) -> RecipientOutcome {
        let org = target.organization_name.as_str();
        let period = target.period.as_str();

        let content = match self.store.read(org, period, filename).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(email, error = %e, "附件读取失败");
                let error = ATTACHMENT_NOT_FOUND.to_string();
                self.record_failure(target, email, name, &error).await;
                return RecipientOutcome::Failed { error };
            }
        };

        let mail = OutgoingMail {
            from: self.transport.sender().to_string(),
            to: email.to_string(),
            subject: slip_subject(period, name),
            body_text: slip_body(name, period, Some(org)),
            attachments: vec![MailAttachment::pdf(filename, content)],
        };

        match self.transport.send(&mail).await {
            Ok(message_id) => {
                match self
                    .ledger
                    .record_sent(period, email, Some(name), Some(org))
                    .await
                {
                    Ok(_) => {
                        info!(email, message_id = %message_id, outcome = "SENT", "工资单已发送");
                        RecipientOutcome::Sent { message_id }
                    }
                    Err(e) if e.is_conflict() => {
                        warn!(email, "并发重复发送, 视为已发送");
                        RecipientOutcome::Skipped
                    }
                    Err(e) => {
                        // 无 SENT 记录, 下次运行会重发
                        error!(
                            email,
                            message_id = %message_id,
                            error = %e,
                            "已发送但台账写入失败"
                        );
                        RecipientOutcome::Sent { message_id }
                    }
                }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(email, error = %error, outcome = "FAILED", "工资单发送失败");
                self.record_failure(target, email, name, &error).await;
                RecipientOutcome::Failed { error }
            }
        }
    }

    async fn record_failure(&self, target: &DispatchTarget, email: &str, name: &str, error: &str) {
        if let Err(e) = self
            .ledger
            .record_failed(
                &target.period,
                email,
                Some(name),
                Some(&target.organization_name),
                error,
            )
            .await
        {
            warn!(email, error = %e, "失败记录写入台账失败");
        }
    }
}
