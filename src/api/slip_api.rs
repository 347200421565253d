// ==========================================
// 薪资单分发系统 - 工资单 API
// ==========================================
// 职责: 面向 CLI 的用例门面
// - 解析上传文件
// - 单张预览 / 批量生成 / 保存客户端文档
// - 批量分发 / 单封发送 / SMTP 测试
// - 设置与台账查询
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::settings_provider::{setting_keys, SettingsProvider};
use crate::config::smtp_config::{SmtpOverrides, SmtpSettings};
use crate::dispatch::coordinator::{DispatchCoordinator, RecipientLocks};
use crate::dispatch::document_store::{document_dir, sanitize_filename, DocumentStore};
use crate::dispatch::mail_transport::{MailAttachment, MailTransport, OutgoingMail, SmtpMailTransport};
use crate::dispatch::planner::row_filename;
use crate::dispatch::template::{slip_body, slip_subject};
use crate::domain::delivery::{
    DeliveryLogEntry, DeliveryLogFilter, DispatchSummary, DispatchTarget,
};
use crate::domain::slip::{FlatRow, SlipImportResult};
use crate::i18n::t;
use crate::importer::error::ImportError;
use crate::importer::slip_normalizer::SlipNormalizer;
use crate::render::error::RenderError;
use crate::render::slip_renderer::{PayslipRenderer, RenderOptions};
use crate::repository::delivery_log_repo::{DeliveryLedger, DeliveryLogRepository};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// 机构名缺省值
pub const DEFAULT_ORGANIZATION: &str = "rs";
/// 期间缺省值
pub const DEFAULT_PERIOD: &str = "periode";
/// 设置列表中敏感值的掩码
pub const SECRET_MASK: &str = "********";

/// 环境变量读取函数
pub type EnvReader = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

// ==========================================
// 响应类型
// ==========================================

/// 批量生成 / 保存文档的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDocuments {
    pub saved: usize,
    pub dir: String,
    pub files: Vec<String>,
}

/// SMTP 测试响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpTestResponse {
    pub message_id: String,
    pub to: String,
}

/// 期间投递统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period: String,
    pub sent: usize,
    pub failed: usize,
}

// ==========================================
// SlipApi
// ==========================================
pub struct SlipApi {
    normalizer: SlipNormalizer,
    renderer: PayslipRenderer,
    ledger: Arc<DeliveryLogRepository>,
    settings: Arc<SettingsProvider>,
    store: Arc<dyn DocumentStore>,
    locks: Arc<RecipientLocks>,
    env: EnvReader,
    logo: Option<Vec<u8>>,
    max_in_flight: usize,
}

impl SlipApi {
    pub fn new(
        ledger: Arc<DeliveryLogRepository>,
        settings: Arc<SettingsProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            normalizer: SlipNormalizer::default(),
            renderer: PayslipRenderer::default(),
            ledger,
            settings,
            store,
            locks: Arc::new(RecipientLocks::new()),
            env: Arc::new(|key: &str| std::env::var(key).ok()),
            logo: None,
            max_in_flight: 1,
        }
    }

    /// 替换环境变量来源
    pub fn with_env(mut self, env: EnvReader) -> Self {
        self.env = env;
        self
    }

    /// 机构 logo (PNG / JPEG)
    pub fn with_logo(mut self, logo: Option<Vec<u8>>) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 解析上传的工作簿
    ///
    /// # 返回
    /// - Err(Import(HeaderNotFound)): 未识别出表头 (提示用户检查工作表)
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn parse(&self, bytes: &[u8], file_name: Option<&str>) -> ApiResult<SlipImportResult> {
        let result = self.normalizer.parse(bytes, file_name)?;
        if result.is_empty() {
            return Err(ImportError::HeaderNotFound {
                sheet: result.sheet_name,
            }
            .into());
        }
        info!(
            sheet = %result.sheet_name,
            rows = result.rows.len(),
            "工作簿解析完成"
        );
        Ok(result)
    }

    // ==========================================
    // 生成
    // ==========================================

    fn render_options(&self, organization: &str, address: &str, period: &str) -> RenderOptions {
        RenderOptions::new(organization, address, period).with_logo(self.logo.clone())
    }

    /// 单张工资单 (预览/下载)
    pub fn render_slip(
        &self,
        row: &FlatRow,
        organization: &str,
        address: &str,
        period: &str,
    ) -> ApiResult<Vec<u8>> {
        let options = self.render_options(organization, address, period);
        Ok(self.renderer.render(row, &options)?)
    }

    /// 批量生成并写入文档存储
    #[instrument(skip(self, rows, address), fields(rows = rows.len()))]
    pub async fn generate_batch(
        &self,
        rows: &[FlatRow],
        organization: &str,
        address: &str,
        period: &str,
    ) -> ApiResult<SavedDocuments> {
        if rows.is_empty() {
            return Err(RenderError::EmptyRows.into());
        }
        let organization = or_default(organization, DEFAULT_ORGANIZATION);
        let period = or_default(period, DEFAULT_PERIOD);
        let options = self.render_options(organization, address, period);

        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            let bytes = self.renderer.render(row, &options)?;
            let filename = row_filename(&self.renderer, row);
            self.store.write(organization, period, &filename, &bytes).await?;
            files.push(filename);
        }

        info!(saved = files.len(), "工资单批量生成完成");
        Ok(SavedDocuments {
            saved: files.len(),
            dir: document_dir(organization, period),
            files,
        })
    }

    /// 保存客户端已生成的文档
    pub async fn save_documents(
        &self,
        organization: &str,
        period: &str,
        documents: Vec<(String, Vec<u8>)>,
    ) -> ApiResult<SavedDocuments> {
        if documents.is_empty() {
            return Err(ApiError::InvalidInput("files required".to_string()));
        }
        let organization = or_default(organization, DEFAULT_ORGANIZATION);
        let period = or_default(period, DEFAULT_PERIOD);

        let mut files = Vec::with_capacity(documents.len());
        for (name, bytes) in documents {
            let filename = sanitize_filename(&name);
            self.store.write(organization, period, &filename, &bytes).await?;
            files.push(filename);
        }

        Ok(SavedDocuments {
            saved: files.len(),
            dir: document_dir(organization, period),
            files,
        })
    }

    // ==========================================
    // 发送
    // ==========================================

    /// 解析 SMTP 配置 (覆写 → 已存储 → 环境变量 → 默认)
    pub fn resolve_smtp(&self, overrides: &SmtpOverrides) -> ApiResult<SmtpSettings> {
        Ok(SmtpSettings::resolve(&self.settings, overrides, &*self.env)?)
    }

    fn smtp_transport(&self, overrides: &SmtpOverrides) -> ApiResult<SmtpMailTransport> {
        let settings = self.resolve_smtp(overrides)?;
        Ok(SmtpMailTransport::from_settings(&settings)?)
    }

    /// 批量分发 (缺少凭据时在发送前失败)
    pub async fn dispatch(
        &self,
        rows: &[FlatRow],
        target: &DispatchTarget,
    ) -> ApiResult<DispatchSummary> {
        if target.recipients.is_empty() {
            return Err(crate::dispatch::error::DispatchError::InvalidInput(
                "recipients required".to_string(),
            )
            .into());
        }
        let transport = Arc::new(self.smtp_transport(&SmtpOverrides::default())?);
        self.dispatch_with(transport, rows, target).await
    }

    /// 以指定邮件通道分发
    pub async fn dispatch_with(
        &self,
        transport: Arc<dyn MailTransport>,
        rows: &[FlatRow],
        target: &DispatchTarget,
    ) -> ApiResult<DispatchSummary> {
        let mut target = target.clone();
        target.organization_name =
            or_default(&target.organization_name, DEFAULT_ORGANIZATION).to_string();
        target.period = or_default(&target.period, DEFAULT_PERIOD).to_string();

        let coordinator = DispatchCoordinator::new(self.ledger.clone(), self.store.clone(), transport)
            .with_locks(self.locks.clone())
            .with_logo(self.logo.clone())
            .with_max_in_flight(self.max_in_flight);
        Ok(coordinator.dispatch(rows, &target).await?)
    }

    /// 单封发送 (不记台账)
    pub async fn send_single(
        &self,
        to: &str,
        name: Option<&str>,
        period: &str,
        organization: Option<&str>,
        attachments: Vec<MailAttachment>,
    ) -> ApiResult<String> {
        let transport = self.smtp_transport(&SmtpOverrides::default())?;
        self.send_single_with(&transport, to, name, period, organization, attachments)
            .await
    }

    pub async fn send_single_with(
        &self,
        transport: &dyn MailTransport,
        to: &str,
        name: Option<&str>,
        period: &str,
        organization: Option<&str>,
        attachments: Vec<MailAttachment>,
    ) -> ApiResult<String> {
        if to.trim().is_empty() {
            return Err(ApiError::InvalidInput("Field 'to' is required".to_string()));
        }
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Karyawan");

        let mail = OutgoingMail {
            from: transport.sender().to_string(),
            to: to.trim().to_string(),
            subject: slip_subject(period, name),
            body_text: slip_body(name, period, organization),
            attachments: attachments
                .into_iter()
                .map(|mut a| {
                    a.filename = sanitize_filename(&a.filename);
                    a
                })
                .collect(),
        };
        Ok(transport.send(&mail).await?)
    }

    /// SMTP 测试: 发送测试邮件到 to (缺省为 SMTP 用户本人)
    pub async fn test_smtp(
        &self,
        to: Option<&str>,
        overrides: &SmtpOverrides,
    ) -> ApiResult<SmtpTestResponse> {
        let settings = self.resolve_smtp(overrides)?;
        let (user, _) = settings.require_credentials()?;
        let recipient = to
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(user)
            .to_string();
        let transport = SmtpMailTransport::from_settings(&settings)?;
        self.send_test_mail(&transport, &recipient).await
    }

    pub async fn send_test_mail(
        &self,
        transport: &dyn MailTransport,
        to: &str,
    ) -> ApiResult<SmtpTestResponse> {
        let mail = OutgoingMail {
            from: transport.sender().to_string(),
            to: to.to_string(),
            subject: t("smtp.test_subject"),
            body_text: format!(
                "{} ({})",
                t("smtp.test_body"),
                Local::now().format("%d/%m/%Y %H:%M:%S")
            ),
            attachments: Vec::new(),
        };
        let message_id = transport.send(&mail).await?;
        Ok(SmtpTestResponse {
            message_id,
            to: to.to_string(),
        })
    }

    // ==========================================
    // 设置
    // ==========================================

    /// 更新设置 (仅接受已知键, 空值忽略)
    pub fn update_settings(&self, entries: &BTreeMap<String, String>) -> ApiResult<usize> {
        for (key, value) in entries {
            if !setting_keys::ALL.contains(&key.as_str()) {
                return Err(ApiError::InvalidInput(format!("unknown setting {}", key)));
            }
            if key == setting_keys::SMTP_PORT
                && !value.trim().is_empty()
                && value.trim().parse::<u16>().is_err()
            {
                return Err(crate::config::error::ConfigError::InvalidValue {
                    key: key.clone(),
                    value: value.clone(),
                }
                .into());
            }
        }
        Ok(self.settings.set_many(entries)?)
    }

    /// 列出已存储设置 (敏感值打码)
    pub fn list_settings(&self) -> ApiResult<BTreeMap<String, String>> {
        let mut settings = self.settings.list()?;
        for (key, value) in settings.iter_mut() {
            if setting_keys::is_secret(key) {
                *value = SECRET_MASK.to_string();
            }
        }
        Ok(settings)
    }

    // ==========================================
    // 台账
    // ==========================================

    pub async fn list_logs(
        &self,
        filter: &DeliveryLogFilter,
        limit: usize,
    ) -> ApiResult<Vec<DeliveryLogEntry>> {
        Ok(self.ledger.list(filter, limit).await?)
    }

    pub fn period_stats(&self, period: &str) -> ApiResult<PeriodStats> {
        let (sent, failed) = self.ledger.count_by_period(period)?;
        Ok(PeriodStats {
            period: period.to_string(),
            sent,
            failed,
        })
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}
