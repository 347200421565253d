// ==========================================
// 薪资单分发系统 - 分发层
// ==========================================
// 职责: 附件生成/存储、邮件发送、投递台账记账
// 依赖: 渲染层 (生成缺失附件), 仓储层 (台账)
// ==========================================

pub mod coordinator;
pub mod document_store;
pub mod error;
pub mod mail_transport;
pub mod planner;
pub mod template;

pub use coordinator::{DispatchCoordinator, RecipientLocks, DEFAULT_MAX_IN_FLIGHT};
pub use document_store::{
    document_dir, sanitize_filename, slip_filename, slugify, DocumentStore, FsDocumentStore,
};
pub use error::{
    DispatchError, DispatchResult, StoreError, StoreResult, TransportError, TransportResult,
};
pub use mail_transport::{MailAttachment, MailTransport, OutgoingMail, SmtpMailTransport};
pub use planner::{decide, DeliveryAction, DocumentResolution, ATTACHMENT_NOT_FOUND};
pub use template::{slip_body, slip_subject};
