// ==========================================
// 薪资单分发系统 - 邮件发送通道
// ==========================================
// 职责: 邮件发送能力抽象 + SMTP 实现 (lettre)
// 通道选择:
// - service == "gmail": Gmail 预设 (smtp.gmail.com:465, 隐式 TLS)
// - secure: 隐式 TLS (relay)
// - 其他: STARTTLS 强制 (starttls_relay)
// 连接池: 同一批次内复用
// ==========================================

use crate::config::smtp_config::SmtpSettings;
use crate::dispatch::error::{DispatchResult, TransportError, TransportResult};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const GMAIL_RELAY: &str = "smtp.gmail.com";

// ==========================================
// 邮件数据
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct MailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

impl MailAttachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            content_type: PDF_CONTENT_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub attachments: Vec<MailAttachment>,
}

// ==========================================
// MailTransport Trait - 邮件发送能力
// ==========================================
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// 发送邮件, 返回 Message-ID
    async fn send(&self, mail: &OutgoingMail) -> TransportResult<String>;

    /// 默认发件人
    fn sender(&self) -> &str;
}

// ==========================================
// SmtpMailTransport - lettre 实现
// ==========================================
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpMailTransport {
    /// 由已解析的 SMTP 配置构建 (缺少凭据时快速失败)
    pub fn from_settings(settings: &SmtpSettings) -> DispatchResult<Self> {
        let (user, pass) = settings.require_credentials()?;

        let builder = if settings.is_gmail() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(GMAIL_RELAY)
        } else if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map(|b| b.port(settings.port))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map(|b| b.port(settings.port))
        }
        .map_err(|e| TransportError::Smtp(e.to_string()))?;

        let transport = builder
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .build();

        debug!(
            host = %settings.host,
            port = settings.port,
            secure = settings.secure,
            gmail = settings.is_gmail(),
            "SMTP 通道已创建"
        );

        Ok(Self {
            transport,
            sender: settings.from.clone().unwrap_or_else(|| user.to_string()),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    #[instrument(skip(self, mail), fields(to = %mail.to))]
    async fn send(&self, mail: &OutgoingMail) -> TransportResult<String> {
        let (message, message_id) = build_message(mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;
        debug!(message_id = %message_id, "邮件已发送");
        Ok(message_id)
    }

    fn sender(&self) -> &str {
        &self.sender
    }
}

/// 构建 MIME 邮件 (纯文本正文 + 附件)
pub fn build_message(mail: &OutgoingMail) -> TransportResult<(Message, String)> {
    let from: Mailbox = mail
        .from
        .parse()
        .map_err(|e| TransportError::InvalidAddress(format!("{} ({})", mail.from, e)))?;
    let to: Mailbox = mail
        .to
        .trim()
        .parse()
        .map_err(|e| TransportError::InvalidAddress(format!("{} ({})", mail.to, e)))?;

    let domain = from.email.domain().to_string();
    let message_id = format!("<{}@{}>", Uuid::new_v4(), domain);

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(mail.body_text.clone()));
    for attachment in &mail.attachments {
        let content_type = ContentType::parse(&attachment.content_type)
            .map_err(|e| TransportError::MessageBuild(e.to_string()))?;
        body = body.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type),
        );
    }

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.clone())
        .message_id(Some(message_id.clone()))
        .multipart(body)
        .map_err(|e| TransportError::MessageBuild(e.to_string()))?;

    Ok((message, message_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &str) -> OutgoingMail {
        OutgoingMail {
            from: "HRD || SLIP GAJI <hrd@contoh.id>".to_string(),
            to: to.to_string(),
            subject: "Slip gaji bulan Maret 2026 - Budi".to_string(),
            body_text: "halo".to_string(),
            attachments: vec![MailAttachment::pdf("123_Budi.pdf", b"%PDF-1.3".to_vec())],
        }
    }

    #[test]
    fn test_build_message_with_attachment() {
        let (message, id) = build_message(&mail("budi@contoh.id")).unwrap();
        assert!(id.ends_with("@contoh.id>"));
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("123_Budi.pdf"));
        assert!(raw.contains("application/pdf"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let err = build_message(&mail("bukan-email")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress(_)));
    }
}
