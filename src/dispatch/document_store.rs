// ==========================================
// 薪资单分发系统 - 文档存储
// ==========================================
// 路径规则: {root}/{slug(机构)}/{slug(期间)}/{净化后的文件名}
// 文件名: {NIK|"slip"}_{姓名}.pdf, [A-Za-z0-9_.-] 以外的连续字符替换为 "_"
// 写入: 临时文件 + rename (同键重复写入覆盖为等价内容)
// ==========================================

use crate::dispatch::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// 命名规则
// ==========================================

/// 小写, 非 [a-z0-9] 连续字符 → "-", 去掉首尾 "-"
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for ch in s.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// 文件名净化
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// 工资单文件名
pub fn slip_filename(national_id: Option<&str>, employee_name: Option<&str>) -> String {
    let nik = national_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("slip");
    let name = employee_name.map(str::trim).unwrap_or("");
    sanitize_filename(&format!("{}_{}.pdf", nik, name))
}

/// 文档目录 (相对存储根)
pub fn document_dir(organization: &str, period: &str) -> String {
    format!("{}/{}", slugify(organization), slugify(period))
}

// ==========================================
// DocumentStore Trait - 文档存储能力
// ==========================================
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists(&self, organization: &str, period: &str, filename: &str) -> bool;

    async fn write(
        &self,
        organization: &str,
        period: &str,
        filename: &str,
        bytes: &[u8],
    ) -> StoreResult<()>;

    async fn read(&self, organization: &str, period: &str, filename: &str) -> StoreResult<Vec<u8>>;
}

// ==========================================
// FsDocumentStore - 文件系统实现
// ==========================================
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, organization: &str, period: &str, filename: &str) -> PathBuf {
        self.root
            .join(slugify(organization))
            .join(slugify(period))
            .join(sanitize_filename(filename))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn exists(&self, organization: &str, period: &str, filename: &str) -> bool {
        let path = self.path_for(organization, period, filename);
        tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn write(
        &self,
        organization: &str,
        period: &str,
        filename: &str,
        bytes: &[u8],
    ) -> StoreResult<()> {
        let path = self.path_for(organization, period, filename);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        tokio::fs::create_dir_all(&dir).await?;

        let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(path = %path.display(), size = bytes.len(), "文档已写入");
        Ok(())
    }

    async fn read(&self, organization: &str, period: &str, filename: &str) -> StoreResult<Vec<u8>> {
        let path = self.path_for(organization, period, filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("RS Ananda Bekasi"), "rs-ananda-bekasi");
        assert_eq!(slugify("  Maret 2026!! "), "maret-2026");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn test_slip_filename() {
        assert_eq!(slip_filename(Some("123"), Some("Budi Santoso")), "123_Budi_Santoso.pdf");
        assert_eq!(slip_filename(None, Some("Ani")), "slip_Ani.pdf");
        assert_eq!(slip_filename(Some(" "), None), "slip_.pdf");
        assert_eq!(sanitize_filename("a//b c.pdf"), "a_b_c.pdf");
    }

    #[test]
    fn test_document_dir() {
        assert_eq!(document_dir("RS Ananda", "Maret 2026"), "rs-ananda/maret-2026");
    }

    #[tokio::test]
    async fn test_fs_store_write_read_exists() {
        let tmp = TempDir::new().unwrap();
        let store = FsDocumentStore::new(tmp.path());

        assert!(!store.exists("RS Ananda", "Maret 2026", "123_Budi.pdf").await);
        store
            .write("RS Ananda", "Maret 2026", "123_Budi.pdf", b"%PDF-1")
            .await
            .unwrap();
        assert!(store.exists("RS Ananda", "Maret 2026", "123_Budi.pdf").await);
        assert!(tmp.path().join("rs-ananda/maret-2026/123_Budi.pdf").is_file());

        store
            .write("RS Ananda", "Maret 2026", "123_Budi.pdf", b"%PDF-2")
            .await
            .unwrap();
        let bytes = store.read("RS Ananda", "Maret 2026", "123_Budi.pdf").await.unwrap();
        assert_eq!(bytes, b"%PDF-2");
    }

    #[tokio::test]
    async fn test_fs_store_read_missing() {
        let tmp = TempDir::new().unwrap();
        let store = FsDocumentStore::new(tmp.path());
        let err = store.read("x", "y", "z.pdf").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
