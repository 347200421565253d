// ==========================================
// 薪资单分发系统 - 薪资单导入领域模型
// ==========================================
// 职责: 表头单元、规范化列、扁平行、结构化记录、导入结果
// 红线: FlatRow 的键集合在解析时确定,随行携带
// ==========================================

use crate::domain::types::{CellValue, IdentityRole, PayrollCategory};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ==========================================
// HeaderCell - 两级表头单元
// ==========================================
// top: 合并的类别表头 (向右延续); sub: 其下方的具体列名
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderCell {
    pub top: String,
    pub sub: String,
}

// ==========================================
// NormalizedColumn - 规范化列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedColumn {
    pub display_label: String,
    pub category: Option<PayrollCategory>,
    pub identity_role: Option<IdentityRole>,
    pub is_total: bool, // 合计列 (jml/jumlah/total),不进入明细
}

// ==========================================
// FlatRow - 扁平行 (displayLabel → 原始值)
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    headers: Arc<[String]>,
    values: Vec<CellValue>,
}

impl FlatRow {
    /// 以共享表头构建 (缺失单元补空)
    pub fn new(headers: Arc<[String]>, mut values: Vec<CellValue>) -> Self {
        values.resize(headers.len(), CellValue::Empty);
        Self { headers, values }
    }

    /// 从 (键, 值) 序列构建,键顺序即列顺序
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let (headers, values): (Vec<String>, Vec<CellValue>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self::new(headers.into(), values)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.headers
            .iter()
            .position(|h| h == label)
            .map(|idx| &self.values[idx])
    }

    /// 按列顺序遍历 (键, 值)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for FlatRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (k, v) in self.entries() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// 反序列化保持 JSON 对象的键顺序
impl<'de> Deserialize<'de> for FlatRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlatRowVisitor;

        impl<'de> Visitor<'de> for FlatRowVisitor {
            type Value = FlatRow;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of column label to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FlatRow, A::Error> {
                let mut pairs: Vec<(String, CellValue)> = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, CellValue>()? {
                    pairs.push((key, value));
                }
                Ok(FlatRow::from_pairs(pairs))
            }
        }

        deserializer.deserialize_map(FlatRowVisitor)
    }
}

// ==========================================
// LineItem - 明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "nilai")]
    pub amount: f64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

// ==========================================
// NormalizedRecord - 结构化员工记录
// ==========================================
// 对齐: 前端/历史 JSON 字段名 (nama_karyawan, pendapatan, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(rename = "nama_karyawan", skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "nik", skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(rename = "jabatan", skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(rename = "no_rekening", skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,

    #[serde(rename = "pendapatan")]
    pub earnings: Vec<LineItem>,
    #[serde(rename = "potongan_wajib")]
    pub mandatory_deductions: Vec<LineItem>,
    #[serde(rename = "potongan_hutang")]
    pub debt_deductions: Vec<LineItem>,
    #[serde(rename = "tunjangan_dibayarkan")]
    pub disbursed_allowances: Vec<LineItem>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, CellValue>,
}

impl NormalizedRecord {
    pub fn identity(&self, role: IdentityRole) -> Option<&str> {
        match role {
            IdentityRole::EmployeeName => self.employee_name.as_deref(),
            IdentityRole::Email => self.email.as_deref(),
            IdentityRole::NationalId => self.national_id.as_deref(),
            IdentityRole::Position => self.position.as_deref(),
            IdentityRole::BankAccount => self.bank_account.as_deref(),
        }
    }

    /// 设置身份字段; 已有值时保持不变 (先到先得)
    ///
    /// 返回是否写入
    pub fn set_identity_if_absent(&mut self, role: IdentityRole, value: String) -> bool {
        let slot = match role {
            IdentityRole::EmployeeName => &mut self.employee_name,
            IdentityRole::Email => &mut self.email,
            IdentityRole::NationalId => &mut self.national_id,
            IdentityRole::Position => &mut self.position,
            IdentityRole::BankAccount => &mut self.bank_account,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    pub fn items(&self, category: PayrollCategory) -> &[LineItem] {
        match category {
            PayrollCategory::Earnings => &self.earnings,
            PayrollCategory::MandatoryDeduction => &self.mandatory_deductions,
            PayrollCategory::DebtDeduction => &self.debt_deductions,
            PayrollCategory::DisbursedAllowance => &self.disbursed_allowances,
        }
    }

    pub fn items_mut(&mut self, category: PayrollCategory) -> &mut Vec<LineItem> {
        match category {
            PayrollCategory::Earnings => &mut self.earnings,
            PayrollCategory::MandatoryDeduction => &mut self.mandatory_deductions,
            PayrollCategory::DebtDeduction => &mut self.debt_deductions,
            PayrollCategory::DisbursedAllowance => &mut self.disbursed_allowances,
        }
    }
}

// ==========================================
// SlipImportResult - 一次上传的解析结果
// ==========================================
// 生命周期: 每个上传文件创建一次,不落库
#[derive(Debug, Clone, Default, Serialize)]
pub struct SlipImportResult {
    pub sheet_name: String,
    pub header_row: Option<usize>,
    pub headers: Vec<String>,
    pub header_groups: Vec<Option<String>>,
    pub columns: Vec<NormalizedColumn>,
    #[serde(rename = "rowsFlat")]
    pub rows: Vec<FlatRow>,
    #[serde(rename = "normalized")]
    pub records: Vec<NormalizedRecord>,
    #[serde(rename = "periode", skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl SlipImportResult {
    /// 未找到表头时的空结果 (非异常,由调用方提示用户)
    pub fn empty(sheet_name: impl Into<String>, period: Option<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            period,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_row_pads_missing_cells() {
        let headers: Arc<[String]> = vec!["NIK".to_string(), "NAMA".to_string()].into();
        let row = FlatRow::new(headers, vec![CellValue::from("123")]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("NAMA"), Some(&CellValue::Empty));
        assert_eq!(row.get("TIDAK ADA"), None);
    }

    #[test]
    fn test_flat_row_serializes_in_column_order() {
        let row = FlatRow::from_pairs([("NIK", CellValue::from("1")), ("NAMA", CellValue::from("Ani"))]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"NIK":"1","NAMA":"Ani"}"#);
    }

    #[test]
    fn test_flat_row_deserializes_in_document_order() {
        let row: FlatRow =
            serde_json::from_str(r#"{"NAMA":"Ani","NIK":"1","GAJI BERSIH":4800000}"#).unwrap();
        assert_eq!(row.headers(), ["NAMA", "NIK", "GAJI BERSIH"]);
        assert_eq!(row.get("GAJI BERSIH"), Some(&CellValue::Number(4800000.0)));
    }

    #[test]
    fn test_identity_first_wins() {
        let mut rec = NormalizedRecord::default();
        assert!(rec.set_identity_if_absent(IdentityRole::EmployeeName, "Budi".into()));
        assert!(!rec.set_identity_if_absent(IdentityRole::EmployeeName, "Ani".into()));
        assert_eq!(rec.identity(IdentityRole::EmployeeName), Some("Budi"));
    }
}
