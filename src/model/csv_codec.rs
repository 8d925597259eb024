//! CSV 编解码：路径键扁平化后的多语言表格导出/导入
//!
//! 第 0 行为表头（首格为说明文字，其余为语言），第 0 列为路径键，其余列为各语言文本。

use std::io::Read;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::model::data_core::{Result, TranslationError};
use crate::model::field::{DEFAULT_LOCALE, DEFAULT_LOCALE_LABEL};
use crate::model::path_index::PathKeyIndex;
use crate::model::shadow_tree::GroupNode;

/// 表头首格
pub const DESCRIPTION_HEADER: &str = "description ↓ - language →";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    Lf,
    Crlf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub terminator: LineTerminator,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            terminator: LineTerminator::Lf,
        }
    }
}

/// 语言 → 表头标签（默认语言写作 `default`）
pub fn locale_label(locale: &str) -> &str {
    if locale.is_empty() {
        DEFAULT_LOCALE_LABEL
    } else {
        locale
    }
}

/// 表头标签 → 语言
pub fn label_locale(label: &str) -> &str {
    if label == DEFAULT_LOCALE_LABEL {
        DEFAULT_LOCALE
    } else {
        label
    }
}

/// 构建导出表格的行（不含序列化）
pub fn export_rows(root: &GroupNode, visible_locales: &[String]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut header = vec![DESCRIPTION_HEADER.to_string()];
    header.extend(visible_locales.iter().map(|l| locale_label(l).to_string()));
    rows.push(header);

    let index = PathKeyIndex::build(root);
    for (key, leaf) in index.iter() {
        let mut row = Vec::with_capacity(visible_locales.len() + 1);
        row.push(key.to_string());
        for (i, locale) in visible_locales.iter().enumerate() {
            let text = leaf.text(locale);
            // 仅第一列语言以默认值兜底
            if text.is_empty() && i == 0 {
                row.push(leaf.default_value().to_string());
            } else {
                row.push(text);
            }
        }
        rows.push(row);
    }
    rows
}

/// 按标准 CSV 规则序列化表格（空单元格保留）
pub fn write_rows(rows: &[Vec<String>], options: &CsvOptions) -> Result<String> {
    let terminator = match options.terminator {
        LineTerminator::Lf => Terminator::Any(b'\n'),
        LineTerminator::Crlf => Terminator::CRLF,
    };
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .terminator(terminator)
        .quote_style(QuoteStyle::Necessary)
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TranslationError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| TranslationError::State(e.to_string()))
}

/// 导出当前树为 CSV 文本
pub fn encode(root: &GroupNode, visible_locales: &[String], options: &CsvOptions) -> Result<String> {
    let rows = export_rows(root, visible_locales);
    tracing::info!("导出 {} 行，{} 个语言列", rows.len() - 1, visible_locales.len());
    write_rows(&rows, options)
}

/// 解析 CSV 为字符串行（行长可不一致）
pub fn parse_rows<R: Read>(reader: R, options: &CsvOptions) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// 表头中的语言列（丢弃首格）
pub fn header_locales(header: &[String]) -> Vec<String> {
    header
        .iter()
        .skip(1)
        .map(|label| label_locale(label).to_string())
        .collect()
}

/// 单行处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// 已匹配到叶子；`mismatched` 表示列数与表头不一致
    Applied { cells: usize, mismatched: bool },
    BlankKey,
    UnknownKey(String),
}

/// 导入统计；核心从不失败，调用方可据此做严格校验
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rows: usize,
    pub applied: usize,
    pub blank_keys: usize,
    pub unknown_keys: Vec<String>,
    pub cells_written: usize,
    pub mismatched_rows: usize,
}

impl ImportReport {
    fn record(&mut self, outcome: RowOutcome) {
        self.rows += 1;
        match outcome {
            RowOutcome::Applied { cells, mismatched } => {
                self.applied += 1;
                self.cells_written += cells;
                if mismatched {
                    self.mismatched_rows += 1;
                }
            }
            RowOutcome::BlankKey => self.blank_keys += 1,
            RowOutcome::UnknownKey(key) => self.unknown_keys.push(key),
        }
    }
}

/// 将一行写入索引中匹配的叶子；空白单元格表示“不变”而非删除
pub fn apply_row(row: &[String], locales: &[String], index: &PathKeyIndex<'_>) -> RowOutcome {
    let Some((key, values)) = row.split_first() else {
        return RowOutcome::BlankKey;
    };
    let key = key.trim();
    if key.is_empty() {
        return RowOutcome::BlankKey;
    }
    let Some(leaf) = index.get(key) else {
        return RowOutcome::UnknownKey(key.to_string());
    };
    let mut cells = 0;
    for (value, locale) in values.iter().zip(locales) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        leaf.set_text(locale, Some(value));
        cells += 1;
    }
    RowOutcome::Applied {
        cells,
        mismatched: values.len() != locales.len(),
    }
}

/// 处理完整表格（首行为表头）
pub fn apply_rows(rows: &[Vec<String>], index: &PathKeyIndex<'_>) -> ImportReport {
    let mut report = ImportReport::default();
    let Some((header, body)) = rows.split_first() else {
        return report;
    };
    let locales = header_locales(header);
    for row in body {
        let outcome = apply_row(row, &locales, index);
        match &outcome {
            RowOutcome::BlankKey => tracing::debug!("跳过空路径键行"),
            RowOutcome::UnknownKey(key) => tracing::debug!("跳过未知路径键: {}", key),
            RowOutcome::Applied { .. } => {}
        }
        report.record(outcome);
    }
    report
}
