//! 翻译树配置：可从 JSON 文件加载，命令行参数可覆盖

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::model::csv_codec::{CsvOptions, LineTerminator};
use crate::model::data_core::{Result, TranslationError};
use crate::utils::fs::read_json_file;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 整个文档作为范围时根分组的名称
    pub root_name: String,
    /// 文档自身的默认语言，默认语言合并的来源
    pub default_locale: String,
    /// 子项按名称排序
    pub sort_by_name: bool,
    pub show_all_strings: bool,
    pub read_only: bool,
    pub csv_delimiter: char,
    pub line_terminator: LineTerminator,
    /// 允许的语言列表，空表示全部允许
    pub supported_locales: Vec<String>,
    /// 属性名 → 显示名
    pub property_labels: HashMap<String, String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            root_name: "root".to_string(),
            default_locale: "en".to_string(),
            sort_by_name: false,
            show_all_strings: false,
            read_only: false,
            csv_delimiter: ',',
            line_terminator: LineTerminator::Lf,
            supported_locales: Vec::new(),
            property_labels: HashMap::new(),
        }
    }
}

impl TranslationConfig {
    /// 从JSON文件加载，缺省字段取默认值
    pub fn load(path: &Path) -> Result<Self> {
        let value = read_json_file(path)?;
        let config: Self = serde_json::from_value(value)?;
        config.csv_options()?;
        Ok(config)
    }

    /// CSV 选项；分隔符必须是单个 ASCII 字符
    pub fn csv_options(&self) -> Result<CsvOptions> {
        if !self.csv_delimiter.is_ascii() {
            return Err(TranslationError::Config(format!(
                "CSV分隔符必须是ASCII字符: {:?}",
                self.csv_delimiter
            )));
        }
        Ok(CsvOptions {
            delimiter: self.csv_delimiter as u8,
            terminator: self.line_terminator,
        })
    }
}
