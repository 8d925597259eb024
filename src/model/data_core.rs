//! TranslationTree：翻译树的核心状态（范围、显示过滤、语言登记）与导入导出/合并操作

use std::{io::Read, path::Path, rc::Rc};

use thiserror::Error;

use crate::config::TranslationConfig;
use crate::model::csv_codec::{self, ImportReport};
use crate::model::host::{HostRef, SchemaReflector};
use crate::model::locales::LocaleRegistry;
use crate::model::path_index::PathKeyIndex;
use crate::model::shadow_tree::{GroupHost, GroupNode, TreeContext};
use crate::utils::fs::{open_text_file, write_text_file};

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV解析失败: {0}")]
    Csv(#[from] csv::Error),
    #[error("配置错误: {0}")]
    Config(String),
    #[error("状态错误: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, TranslationError>;

/// 单个叶子被编辑后的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationChange {
    pub path: String,
    pub name: String,
    pub locale: String,
    pub value: String,
}

type ImportFinishedCallback = Box<dyn FnMut(&ImportReport)>;
type TranslationChangedCallback = Box<dyn FnMut(&TranslationChange)>;

/// 翻译树编排器：持有根分组与语言登记表
pub struct TranslationTree {
    document: HostRef,
    reflector: Rc<dyn SchemaReflector>,
    config: TranslationConfig,
    filtered: Option<HostRef>,
    show_all_strings: bool,
    read_only: bool,
    root: GroupNode,
    locales: LocaleRegistry,
    is_empty: bool,
    import_finished: Option<ImportFinishedCallback>,
    translation_changed: Option<TranslationChangedCallback>,
}

impl TranslationTree {
    pub fn new(document: HostRef, reflector: Rc<dyn SchemaReflector>, config: TranslationConfig) -> Self {
        let show_all_strings = config.show_all_strings;
        let read_only = config.read_only;
        let root = Self::build_root(&document, None, reflector.as_ref(), &config, show_all_strings, read_only);
        let locales = LocaleRegistry::new(config.supported_locales.clone());
        let mut tree = Self {
            document,
            reflector,
            config,
            filtered: None,
            show_all_strings,
            read_only,
            root,
            locales,
            is_empty: true,
            import_finished: None,
            translation_changed: None,
        };
        tree.after_build();
        tree
    }

    fn build_root(
        document: &HostRef,
        filtered: Option<&HostRef>,
        reflector: &dyn SchemaReflector,
        config: &TranslationConfig,
        show_all_strings: bool,
        read_only: bool,
    ) -> GroupNode {
        let mut ctx = TreeContext::new(reflector, &config.property_labels);
        ctx.show_all_strings = show_all_strings;
        ctx.read_only = read_only;
        ctx.sort_by_name = config.sort_by_name;
        let (scope, name) = match filtered {
            Some(obj) => (obj.clone(), obj.name().unwrap_or_default().to_string()),
            None => (document.clone(), config.root_name.clone()),
        };
        let mut root = GroupNode::new(name, GroupHost::Object(scope), &ctx, None);
        root.set_as_root();
        root
    }

    /// 以当前范围构建一棵独立的树
    fn build_tree(&self, show_all_strings: bool) -> GroupNode {
        Self::build_root(
            &self.document,
            self.filtered.as_ref(),
            self.reflector.as_ref(),
            &self.config,
            show_all_strings,
            self.read_only,
        )
    }

    fn after_build(&mut self) {
        self.reset_locales();
        self.is_empty = !self.root.has_items();
    }

    /// 重建根分组并重新发现语言
    pub fn reset(&mut self) {
        self.root = self.build_tree(self.show_all_strings);
        self.after_build();
        tracing::info!(
            "翻译树已重建: 根 {}，{} 个子项，语言 {:?}",
            self.root.name(),
            self.root.items().len(),
            self.locales.locales()
        );
    }

    pub fn root(&self) -> &GroupNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut GroupNode {
        &mut self.root
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn locales(&self) -> &LocaleRegistry {
        &self.locales
    }

    /// 树中没有任何可翻译字段
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn show_all_strings(&self) -> bool {
        self.show_all_strings
    }

    pub fn set_show_all_strings(&mut self, show_all_strings: bool) {
        if self.show_all_strings != show_all_strings {
            self.show_all_strings = show_all_strings;
            self.reset();
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        if self.read_only != read_only {
            self.read_only = read_only;
            self.reset();
        }
    }

    pub fn filtered_object(&self) -> Option<&HostRef> {
        self.filtered.as_ref()
    }

    /// 绑定到单个子对象（如某一页），`None` 恢复为整个文档
    pub fn set_filtered_object(&mut self, filtered: Option<HostRef>) {
        self.filtered = filtered;
        self.reset();
    }

    pub fn on_import_finished(&mut self, callback: impl FnMut(&ImportReport) + 'static) {
        self.import_finished = Some(Box::new(callback));
    }

    pub fn on_translation_changed(&mut self, callback: impl FnMut(&TranslationChange) + 'static) {
        self.translation_changed = Some(Box::new(callback));
    }

    // === 语言 ===

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.has_locale(locale)
    }

    /// 添加语言，已存在时无操作
    pub fn add_locale(&mut self, locale: &str) -> bool {
        self.locales.add_locale(locale)
    }

    /// 从默认语言开始遍历整棵树重新收集语言，合并进登记表
    pub fn reset_locales(&mut self) {
        let mut locales = vec![String::new()];
        self.root.fill_locales(&mut locales);
        self.locales.set_locales(&locales);
    }

    pub fn selected_locales(&self) -> Vec<String> {
        self.locales.visible_locales()
    }

    pub fn set_selected_locales<S: AsRef<str>>(&mut self, selected: &[S]) {
        self.locales.set_selected_locales(selected);
    }

    pub fn set_supported_locales(&mut self, supported: Vec<String>) {
        self.locales.set_supported(supported);
    }

    /// 目录中可供添加的语言
    pub fn available_locales<S: AsRef<str>>(&self, catalog: &[S]) -> Vec<String> {
        self.locales.available_locales(catalog, &self.config.default_locale)
    }

    pub fn default_locale(&self) -> &str {
        &self.config.default_locale
    }

    pub fn can_merge_locale_with_default(&self) -> bool {
        self.has_locale(&self.config.default_locale)
    }

    // === 默认语言合并 ===

    /// 将文档默认语言（配置项）的文本提升到默认槽位
    pub fn merge_locale_with_default(&mut self) -> bool {
        let source = self.config.default_locale.clone();
        self.merge_locale_into_default(&source)
    }

    /// 破坏性提升：source 语言非空文本写入默认槽位并清除 source；之后登记表收缩为仅默认语言
    pub fn merge_locale_into_default(&mut self, source: &str) -> bool {
        if source.is_empty() || !self.has_locale(source) {
            return false;
        }
        self.root.merge_locale_with_default(source);
        self.locales.reset_to_default();
        self.reset();
        tracing::info!("已将语言 {} 合并到默认语言", source);
        true
    }

    // === 编辑 ===

    /// 通过路径键编辑当前显示树中的一个叶子，并触发变更回调
    pub fn set_text(&mut self, path: &str, locale: &str, value: &str) -> bool {
        if self.read_only {
            return false;
        }
        let index = PathKeyIndex::build(&self.root);
        let Some(leaf) = index.get(path) else {
            tracing::debug!("未找到路径键: {}", path);
            return false;
        };
        leaf.set_text(locale, Some(value));
        let change = TranslationChange {
            path: path.to_string(),
            name: leaf.name().to_string(),
            locale: locale.to_string(),
            value: value.to_string(),
        };
        if let Some(callback) = self.translation_changed.as_mut() {
            callback(&change);
        }
        true
    }

    pub fn expand_all(&mut self) {
        self.root.expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.root.collapse_all();
    }

    // === CSV ===

    /// 导出可见语言为 CSV 文本
    pub fn export_to_csv(&self) -> Result<String> {
        let options = self.config.csv_options()?;
        csv_codec::encode(&self.root, &self.locales.visible_locales(), &options)
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        let text = self.export_to_csv()?;
        write_text_file(path, &text)?;
        tracing::info!("CSV已保存到: {}", path.display());
        Ok(())
    }

    /// 导入已解析的表格行（首行为表头）；未匹配的行被跳过
    pub fn import_from_rows(&mut self, rows: &[Vec<String>]) -> ImportReport {
        // 独立的全量树：保证任何可导出的叶子都能被匹配，与当前显示过滤无关
        let import_root = self.build_tree(true);
        let index = PathKeyIndex::build(&import_root);
        let report = csv_codec::apply_rows(rows, &index);
        tracing::info!(
            "导入完成: {} 行，应用 {} 行，写入 {} 个单元格，未知键 {} 个，空键 {} 个",
            report.rows,
            report.applied,
            report.cells_written,
            report.unknown_keys.len(),
            report.blank_keys
        );
        self.reset();
        if let Some(callback) = self.import_finished.as_mut() {
            callback(&report);
        }
        report
    }

    pub fn import_from_reader<R: Read>(&mut self, reader: R) -> Result<ImportReport> {
        let options = self.config.csv_options()?;
        let rows = csv_codec::parse_rows(reader, &options)?;
        Ok(self.import_from_rows(&rows))
    }

    pub fn import_from_csv(&mut self, text: &str) -> Result<ImportReport> {
        self.import_from_reader(text.as_bytes())
    }

    pub fn import_from_file(&mut self, path: &Path) -> Result<ImportReport> {
        let reader = open_text_file(path)?;
        self.import_from_reader(reader)
    }
}
