//! 多语言翻译树库
//!
//! 从可反射的宿主对象图派生剪枝后的可翻译叶子/分组树，协调已知语言，
//! 并通过路径键扁平化的 CSV 表格无损导出/导入所有文本。

pub mod config;
pub mod model;
pub mod utils;

// 重新导出主要类型
pub use config::TranslationConfig;
pub use model::csv_codec::{CsvOptions, ImportReport, LineTerminator, RowOutcome};
pub use model::data_core::{Result, TranslationChange, TranslationError, TranslationTree};
pub use model::field::{FieldHandle, LocalizableField, LocalizedText, DEFAULT_LOCALE};
pub use model::host::{ChoiceParts, HostObject, HostRef, PropertyDescriptor, SchemaReflector};
pub use model::json_host::{JsonDocument, SchemaDefinition};
pub use model::locales::{LocaleEntry, LocaleRegistry};
pub use model::path_index::PathKeyIndex;
pub use model::shadow_tree::{GroupHost, GroupNode, LeafNode, TreeContext, TreeItem};
