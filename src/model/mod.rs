pub mod csv_codec;
pub mod data_core;
pub mod field;
pub mod host;
pub mod json_host;
pub mod locales;
pub mod path_index;
pub mod shadow_tree;
