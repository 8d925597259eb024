//! IO helper: file read/write for JSON documents and CSV text

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde_json::Value;

use crate::model::data_core::Result;

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: Value = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 将JSON数据保存到文件（格式化输出）
pub fn write_json_file(p: &Path, value: &Value) -> Result<()> {
    let f = File::create(p)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, value)?;
    w.flush()?;
    Ok(())
}

/// 打开文本文件用于流式读取
pub fn open_text_file(p: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(p)?))
}

/// 写入文本文件（覆盖）
pub fn write_text_file(p: &Path, text: &str) -> Result<()> {
    std::fs::write(p, text)?;
    Ok(())
}
