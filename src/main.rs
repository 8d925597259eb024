//! 程序入口：初始化日志，解析命令行，对 JSON 文档执行导出/导入/合并

use std::{path::PathBuf, rc::Rc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fanyi_shu::{
    model::csv_codec::{label_locale, locale_label}, JsonDocument, SchemaDefinition, TranslationConfig, TranslationTree,
};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Debug, Parser)]
#[command(
    name = "fanyi_shu",
    about = "Export, import and merge localized strings of a JSON document via CSV",
    version
)]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct DocumentArgs {
    /// JSON 文档路径
    #[arg(short, long)]
    document: PathBuf,

    /// 模式文件（缺省使用内置问卷模式）
    #[arg(long)]
    schema: Option<PathBuf>,

    /// 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 只处理指定名称的页面
    #[arg(long)]
    page: Option<String>,

    /// 允许的语言列表（逗号分隔）
    #[arg(long, value_delimiter = ',')]
    supported: Vec<String>,

    /// 子项按名称排序
    #[arg(long)]
    sort: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export localized strings to CSV.
    Export {
        #[command(flatten)]
        doc: DocumentArgs,
        /// 导出的语言列（`default` 表示默认语言），缺省为全部已知语言
        #[arg(long, value_delimiter = ',')]
        locales: Vec<String>,
        /// 包含空字符串
        #[arg(long)]
        all: bool,
        /// 输出文件，缺省写到标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a CSV file and write the document back.
    Import {
        #[command(flatten)]
        doc: DocumentArgs,
        #[arg(long)]
        csv: PathBuf,
        /// 输出文件，缺省覆盖原文档
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Promote a locale's text into the default locale.
    Merge {
        #[command(flatten)]
        doc: DocumentArgs,
        /// 来源语言，缺省为配置中的 default_locale
        #[arg(long)]
        locale: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List locales found in the document.
    Locales {
        #[command(flatten)]
        doc: DocumentArgs,
        /// 候选语言目录，用于列出可添加的语言
        #[arg(long, value_delimiter = ',')]
        catalog: Vec<String>,
    },
}

fn open_tree(args: &DocumentArgs) -> Result<(JsonDocument, TranslationTree)> {
    let mut config = match &args.config {
        Some(path) => TranslationConfig::load(path)
            .with_context(|| format!("读取配置失败: {}", path.display()))?,
        None => TranslationConfig::default(),
    };
    if args.sort {
        config.sort_by_name = true;
    }
    if !args.supported.is_empty() {
        config.supported_locales = args.supported.clone();
    }

    let schema = match &args.schema {
        Some(path) => SchemaDefinition::load(path)
            .with_context(|| format!("读取模式失败: {}", path.display()))?,
        None => SchemaDefinition::survey(),
    };
    let document = JsonDocument::load(&args.document, Rc::new(schema))
        .with_context(|| format!("读取文档失败: {}", args.document.display()))?;

    let mut tree = TranslationTree::new(document.root(), document.schema(), config);
    if let Some(page) = &args.page {
        let Some(obj) = document.find_page(page) else {
            bail!("文档中没有页面: {}", page);
        };
        tree.set_filtered_object(Some(obj));
    }
    Ok((document, tree))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export { doc, locales, all, output } => {
            let (_document, mut tree) = open_tree(&doc)?;
            tree.set_show_all_strings(all);
            if !locales.is_empty() {
                let selected: Vec<&str> = locales.iter().map(|l| label_locale(l)).collect();
                tree.set_selected_locales(selected.as_slice());
            }
            match output {
                Some(path) => tree
                    .export_to_file(&path)
                    .with_context(|| format!("写入CSV失败: {}", path.display()))?,
                None => print!("{}", tree.export_to_csv()?),
            }
        }
        Commands::Import { doc, csv, output } => {
            let (document, mut tree) = open_tree(&doc)?;
            let report = tree
                .import_from_file(&csv)
                .with_context(|| format!("读取CSV失败: {}", csv.display()))?;
            let target = output.unwrap_or(doc.document);
            document
                .save(&target)
                .with_context(|| format!("保存文档失败: {}", target.display()))?;
            println!(
                "applied {} rows ({} cells), skipped {} unknown and {} blank keys",
                report.applied,
                report.cells_written,
                report.unknown_keys.len(),
                report.blank_keys
            );
            for key in &report.unknown_keys {
                tracing::warn!("未匹配的路径键: {}", key);
            }
        }
        Commands::Merge { doc, locale, output } => {
            let (document, mut tree) = open_tree(&doc)?;
            let merged = match locale {
                Some(locale) => tree.merge_locale_into_default(&locale),
                None => tree.merge_locale_with_default(),
            };
            if !merged {
                bail!("文档中没有可合并的语言");
            }
            let target = output.unwrap_or(doc.document);
            document
                .save(&target)
                .with_context(|| format!("保存文档失败: {}", target.display()))?;
        }
        Commands::Locales { doc, catalog } => {
            let (_document, tree) = open_tree(&doc)?;
            for entry in tree.locales().entries() {
                let flag = if entry.enabled { "" } else { " (disabled)" };
                println!("{}{}", locale_label(&entry.locale), flag);
            }
            if !catalog.is_empty() {
                println!("available: {}", tree.available_locales(catalog.as_slice()).join(", "));
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志输出
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    run(cli)
}
