//! ChainFlow 命令行工具
//!
//! 读取一批浏览器记录，对中心地址运行调查并输出资产流图

use anyhow::{bail, Context};
use chainflow::cli::{PrintMode, Printer};
use chainflow::config::EngineConfig;
use chainflow::engine::Investigation;
use chainflow::event::RawBatch;
use chainflow::reference::LabelTable;
use chainflow::storage::{FileStore, GraphStore};
use chainflow::types::{Address, Fidelity};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chainflow")]
#[command(about = "ChainFlow 链上资产流分类与构图工具")]
struct Args {
    /// 浏览器记录批次文件（JSON）
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// 被调查的中心地址
    #[arg(short, long)]
    central: Option<String>,

    /// 邻域中的路径地址，可重复
    #[arg(short, long)]
    path: Vec<String>,

    /// 配置文件（JSON）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 数据目录（覆盖配置）
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// 地址标签文件（覆盖配置）
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// 低精度模式：不分组、不分类
    #[arg(long)]
    linear: bool,

    /// 运行前清空存储
    #[arg(long)]
    reset: bool,

    /// 以 JSON 输出完整结果
    #[arg(long)]
    json: bool,

    /// 垂直格式输出
    #[arg(long)]
    vertical: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(labels) = args.labels {
        config.labels_path = Some(labels);
    }
    if args.linear {
        config.fidelity = Fidelity::Linear;
    }
    config.validate()?;

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("无法打开数据目录 {:?}", config.data_dir))?;

    if args.reset {
        store.reset()?;
        info!(data_dir = ?config.data_dir, "存储已重置");
    }

    let (input, central) = match (args.input, args.central) {
        (Some(input), Some(central)) => (input, central),
        (None, None) if args.reset => return Ok(()),
        _ => bail!("需要同时指定 --input 和 --central"),
    };

    let central = Address::parse(&central)?;
    if central.is_empty() {
        bail!("中心地址不能为空");
    }

    let labels = match &config.labels_path {
        Some(path) => LabelTable::from_json_file(path)?,
        None => LabelTable::new(),
    };

    let batch = RawBatch::from_json_file(&input)
        .with_context(|| format!("无法读取批次文件 {:?}", input))?;
    info!(records = batch.len(), central = %central, "开始调查");

    let path = args
        .path
        .iter()
        .map(|p| Address::parse(p))
        .collect::<Result<Vec<_>, _>>()?;

    let report = Investigation::new(&config, &store, &labels, central)
        .with_path(path)
        .run(&batch)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mode = if args.vertical {
        PrintMode::Vertical
    } else {
        PrintMode::Table
    };
    let printer = Printer::new(mode);

    println!("{}", printer.print_nodes(&report.graph.nodes));
    println!("{}", printer.print_links(&report.graph.links));
    println!("{}", printer.print_run(&report.run));
    println!("{}", printer.print_stats(&report.stats));
    println!(
        "涉及中心地址的事件: {}，跳过已处理交易: {}，耗时 {} ms",
        report.events.len(),
        report.replayed,
        report.duration_ms
    );

    Ok(())
}
