//! DXF2WKT 命令行入口
//!
//! 读取 DXF 图纸，按图层过滤后输出 WGS84 下的 WKT、JSON 记录或三元组。

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dxf2wkt_core::config::ExportConfig;
use dxf2wkt_core::drawing::Drawing;
use dxf2wkt_core::export::{wkt_strings, BatchExporter, EntityRecord, LayerSelection};
use dxf2wkt_core::repository::build_triples_parameter;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// WKT 文本，以 ",\n" 分隔
    Wkt,
    /// JSON 记录数组
    Records,
    /// 导入用三元组，每行一条
    Triples,
}

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "dxf2wkt")]
#[command(about = "Convert DXF entities to WGS84 WKT geometries")]
#[command(version)]
struct Args {
    /// 输入 DXF 文件
    input: PathBuf,

    /// 只导出指定图层（可重复）；不指定时导出全部图层
    #[arg(short, long = "layer", value_name = "LAYER")]
    layers: Vec<String>,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 覆盖实体 URI 前缀
    #[arg(long)]
    base_uri: Option<String>,

    /// 输出格式
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Wkt)]
    format: OutputFormat,

    /// 只列出图层
    #[arg(long)]
    list_layers: bool,

    /// 并行转换
    #[arg(long)]
    parallel: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn export_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExportConfig::default(),
        };
        if let Some(base_uri) = &self.base_uri {
            config = config.with_base_uri(base_uri.clone());
        }
        Ok(config)
    }
}

fn list_layers(drawing: &Drawing) -> String {
    drawing
        .layers()
        .iter()
        .map(|layer| format!("{}\t{}", layer.name, layer.color))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(records: &[EntityRecord], format: OutputFormat, config: &ExportConfig) -> Result<String> {
    Ok(match format {
        OutputFormat::Wkt => wkt_strings(records).join(",\n"),
        OutputFormat::Records => serde_json::to_string_pretty(records)?,
        OutputFormat::Triples => build_triples_parameter(records, &config.type_base_uri),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志，写到 stderr，stdout 只留给输出
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(io::stderr)
            .finish(),
    )?;

    let config = args.export_config()?;

    info!("Loading {}", args.input.display());
    let drawing = dxf2wkt_file::load(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let output = if args.list_layers {
        list_layers(&drawing)
    } else {
        let selection: LayerSelection = args.layers.iter().cloned().collect();
        let exporter = BatchExporter::new(config.clone());
        let report = if args.parallel {
            exporter.export_parallel(&drawing, &selection)
        } else {
            exporter.export_with_report(&drawing, &selection)
        };
        render(&report.records, args.format, &config)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output)?;
    Ok(())
}
