use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use maruegg_ingest_lib::records::toc_preview;
use maruegg_ingest_lib::{
    DocumentStore, IngestConfig, IngestCoordinator, Partition, TocStore, UploadForm,
};

#[derive(Parser)]
#[command(name = "maruegg-ingest")]
#[command(version, about = "招生资料 PDF 入库工具", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// 覆盖配置中的数据库路径
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// 分区参数
#[derive(clap::Args)]
struct PartitionArgs {
    /// 入学类型：수시 / 정시 / 편입학
    #[arg(long = "type")]
    admission_type: String,
    /// 分类：모집요강 / 입시결과 / 기출문제 / 대학생활 / 면접/실기
    #[arg(long)]
    category: String,
}

impl PartitionArgs {
    fn partition(&self) -> Result<Partition> {
        Partition::from_labels(&self.admission_type, &self.category).ok_or_else(|| {
            anyhow!("未知的分区: {} / {}", self.admission_type, self.category)
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 上传 PDF 并入库
    Upload {
        #[command(flatten)]
        partition: PartitionArgs,
        /// 目录页码到提取页码的偏移量
        #[arg(long, allow_hyphen_values = true)]
        page_gap: String,
        file: PathBuf,
    },
    /// 预览标题分配结果，不写入任何存储
    Preview {
        #[command(flatten)]
        partition: PartitionArgs,
        #[arg(long, allow_hyphen_values = true)]
        page_gap: i64,
        file: PathBuf,
    },
    /// 目录管理
    Toc {
        #[command(subcommand)]
        cmd: TocCommands,
    },
    /// 页面记录
    Docs {
        #[command(subcommand)]
        cmd: DocsCommands,
    },
    /// 删除所有页面记录
    Purge,
}

#[derive(Subcommand)]
enum TocCommands {
    /// 写入或替换分区目录，文本从文件读取
    Set {
        #[command(flatten)]
        partition: PartitionArgs,
        file: PathBuf,
    },
    /// 显示分区目录
    Show {
        #[command(flatten)]
        partition: PartitionArgs,
    },
    /// 列出全部目录（预览）
    List,
    /// 删除分区目录
    Delete {
        #[command(flatten)]
        partition: PartitionArgs,
    },
}

#[derive(Subcommand)]
enum DocsCommands {
    /// 列出分区内的页面记录
    List {
        #[command(flatten)]
        partition: PartitionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = IngestConfig::load().context("加载配置失败")?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    let (coordinator, store) =
        IngestCoordinator::from_config(&config).context("打开数据库失败")?;

    match cli.command {
        Commands::Upload { partition, page_gap, file } => {
            let pdf = fs::read(&file)
                .with_context(|| format!("读取文件失败: {}", file.display()))?;
            let response = coordinator
                .handle_upload(UploadForm {
                    admission_type: Some(partition.admission_type),
                    category: Some(partition.category),
                    page_gap: Some(page_gap),
                    pdf: Some(pdf),
                })
                .await;

            println!("{}", serde_json::to_string(&response)?);
            if !response.is_success() {
                std::process::exit(match response.status {
                    400 => 2,
                    _ => 1,
                });
            }
        }
        Commands::Preview { partition, page_gap, file } => {
            let partition = partition.partition()?;
            let (pages, parsed) = coordinator.preview(partition, page_gap, &file)?;

            for (start, title) in parsed.mapping.iter() {
                println!("章节 {:>4}  {}", start, title);
            }
            for skipped in &parsed.skipped {
                println!("跳过目录第 {} 行: {}", skipped.line_number, skipped.text);
            }
            for page in &pages {
                println!("{:>4}  {}", page.number, page.title.as_deref().unwrap_or("-"));
            }
        }
        Commands::Toc { cmd } => match cmd {
            TocCommands::Set { partition, file } => {
                let partition = partition.partition()?;
                let text = fs::read_to_string(&file)
                    .with_context(|| format!("读取目录文件失败: {}", file.display()))?;
                store.upsert_toc(partition, &text)?;
                println!("{} 目录已保存", partition);
            }
            TocCommands::Show { partition } => {
                let partition = partition.partition()?;
                match store.get_by_partition(partition)? {
                    Some(text) => println!("{}", text),
                    None => println!("{} 没有目录", partition),
                }
            }
            TocCommands::List => {
                for record in store.list_tocs()? {
                    println!("{}\t{}", record.partition, toc_preview(&record.toc_text));
                }
            }
            TocCommands::Delete { partition } => {
                let partition = partition.partition()?;
                let removed = store.delete_toc(partition)?;
                println!("已删除 {} 条目录", removed);
            }
        },
        Commands::Docs { cmd } => match cmd {
            DocsCommands::List { partition } => {
                let partition = partition.partition()?;
                for record in store.list_by_partition(partition)? {
                    let first_line = record.content.lines().next().unwrap_or_default();
                    println!("{:>4}  {}  {}", record.page, record.title, first_line);
                }
            }
        },
        Commands::Purge => {
            let removed = store.delete_all()?;
            println!("已删除 {} 条页面记录", removed);
        }
    }

    Ok(())
}
