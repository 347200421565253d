// ==========================================
// 薪资单分发系统 - 命令行入口
// ==========================================
// 子命令: parse / generate / dispatch / logs / stats / test-smtp / settings
// ==========================================

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use payslip_dispatch::api::{ApiError, SlipApi};
use payslip_dispatch::app::{get_default_db_path, get_default_documents_dir, load_logo, AppState};
use payslip_dispatch::config::SmtpOverrides;
use payslip_dispatch::domain::{DeliveryLogFilter, DeliveryOutcome, DispatchTarget, Recipient};
use payslip_dispatch::{i18n, logging};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "payslip-dispatch")]
#[command(about = "Slip gaji: impor spreadsheet, cetak PDF, kirim email massal")]
#[command(version)]
struct Cli {
    /// SQLite 数据库路径
    #[arg(long, global = true)]
    db: Option<String>,
    /// 生成文档根目录
    #[arg(long, global = true)]
    documents_dir: Option<PathBuf>,
    /// 界面语言 (id / en)
    #[arg(long, global = true, default_value = "id")]
    locale: String,
    /// JSON 格式日志
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 解析工作簿, 输出 JSON
    Parse { file: PathBuf },
    /// 为工作簿中每一行生成 PDF
    Generate {
        file: PathBuf,
        #[arg(long)]
        org: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// 批量发送工资单邮件
    Dispatch {
        file: PathBuf,
        /// 收件人 JSON 文件: [{"email", "display_name", "document_key"}]
        #[arg(long)]
        recipients: PathBuf,
        #[arg(long)]
        org: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        logo: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        max_in_flight: usize,
    },
    /// 查询投递台账
    Logs {
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum)]
        outcome: Option<OutcomeArg>,
        #[arg(long, default_value_t = 500)]
        limit: usize,
    },
    /// 期间投递统计
    Stats {
        #[arg(long)]
        period: String,
    },
    /// 发送 SMTP 测试邮件
    TestSmtp {
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// 应用设置
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// KEY=VALUE ...
    Set { pairs: Vec<String> },
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutcomeArg {
    Sent,
    Failed,
}

impl From<OutcomeArg> for DeliveryOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Sent => DeliveryOutcome::Sent,
            OutcomeArg::Failed => DeliveryOutcome::Failed,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    logging::init(cli.json_logs);
    i18n::set_locale(&cli.locale);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ApiError>() {
                Some(api_err) => eprintln!("{}", api_err.user_message()),
                None => eprintln!("{:#}", err),
            }
            tracing::debug!(error = ?err, "命令执行失败");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    let documents_dir = cli.documents_dir.unwrap_or_else(get_default_documents_dir);
    let state = AppState::new(db_path, documents_dir).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Parse { file } => {
            let result = parse_file(&state.slip_api, &file)?;
            print_json(&result)
        }
        Commands::Generate {
            file,
            org,
            address,
            period,
            logo,
        } => {
            let parsed = parse_file(&state.slip_api, &file)?;
            let period = period.or(parsed.period.clone()).unwrap_or_default();
            let api = with_logo(&state, logo.as_deref());
            let saved = api
                .generate_batch(&parsed.rows, &org, &address, &period)
                .await?;
            println!(
                "{}",
                i18n::t_with_args(
                    "generate.saved",
                    &[("count", saved.saved.to_string().as_str()), ("dir", saved.dir.as_str())]
                )
            );
            print_json(&saved)
        }
        Commands::Dispatch {
            file,
            recipients,
            org,
            address,
            period,
            logo,
            max_in_flight,
        } => {
            let parsed = parse_file(&state.slip_api, &file)?;
            let recipients = read_recipients(&recipients)?;
            let target = DispatchTarget {
                organization_name: org,
                organization_address: address,
                period: period.or(parsed.period.clone()).unwrap_or_default(),
                recipients,
            };
            let api = with_logo(&state, logo.as_deref()).with_max_in_flight(max_in_flight);
            let summary = api.dispatch(&parsed.rows, &target).await?;
            println!(
                "{}",
                i18n::t_with_args(
                    "dispatch.summary",
                    &[
                        ("sent", summary.sent.to_string().as_str()),
                        ("skipped", summary.skipped.to_string().as_str()),
                        ("failed", summary.failed.len().to_string().as_str()),
                    ]
                )
            );
            print_json(&summary)
        }
        Commands::Logs {
            period,
            email,
            outcome,
            limit,
        } => {
            let filter = DeliveryLogFilter {
                period,
                email,
                outcome: outcome.map(Into::into),
            };
            let logs = state.slip_api.list_logs(&filter, limit).await?;
            print_json(&logs)
        }
        Commands::Stats { period } => {
            let stats = state.slip_api.period_stats(&period)?;
            print_json(&stats)
        }
        Commands::TestSmtp {
            to,
            host,
            port,
            user,
        } => {
            let overrides = SmtpOverrides {
                host,
                port,
                user,
                ..Default::default()
            };
            let response = state.slip_api.test_smtp(to.as_deref(), &overrides).await?;
            println!(
                "{}",
                i18n::t_with_args(
                    "smtp.test_ok",
                    &[("to", response.to.as_str()), ("id", response.message_id.as_str())]
                )
            );
            Ok(())
        }
        Commands::Settings { command } => match command {
            SettingsCommand::Set { pairs } => {
                let entries = parse_pairs(&pairs)?;
                let count = state.slip_api.update_settings(&entries)?;
                println!(
                    "{}",
                    i18n::t_with_args("settings.updated", &[("count", count.to_string().as_str())])
                );
                Ok(())
            }
            SettingsCommand::List => print_json(&state.slip_api.list_settings()?),
        },
    }
}

fn parse_file(
    api: &SlipApi,
    file: &Path,
) -> anyhow::Result<payslip_dispatch::domain::SlipImportResult> {
    let bytes = std::fs::read(file).with_context(|| format!("无法读取文件 {}", file.display()))?;
    let file_name = file.file_name().and_then(|n| n.to_str());
    Ok(api.parse(&bytes, file_name)?)
}

/// 带 logo 的 API 实例
fn with_logo(state: &AppState, logo: Option<&Path>) -> SlipApi {
    let store = std::sync::Arc::new(payslip_dispatch::dispatch::FsDocumentStore::new(
        state.documents_dir.clone(),
    ));
    SlipApi::new(state.delivery_log_repo.clone(), state.settings.clone(), store)
        .with_logo(load_logo(logo))
}

fn read_recipients(path: &Path) -> anyhow::Result<Vec<Recipient>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取收件人文件 {}", path.display()))?;
    let recipients: Vec<Recipient> =
        serde_json::from_str(&raw).context("收件人文件格式错误")?;
    Ok(recipients)
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("参数格式应为 KEY=VALUE: {}", pair);
        };
        entries.insert(key.trim().to_uppercase(), value.to_string());
    }
    Ok(entries)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
