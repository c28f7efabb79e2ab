mod bootstrap;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use deadline_core::error::DeadlineError;
use deadline_core::formatting::format_count;
use deadline_core::models::ChartData;
use deadline_core::settings::{Command, Settings};
use deadline_core::time_utils::{window, TimezoneHandler};
use deadline_data::aggregator::DueDateAggregator;
use deadline_data::ingest::{ingest_upload, IngestOutcome, UploadRequest};
use deadline_data::report::{describe_latest_upload, load_chart};
use deadline_data::store::{DueDateStore, SqliteStore};
use deadline_ui::app::App;
use deadline_ui::chart_view::ChartView;

/// Exit status when a re-upload needs `--yes`.
const EXIT_NEEDS_CONFIRMATION: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Deadline Chart v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Keyword: {}, Window: {} days, Timezone: {}, Theme: {}",
        settings.keyword,
        settings.window_days,
        settings.timezone,
        settings.theme
    );

    let timezone = TimezoneHandler::new(&settings.timezone);
    let db_path = settings.db_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    match settings.effective_command() {
        Command::Ingest { file, yes } => {
            Ok(run_ingest(&store, &file, &settings.keyword, yes, &timezone))
        }
        Command::Chart { today, json } => {
            run_chart(&store, &settings, &timezone, today, json).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            println!("{}", describe_latest_upload(&store, &timezone)?);
            println!(
                "登録済み納期データ: {} 件",
                format_count(store.count_due_dates()?)
            );
            println!("データベース: {}", db_path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ── ingest ────────────────────────────────────────────────────────────────────

/// Name recorded for `path` in the upload log.
fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn ingest_file(
    store: &dyn DueDateStore,
    path: &Path,
    keyword: &str,
    confirmed: bool,
) -> deadline_core::Result<IngestOutcome> {
    let bytes = std::fs::read(path).map_err(|source| DeadlineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let request = UploadRequest {
        filename: upload_name(path),
        bytes: &bytes,
        keyword: keyword.to_string(),
        confirmed,
    };
    ingest_upload(store, &request, Utc::now())
}

/// User-facing lines for an ingestion result plus the process exit status.
fn ingest_messages(
    result: &deadline_core::Result<IngestOutcome>,
    timezone: &TimezoneHandler,
) -> (Vec<String>, u8) {
    match result {
        Ok(IngestOutcome::Ingested(report)) => {
            let mut lines = vec![format!(
                "{} 件の納期データを登録しました。",
                format_count(report.accepted as u64)
            )];
            if report.dropped > 0 {
                lines.push(format!(
                    "{} 行は納期を日付として読み取れなかったため除外しました。",
                    format_count(report.dropped as u64)
                ));
            }
            (lines, 0)
        }
        Ok(IngestOutcome::NeedsConfirmation { filename, previous }) => {
            let mut lines = vec![format!(
                "ファイル名 '{}' は既にアップロードされています。上書きしますか？ (--yes)",
                filename
            )];
            if let Some(previous) = previous {
                lines.push(format!(
                    "前回のアップロード: {}",
                    timezone.format_local(previous.uploaded_at)
                ));
            }
            (lines, EXIT_NEEDS_CONFIRMATION)
        }
        Err(e) => (
            vec![format!("CSV処理中にエラーが発生しました: {e}")],
            1,
        ),
    }
}

fn run_ingest(
    store: &dyn DueDateStore,
    path: &Path,
    keyword: &str,
    confirmed: bool,
    timezone: &TimezoneHandler,
) -> ExitCode {
    let result = ingest_file(store, path, keyword, confirmed);
    if let Err(e) = &result {
        tracing::error!("Ingestion of {} failed: {}", path.display(), e);
    }

    let (lines, status) = ingest_messages(&result, timezone);
    for line in lines {
        if matches!(result, Ok(IngestOutcome::Ingested(_))) {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }
    }
    ExitCode::from(status)
}

// ── chart ─────────────────────────────────────────────────────────────────────

/// `chart` as is, or a zero-filled chart of the window when nothing is stored.
fn chart_or_empty(
    chart: Option<ChartData>,
    today: NaiveDate,
    days: u32,
) -> deadline_core::Result<ChartData> {
    match chart {
        Some(chart) => Ok(chart),
        None => {
            let (start, end) = window(today, days);
            DueDateAggregator::build_chart(&[], start, end)
        }
    }
}

async fn run_chart(
    store: &dyn DueDateStore,
    settings: &Settings,
    timezone: &TimezoneHandler,
    today: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let today = today.unwrap_or_else(|| timezone.today());
    let chart = load_chart(store, today, settings.window_days)?;
    let latest_upload = describe_latest_upload(store, timezone)?;

    if json {
        let chart = chart_or_empty(chart, today, settings.window_days)?;
        println!("{}", serde_json::to_string_pretty(&chart)?);
        return Ok(());
    }

    let view = chart.map(|chart| {
        ChartView::new(chart, latest_upload.clone(), timezone.name().to_string())
    });
    App::new(&settings.theme)
        .run_chart(view, latest_upload)
        .await?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
