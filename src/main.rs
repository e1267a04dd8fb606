use std::sync::Arc;

use docuflow::config::Settings;
use docuflow::extract::text::DocumentTextExtractor;
use docuflow::notify::mailer::{LogNotifier, Notifier, SmtpNotifier};
use docuflow::pipeline::processor::{DocumentProcessor, ProcessorDeps};
use docuflow::pipeline::queue::{self, RetryPolicy, TaskQueue};
use docuflow::pipeline::router::ReviewRouter;
use docuflow::pipeline::watcher::FolderWatcher;
use docuflow::scoring::{AnalysisService, ScoringEngine};
use docuflow::store::{LibSqlStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage (SMTP).
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let settings = Settings::from_env();

    // Tracing: env filter, plus a daily rolling file when a log dir is set.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _log_guard = if let Some(ref log_dir) = settings.log_dir {
        let appender = tracing_appender::rolling::daily(log_dir, "docuflow.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
        None
    };

    eprintln!("📄 DocuFlow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Watch folder: {}", settings.watch_folder.display());
    eprintln!("   Database: {}", settings.database_path.display());

    // ── Storage ─────────────────────────────────────────────────────
    let store: Arc<dyn Storage> = Arc::new(
        LibSqlStorage::new_local(&settings.database_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: failed to open database at {}: {}",
                    settings.database_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );

    // ── Collaborators ───────────────────────────────────────────────
    let extractor = Arc::new(DocumentTextExtractor::new(settings.ocr_language.clone()));
    let engine = ScoringEngine::new(settings.weights, settings.review);
    let analysis = AnalysisService::new(Arc::clone(&store), engine);
    let router = ReviewRouter::new(settings.routing);

    let (notifier, recipient): (Arc<dyn Notifier>, String) = match settings.email.clone() {
        Some(email) => {
            eprintln!(
                "   Email: enabled (SMTP: {}:{}, to: {})",
                email.smtp_host, email.smtp_port, email.to_address
            );
            let recipient = email.to_address.clone();
            (Arc::new(SmtpNotifier::new(email)), recipient)
        }
        None => {
            eprintln!("   Email: disabled (set DOCUFLOW_SMTP_HOST to enable)");
            (Arc::new(LogNotifier), "approvals@localhost".to_string())
        }
    };

    // ── Task queue and workers ──────────────────────────────────────
    let (task_queue, task_rx) = TaskQueue::new();

    let processor = Arc::new(DocumentProcessor::new(
        router,
        ProcessorDeps {
            store: Arc::clone(&store),
            extractor,
            analysis,
            dispatcher: task_queue.clone(),
            notifier,
            recipient,
        },
    ));

    let retry = RetryPolicy {
        max_attempts: settings.max_task_attempts,
        base_delay: settings.retry_base_delay,
    };
    let worker = queue::spawn_worker(Arc::clone(&processor), task_rx, retry);

    // ── Folder watcher ──────────────────────────────────────────────
    let watcher = FolderWatcher::new(
        Arc::clone(&store),
        task_queue.clone(),
        settings.watch_folder.clone(),
        settings.poll_interval,
    )
    .spawn();

    eprintln!("   Ready. Drop .pdf or .eml files into the watch folder.\n");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    watcher.abort();
    worker.abort();

    Ok(())
}
