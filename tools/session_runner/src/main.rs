use audit_core::analysis::cache::AnalysisCache;
use audit_core::analysis::classifier::{Classifier, Credentials};
use audit_core::analysis::heuristic::HeuristicClassifier;
use audit_core::analysis::orchestrator::AnalysisOrchestrator;
use audit_core::analysis::render::{render_findings_csv, render_findings_markdown};
use audit_core::config::{ClassifierBackend, CoreConfig};
use audit_core::error::{CoreError, CoreResult};
use audit_core::notify::TracingNotifier;
use audit_core::session::autosave::SessionAutosave;
use audit_core::session::snapshot::AuditInfo;
use audit_core::session::state::AuditSession;
use audit_core::session::store::FileSessionStore;
use audit_core::standards::library::StandardLibrary;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "usage:
  session_runner init <STANDARD_KEY> [ORGANIZATION]
  session_runner evidence <PROCESS_NAME> <CLAUSE_ID> <TEXT>
  session_runner analyze [OUT_DIR]
  session_runner export [OUT_DIR]";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let result = match CoreConfig::from_env_or_default() {
        Ok(cfg) => run(&cfg, &args).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => {}
        Err(CoreError::InvalidInput(msg)) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("session_runner error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cfg: &CoreConfig, args: &[String]) -> CoreResult<()> {
    let store = Arc::new(FileSessionStore::open(&cfg.session.dir)?);
    let autosave = SessionAutosave::from_config(store.clone(), &cfg.session);
    let result = dispatch(cfg, args, &store, &autosave).await;
    // Flushes the last scheduled snapshot before the process exits.
    autosave.close().await;
    result
}

async fn dispatch(
    cfg: &CoreConfig,
    args: &[String],
    store: &FileSessionStore,
    autosave: &SessionAutosave,
) -> CoreResult<()> {
    let library = StandardLibrary::builtin();
    let key = cfg.session.key.as_str();

    match args[0].as_str() {
        "init" => {
            let standard_key = arg(args, 1, "STANDARD_KEY")?;
            let mut session = AuditSession::new();
            session.select_standard(&library, standard_key).map_err(|_| {
                CoreError::InvalidInput(format!(
                    "unknown standard {} (available: {})",
                    standard_key,
                    library.keys().join(", ")
                ))
            })?;
            if let Some(org) = args.get(2) {
                session.set_audit_info(AuditInfo {
                    organization: org.clone(),
                    ..AuditInfo::default()
                });
            }
            session.schedule_autosave(autosave)?;
            println!("SESSION_INIT standard={} dir={}", standard_key, store.root().display());
        }
        "evidence" => {
            let process_name = arg(args, 1, "PROCESS_NAME")?;
            let clause_id = arg(args, 2, "CLAUSE_ID")?;
            let text = arg(args, 3, "TEXT")?;
            let mut session = load_session(store, key, &library)?;
            let existing = session
                .processes()
                .iter()
                .find(|p| p.name == process_name)
                .map(|p| p.id.clone());
            let pid = match existing {
                Some(id) => id,
                None => session.add_process(process_name)?,
            };
            session.select_process(Some(pid.clone()))?;
            if !session.context().buffers().matrix_data.contains_key(clause_id) {
                session.toggle_clause(&pid, clause_id)?;
            }
            let row_id = session
                .context()
                .buffers()
                .matrix_data
                .get(clause_id)
                .and_then(|rows| rows.first())
                .map(|r| r.id.clone())
                .ok_or_else(|| CoreError::NotFound(format!("rows for clause {}", clause_id)))?;
            session
                .context_mut()
                .append_row_evidence(clause_id, &row_id, text)?;
            session.flush_buffers()?;
            session.schedule_autosave(autosave)?;
            println!("EVIDENCE process={} clause={}", process_name, clause_id);
        }
        "analyze" => {
            let mut session = load_session(store, key, &library)?;
            let classifier: Arc<dyn Classifier> = match cfg.analysis.classifier {
                ClassifierBackend::Heuristic => Arc::new(HeuristicClassifier),
                ClassifierBackend::External => {
                    return Err(CoreError::Configuration(
                        "the external classifier is provided by the embedding application; set analysis.classifier = \"heuristic\" to run offline".to_string(),
                    ))
                }
            };
            let orchestrator = AnalysisOrchestrator::new(
                classifier,
                Arc::new(AnalysisCache::new()),
                Arc::new(TracingNotifier),
                cfg.analysis.clone(),
            )
            .with_credentials(Credentials::from_env());
            let outcome = session.run_analysis(&orchestrator).await?;
            session.schedule_autosave(autosave)?;
            println!(
                "ANALYSIS queued={} produced={} failed={}",
                outcome.queued,
                outcome.findings.len(),
                outcome.failed()
            );
            write_exports(&session, &out_dir(args, store.root()))?;
        }
        "export" => {
            let session = load_session(store, key, &library)?;
            write_exports(&session, &out_dir(args, store.root()))?;
        }
        other => {
            return Err(CoreError::InvalidInput(format!("unknown command {}", other)));
        }
    }
    Ok(())
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> CoreResult<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| CoreError::InvalidInput(format!("missing argument {}", name)))
}

fn out_dir(args: &[String], default: &Path) -> PathBuf {
    args.get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| default.to_path_buf())
}

fn load_session(
    store: &FileSessionStore,
    key: &str,
    library: &StandardLibrary,
) -> CoreResult<AuditSession> {
    AuditSession::load_from(store, key, library)?.ok_or_else(|| {
        CoreError::NotFound(format!(
            "no saved session {} in {} (run `session_runner init` first)",
            key,
            store.root().display()
        ))
    })
}

fn write_exports(session: &AuditSession, dir: &Path) -> CoreResult<()> {
    std::fs::create_dir_all(dir)?;
    let standard_name = session.standard().map(|s| s.name.as_str()).unwrap_or("-");
    let csv_path = dir.join("findings.csv");
    let md_path = dir.join("report.md");
    std::fs::write(&csv_path, render_findings_csv(session.findings())?)?;
    std::fs::write(
        &md_path,
        render_findings_markdown(session.findings(), session.audit_info(), standard_name),
    )?;
    info!(findings = session.findings().len(), dir = %dir.display(), "exports written");
    println!("EXPORT {}", csv_path.display());
    println!("EXPORT {}", md_path.display());
    Ok(())
}
