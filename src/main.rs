use anyhow::Result;
use memedit::config::ConfigLoader;
use memedit::inspect::SelfInspector;
use memedit::process::catalog;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Diagnostic entry point: loads configuration, reports on the hosting
/// process and the process catalog. The engine itself is a library; a UI
/// drives it through `memedit::MemoryEngine`.
fn main() -> Result<()> {
    let config = ConfigLoader::new("memedit.toml").load_or_default()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(false)
        .init();

    info!("memedit v{}", memedit::core::VERSION);
    info!("architecture: {}", std::env::consts::ARCH);

    let inspector = SelfInspector::new()?;
    let identity = inspector.identity();
    info!(pid = identity.pid, name = %identity.name, "self identity");

    let usage = inspector.resource_usage()?;
    info!(
        working_set_kib = usage.working_set_bytes / 1024,
        threads = usage.thread_count,
        "resource usage"
    );

    let summary = inspector.memory_summary();
    info!(
        regions = summary.region_count,
        committed_mib = summary.committed_bytes / (1024 * 1024),
        "memory map"
    );

    let modules = inspector.loaded_modules()?;
    info!(count = modules.len(), "loaded modules");

    let processes = catalog::enumerate_processes()?;
    info!(count = processes.len(), "running processes");

    Ok(())
}
