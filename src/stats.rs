use pressure::RunReport;

pub fn log_summary(report: &RunReport) {
    let tally = &report.tally;

    tracing::info!("=== Workload Summary ===");
    tracing::info!(
        "Workers:        {} stopped at ceiling / {} total",
        report.stopped,
        report.workers
    );
    tracing::info!("Memory checks:  {}", tally.memory_checks);
    tracing::info!(
        "GET:            {} issued / {} missing key",
        tally.gets,
        tally.get_misses
    );
    tracing::info!("SET:            {} issued", tally.sets);
}
