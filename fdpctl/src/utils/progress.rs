use indicatif::{ProgressBar, ProgressStyle};

/// Bar over a repeated write step, hidden when it is too short to matter
/// or when output is quiet.
pub fn write_progress(total: u64, message: &str) -> anyhow::Result<ProgressBar> {
    if total < 64 || super::log_level() == super::LogLevel::Quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.white}] {pos}/{len} cmds (ETA {eta_precise}) {msg}")?
            .progress_chars("█░░"),
    );
    pb.set_message(message.to_string());
    Ok(pb)
}
