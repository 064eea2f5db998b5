use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Create a progress bar for tracking bytes through a throttled copy.
///
/// Renders to stderr (not stdout) so piped output stays clean. A known
/// length gets a bar with ETA; an unknown one (stdin) gets a spinner.
/// Returns a hidden bar when `visible` is false.
pub fn create_transfer_progress(total_bytes: Option<u64>, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let (pb, template) = match total_bytes {
        Some(total) => (
            ProgressBar::new(total),
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
             {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})",
        ),
        None => (
            ProgressBar::no_length(),
            "{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec})",
        ),
    };
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
