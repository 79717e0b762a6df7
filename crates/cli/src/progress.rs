use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const ROW_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})";

/// Progress bar over matched rows, drawn on stderr unless `hidden`.
pub fn row_progress(len: u64, hidden: bool) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if hidden {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        match ProgressStyle::with_template(ROW_TEMPLATE) {
            Ok(style) => pb.set_style(style.progress_chars("=> ")),
            Err(err) => log::debug!("Progress template rejected: {err}"),
        }
    }
    pb.set_message("Matching");
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_valid() {
        assert!(ProgressStyle::with_template(ROW_TEMPLATE).is_ok());
    }

    #[test]
    fn hidden_bar_still_counts() {
        let pb = row_progress(3, true);
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(3));
    }
}
