use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// One progress bar per header, created before scheduling starts.
///
/// Bars are indexed by the header's position in the scheduled list, so a header
/// named twice still gets two bars. The list is filled once in the constructor and
/// only read afterwards; each bar is driven by the single task that owns it.
pub struct ProgressRegistry {
    multi_progress: MultiProgress,
    bars: Vec<ProgressBar>,
}

impl ProgressRegistry {
    /// Create a registry drawing to stderr
    pub fn new(headers: &[String]) -> Self {
        Self::with_target(headers, ProgressDrawTarget::stderr())
    }

    /// Create a registry that tracks progress without drawing anything
    pub fn hidden(headers: &[String]) -> Self {
        Self::with_target(headers, ProgressDrawTarget::hidden())
    }

    fn with_target(headers: &[String], target: ProgressDrawTarget) -> Self {
        let multi_progress = MultiProgress::with_draw_target(target);
        let style = ProgressStyle::with_template("{bar:15.cyan/blue} {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");

        let bars = headers
            .iter()
            .map(|header| {
                let bar = multi_progress.add(ProgressBar::new(100));
                bar.set_style(style.clone());
                bar.set_message(format!("Waiting to compile {header}..."));
                bar
            })
            .collect();

        Self {
            multi_progress,
            bars,
        }
    }

    /// Bar for the header at `index` in the list the registry was built from
    pub fn handle(&self, index: usize) -> Option<&ProgressBar> {
        self.bars.get(index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Clear whatever is still drawn once the run is over
    pub fn finish(&self) {
        for bar in &self.bars {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
        let _ = self.multi_progress.clear();
    }
}
