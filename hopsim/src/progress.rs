use indicatif::{ProgressBar, ProgressStyle};
use log::log_enabled;

const K_PROGRESS_TIMES: usize = 20;

pub(crate) struct Bar {
    bar: ProgressBar,
    prev_log: usize,
    delta: usize,
}

impl Bar {
    pub(crate) fn new(total_messages: usize) -> Self {
        let bar = if log_enabled!(log::Level::Info) {
            let bar = ProgressBar::new(total_messages as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("[{bar:60.green}] {pos}/{len} delivered")
            {
                bar.set_style(style);
            }
            bar.set_position(0);
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            prev_log: 0,
            delta: (total_messages / K_PROGRESS_TIMES).max(1),
        }
    }

    pub(crate) fn make_progress(&mut self, delivered: usize) {
        let d = delivered / self.delta;
        if d > self.prev_log {
            self.prev_log = d;
            self.bar.set_position(delivered as u64)
        }
    }

    pub(crate) fn finish(&mut self) {
        self.bar.finish();
    }

    pub(crate) fn abandon(&mut self) {
        self.bar.abandon();
    }
}
