use clap::Parser;

use crate::view::{LiveWindow, PopularityRule, ViewOptions};

/// Esports match schedule watcher
#[derive(Parser, Debug, Clone)]
#[command(name = "matchboard", version, about)]
pub struct Config {
    /// Match feed URL (JSON; flat array or {live_matches, upcoming_matches})
    #[arg(long, env = "FEED_URL", default_value = "https://teemo.uk/cs2")]
    pub feed_url: String,

    /// Feed polling interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "120")]
    pub poll_interval_secs: u64,

    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "matchboard.db")]
    pub database_path: String,

    /// Maximum number of matches shown (20 and 50 are the common choices)
    #[arg(long, env = "DISPLAY_CAP", default_value = "20")]
    pub display_cap: usize,

    /// Liveness heuristic floor: minutes a match must have been underway
    #[arg(long, env = "LIVE_FLOOR_MINS", default_value = "5")]
    pub live_floor_mins: i64,

    /// Liveness heuristic ceiling in minutes (180 = 3h; some feeds used 300)
    #[arg(long, env = "LIVE_CEILING_MINS", default_value = "180")]
    pub live_ceiling_mins: i64,

    /// Team popularity counter must exceed this to flag a match popular
    #[arg(long, env = "POPULAR_THRESHOLD", default_value = "1000")]
    pub popular_threshold: i64,

    /// Max positional gap between popular rows joined into one cluster
    #[arg(long, env = "POPULAR_LOOKAHEAD", default_value = "2")]
    pub popular_lookahead: usize,

    /// Max popular rows per cluster
    #[arg(long, env = "POPULAR_MAX_RUN", default_value = "5")]
    pub popular_max_run: usize,

    /// Base URL for team logo images ({base}/{hash}.png)
    #[arg(
        long,
        env = "IMAGE_BASE_URL",
        default_value = "https://images.sportdevs.com"
    )]
    pub image_base_url: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        if self.display_cap == 0 {
            anyhow::bail!("display_cap must be positive");
        }
        if self.live_floor_mins < 0 || self.live_ceiling_mins <= self.live_floor_mins {
            anyhow::bail!("live window must satisfy 0 <= floor < ceiling");
        }
        if self.popular_lookahead == 0 {
            anyhow::bail!("popular_lookahead must be at least 1 (adjacent rows)");
        }
        if self.popular_max_run < 2 {
            anyhow::bail!("popular_max_run must be at least 2 (a cluster needs two members)");
        }
        Ok(())
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            window: LiveWindow::from_minutes(self.live_floor_mins, self.live_ceiling_mins),
            display_cap: self.display_cap,
            popularity: PopularityRule {
                threshold: self.popular_threshold,
                lookahead: self.popular_lookahead,
                max_run: self.popular_max_run,
            },
        }
    }
}
