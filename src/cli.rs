use clap::Parser;
use reqwest::Url;

/// Ambient star-trail overlay driven by pointer movement and scroll
#[derive(Parser)]
#[command()]
pub struct Args {
    /// Total particle cap across both layers
    #[arg(long, default_value_t = 500)]
    pub max_particles: usize,

    /// Per-frame downward acceleration, 0 disables gravity
    #[arg(short, long, default_value_t = 0.0)]
    pub gravity: f32,

    /// Framerate cap, 0 runs uncapped
    ///
    /// The simulation assumes a 60 fps reference rate; running uncapped
    /// speeds the effect up on high-refresh displays.
    #[arg(short, long, default_value_t = 60)]
    pub framerate: u32,

    /// Site root to fetch the shared navigation fragment from
    ///
    /// When absent the navigation overlay stays disabled.
    #[arg(long)]
    pub site_root: Option<Url>,
}
