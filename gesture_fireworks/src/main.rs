//! gesture_fireworks — interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use gesture_fireworks::app::{run, AppConfig};

#[derive(Debug, Parser)]
#[command(name = "gesture_fireworks", version, about = "Hand-gesture controlled firework show")]
struct Cli {
    /// TrueType/OpenType font for phrase fireworks (default: built-in block font)
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Seed for a reproducible show
    #[arg(long)]
    seed: Option<u64>,

    /// Phrase for the show; repeat to build the list
    #[arg(long = "phrase", value_name = "TEXT")]
    phrases: Vec<String>,

    /// Wait for Space instead of starting the show immediately
    #[arg(long)]
    no_autoplay: bool,

    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.engine.font_path = self.font;
        cfg.engine.seed      = self.seed;
        cfg.autoplay         = !self.no_autoplay;
        if !self.phrases.is_empty() {
            cfg.show.phrases = self.phrases;
        }
        cfg
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Fireworks — Hand-Controlled Particle Show     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard + mouse simulation  (use --features leap for hardware)");
    println!();

    let cfg = cli.into_config();
    println!("  Phrases: {}", cfg.show.phrases.join(" · "));
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
