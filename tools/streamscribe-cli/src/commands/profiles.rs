//! List quality tiers.

use streamscribe_capture_engine::QualityTier;

pub fn run() -> anyhow::Result<()> {
    println!("{:<10} {:<14} {:>10} {:>5}", "TIER", "LABEL", "SIZE", "FPS");
    for tier in QualityTier::ALL {
        let profile = tier.profile();
        let marker = if tier == QualityTier::default() { " (default)" } else { "" };
        println!(
            "{:<10} {:<14} {:>10} {:>5}{marker}",
            tier.as_str(),
            tier.label(),
            format!("{}x{}", profile.width, profile.height),
            profile.frame_rate
        );
    }
    Ok(())
}
