//! Recognition engine status command.

use console::style;

use pagefuse::config::Config;
use pagefuse::ocr::ImageRecognitionTrack;
use pagefuse::services::DualTrackOrchestrator;

pub fn cmd_engines(config: &Config) -> anyhow::Result<()> {
    let orchestrator = DualTrackOrchestrator::from_config(config);

    print_track("OCR", &config.recognition.ocr_engine, orchestrator.ocr_track());
    print_track(
        "Vision",
        &config.recognition.vision_engine,
        orchestrator.vision_track(),
    );

    if !orchestrator.has_tracks() {
        println!(
            "\n{} No recognition engines enabled; image regions will be tagged image_only",
            style("!").yellow()
        );
    }
    Ok(())
}

fn print_track(label: &str, configured: &str, track: Option<&ImageRecognitionTrack>) {
    match track {
        Some(track) => {
            let engine = track.engine();
            let marker = if engine.is_available() {
                style("✓").green()
            } else {
                style("✗").red()
            };
            println!(
                "{} {:<7} {} (timeout {}ms)",
                marker,
                label,
                engine.name(),
                track.timeout().as_millis()
            );
            println!("          {}", engine.availability_hint());
        }
        None => println!(
            "{} {:<7} disabled (configured: \"{}\")",
            style("-").dim(),
            label,
            configured
        ),
    }
}
