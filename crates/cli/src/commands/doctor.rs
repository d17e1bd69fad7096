//! `voxlog doctor` — Diagnose configuration and collaborator health.

use std::time::Duration;

use voxlog_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 voxlog Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                Some(config)
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                None
            }
        }
    } else {
        println!("  ⚠️  No config file at {} — using defaults", config_path.display());
        AppConfig::load().ok()
    };

    let Some(config) = config else {
        println!("\n  ⚠️  {issues} issue(s) found. See above for details.");
        return Ok(());
    };

    // Check API keys
    let missing = config.missing_keys();
    if missing.is_empty() {
        println!("  ✅ API keys configured");
    } else {
        for key in &missing {
            println!("  ❌ Missing API key: {key}");
        }
        issues += missing.len();
    }

    // Probe collaborators only when keys are present; without them every
    // probe would just report an auth failure.
    if missing.is_empty() {
        let (transcriber, synthesizer) = voxlog_providers::build_speech(&config.speech);
        let chat = voxlog_providers::build_chat(&config.chat);

        for (label, healthy) in [
            ("Transcription", probe(transcriber.health_check()).await),
            ("Chat", probe(chat.health_check()).await),
            ("Synthesis", probe(synthesizer.health_check()).await),
        ] {
            if healthy {
                println!("  ✅ {label} collaborator reachable");
            } else {
                println!("  ⚠️  {label} collaborator unreachable");
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

async fn probe(
    check: impl std::future::Future<Output = Result<bool, voxlog_core::UpstreamError>>,
) -> bool {
    matches!(
        tokio::time::timeout(Duration::from_secs(10), check).await,
        Ok(Ok(true))
    )
}
