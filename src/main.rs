use std::path::PathBuf;

use anyhow::Context;
use prosumer_idt_rs::idt_pipeline::{IdtConfig, IdtPipeline, ProjectSettings};
use prosumer_idt_rs::logger;

use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    logger::init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("project_settings.json"));

    info!("Starting prosumer IDT characterisation...");

    let settings = ProjectSettings::from_file(&settings_path)
        .with_context(|| format!("loading {}", settings_path.display()))?;
    let config = IdtConfig::try_from(&settings).context("invalid project settings")?;
    let captures = settings.capture_set()?;

    info!("Camera: {}", config.camera_model);
    info!("Optimisation space: {:?}", config.optimiser.space);
    info!("Decoding method: {:?}", config.decoding.method);
    info!("LUT size: {}", config.lut.size);

    let pipeline = IdtPipeline::new(config)?;
    let outcome = pipeline
        .run(&captures)
        .context("characterisation failed")?;

    for overwrite in &outcome.merge.overwritten {
        warn!(
            "Exposure {} given twice, kept '{}' over '{}'",
            overwrite.ev, overwrite.kept, overwrite.replaced
        );
    }

    let result = &outcome.optimisation;
    let idt = result.idt_matrix();
    info!("White balance: {:?}, k = {:.6}", result.rgb_w, result.k);
    for row in idt.row_iter() {
        info!("IDT  [{:>10.6} {:>10.6} {:>10.6}]", row[0], row[1], row[2]);
    }
    info!(
        "Mean delta E: {:.6} ({:?}), CIEDE2000: {:.4}",
        result.delta_e, result.space, result.delta_e_2000
    );
    if !result.converged {
        warn!(
            "Optimiser stopped after {} iterations without converging",
            result.iterations
        );
    }

    Ok(())
}
