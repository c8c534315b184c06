use anyhow::{Context, Result};
use restgen::{ActionCatalog, ApiManifest, ConfigManager, ModelCatalog, SmartSampler};
use std::env;

/// Print sampled sequences for an API manifest.
///
/// Usage: `cargo run --example sample_sequences -- [manifest.json] [config.toml] [count]`
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let manifest_path = args.get(1).map(String::as_str).unwrap_or("demos/petstore.json");
    let count: usize = match args.get(3) {
        Some(n) => n.parse().context("count must be a number")?,
        None => 20,
    };

    let manager = ConfigManager::new();
    if let Some(config_path) = args.get(2) {
        manager
            .load_from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path))?;
    }
    let config = manager.get();

    let manifest = ApiManifest::from_file(manifest_path)
        .with_context(|| format!("Failed to read manifest {}", manifest_path))?;
    let actions = ActionCatalog::from_manifest(&manifest, &config.sampling.endpoints_to_skip)
        .context("Failed to build the action catalog")?;
    let models = ModelCatalog::from_manifest(&manifest).context("Failed to build the model catalog")?;

    println!(
        "{} operations, {} models, {} users",
        actions.len(),
        models.len(),
        config.auth.users.len()
    );

    let mut sampler = SmartSampler::new(actions, models, config.auth.contexts(), config.sampling)?;
    for i in 0..count {
        let sequence = sampler.sample()?;
        println!("#{} {} ({} actions)", i + 1, sequence.sample_type(), sequence.len());
        print!("{}", sequence.describe()?);
    }
    Ok(())
}
