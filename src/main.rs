/*!
 * permcheck - Manifest Checker
 *
 * Loads a JSON model manifest, binds every model against the prefab check
 * registry and prints the compiled policy of each entity and field.
 *
 * Usage: permcheck <manifest.json>
 */

use ai_os_permissions::{init_tracing, CheckRegistry, EngineConfig, ModelManifest, PolicyError};
use anyhow::{bail, Context};
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast::<PolicyError>() {
                Ok(policy) => eprintln!("{:?}", miette::Report::new(policy)),
                Err(other) => eprintln!("error: {:#}", other),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: permcheck <manifest.json>");
    };
    if args.next().is_some() {
        bail!("usage: permcheck <manifest.json>");
    }

    let config = EngineConfig::from_env();
    info!(?config, manifest = %path, "Checking model manifest");

    let manifest = ModelManifest::from_path(&path)
        .with_context(|| format!("failed to load manifest {}", path))?;
    let dictionary = manifest
        .into_dictionary_with(CheckRegistry::default(), config)
        .with_context(|| format!("failed to bind models from {}", path))?;

    for entity in dictionary.entity_names() {
        println!("{}", entity);
        let permissions = dictionary.entity_permissions(entity)?;
        for kind in permissions.bound_kinds() {
            if let Some(tree) = permissions.class_checks_for_permission(kind) {
                println!("  {:<7} {}", kind, tree);
            }
            for field in dictionary.all_fields(entity) {
                if let Some(tree) = permissions.field_checks_for_permission(field, kind) {
                    println!("  {:<7} {}.{}: {}", kind, entity, field, tree);
                }
            }
        }
    }

    info!(entities = dictionary.entity_names().len(), "Manifest is valid");
    Ok(())
}
