//! Resolve the corpus and write the export

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::path::PathBuf;
use std::time::Duration;

use crate::generator::Generator;
use crate::Site;

/// Load, resolve and export the corpus
pub fn run(site: &Site) -> Result<()> {
    run_to(site).map(|_| ())
}

/// Like [`run`], returning the output path
pub fn run_to(site: &Site) -> Result<PathBuf> {
    let start = std::time::Instant::now();

    let (corpus, resolution) = site.resolve()?;
    let path = Generator::new(site).generate(&corpus, &resolution)?;

    let issues = corpus.report().len() + resolution.report().len();
    if issues > 0 {
        tracing::warn!("{} issues recorded, see `issues` in {:?}", issues, path);
    }

    let duration = start.elapsed();
    tracing::info!("Resolved in {:.2}s", duration.as_secs_f64());

    Ok(path)
}

/// Watch for source changes and re-resolve the whole corpus on each one
pub async fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    debouncer
        .watcher()
        .watch(&site.source_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", site.source_dir);

    if let Some(config_path) = crate::config::SiteConfig::find(&site.base_dir) {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let rx = std::sync::Arc::new(std::sync::Mutex::new(rx));
    loop {
        let rx = rx.clone();
        let received = tokio::task::spawn_blocking(move || match rx.lock() {
            Ok(rx) => rx.recv().ok(),
            Err(_) => None,
        })
        .await?;

        match received {
            Some(Ok(events)) => {
                let relevant = events.iter().any(|e| {
                    let path_str = e.path.to_string_lossy();
                    !path_str.contains(".git") && !path_str.ends_with('~')
                });
                if !relevant {
                    continue;
                }

                for event in &events {
                    tracing::debug!("Changed: {}", event.path.display());
                }

                // Reload wholesale, configuration included
                tracing::info!("Source changed, resolving...");
                match Site::new(&site.base_dir).and_then(|site| run(&site)) {
                    Ok(()) => println!("Resolved successfully!"),
                    Err(e) => tracing::error!("Resolution failed: {}", e),
                }
            }
            Some(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            None => break,
        }
    }

    Ok(())
}
