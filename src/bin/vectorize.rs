use repixel::image::io::{load_rgba, write_json_file};
use repixel::pipeline::{vectorize_raster, VectorOptions};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct VectorizeToolConfig {
    #[serde(rename = "input")]
    pub input: PathBuf,
    #[serde(rename = "output_svg")]
    pub output_svg: PathBuf,
    /// Optional path for the processing manifest JSON.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub options: VectorOptions,
}

pub fn load_config(path: &Path) -> Result<VectorizeToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let source = load_rgba(&config.input)?;
    let output = vectorize_raster(source, &config.options)
        .map_err(|e| format!("Pipeline failed: {e}"))?;

    fs::write(&config.output_svg, &output.svg)
        .map_err(|e| format!("Failed to write {}: {e}", config.output_svg.display()))?;
    if let Some(manifest_path) = &config.manifest {
        write_json_file(manifest_path, &output.manifest)?;
    }

    println!(
        "Vectorized {}x{} into {} colors in {:.1} ms",
        output.manifest.original_size[0],
        output.manifest.original_size[1],
        output.palette.len(),
        output.manifest.elapsed_ms,
    );
    Ok(())
}

fn usage() -> String {
    "Usage: vectorize <config.json>".to_string()
}
