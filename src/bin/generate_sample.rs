use std::path::PathBuf;

use anyhow::{Context, Result};
use snowvis_coeff::data::writer::write_file;
use snowvis_coeff::{CategoryTable, FileFormat, LoadOptions, SnowVisCoeff};

/// Smooth visible-band emissivity curve: high and flat for fresh snow,
/// dropping towards the red end as grains coarsen.
fn emissivity_curve(
    wavelengths: &[f64],
    base: f64,
    red_drop: f64,
    jitter: &mut Jitter,
) -> Vec<f64> {
    let (lo, hi) = (wavelengths[0], wavelengths[wavelengths.len() - 1]);
    wavelengths
        .iter()
        .map(|&wl| {
            let t = (wl - lo) / (hi - lo);
            (base - red_drop * t * t + jitter.sample()).clamp(0.0, 1.0)
        })
        .collect()
}

/// Reproducible measurement scatter, uniform in `[-amplitude, amplitude)`.
/// Driven by a splitmix64 counter so the sample file is identical on every run.
struct Jitter {
    counter: u64,
    amplitude: f64,
}

impl Jitter {
    fn new(seed: u64, amplitude: f64) -> Self {
        Jitter { counter: seed, amplitude }
    }

    fn sample(&mut self) -> f64 {
        self.counter = self.counter.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.counter;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        let unit = (z >> 11) as f64 / (1u64 << 53) as f64;
        (2.0 * unit - 1.0) * self.amplitude
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut jitter = Jitter::new(42, 0.003);

    // Wavelengths in micrometres: 0.40 → 0.70, step 0.01
    let wavelengths: Vec<f64> = (0..=30).map(|i| 0.40 + i as f64 * 0.01).collect();

    let categories: [(&str, f64, f64); 6] = [
        ("fresh_snow", 0.990, 0.020),
        ("fine_grain_snow", 0.985, 0.040),
        ("medium_grain_snow", 0.975, 0.070),
        ("coarse_grain_snow", 0.960, 0.110),
        ("wet_snow", 0.930, 0.160),
        ("glacial_ice", 0.880, 0.220),
    ];

    let mut surface_types = Vec::with_capacity(categories.len());
    let mut emissivity = Vec::with_capacity(categories.len() * wavelengths.len());
    for (name, base, red_drop) in categories {
        surface_types.push(name.to_string());
        emissivity.extend(emissivity_curve(&wavelengths, base, red_drop, &mut jitter));
    }

    let table = CategoryTable::new("Snow", wavelengths, surface_types, emissivity)
        .context("building sample table")?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    write_file(&out_dir.join("snow_vis.bin"), &table, FileFormat::Binary)?;
    write_file(&out_dir.join("snow_vis.parquet"), &table, FileFormat::Parquet)?;

    // Round-trip both files through the store before declaring success.
    let prefix = format!("{}/", out_dir.display());
    let mut coeff = SnowVisCoeff::new();
    for (filename, alternate) in [("snow_vis.bin", false), ("snow_vis.parquet", true)] {
        let options = LoadOptions::new()
            .with_file_path(prefix.clone())
            .with_alternate_format(alternate);
        coeff.load(filename, &options)?;
        coeff.destroy(None)?;
    }

    println!(
        "Wrote {} surface types ({} wavelengths each) to {}",
        table.n_surface_types(),
        table.n_frequencies(),
        out_dir.display()
    );
    Ok(())
}
