//! Initialization helpers for terrapick.

use terrapick_core::{PickOptions, Result, TerrainGeometry, TerrainVertex};

use crate::picker::Picker;

/// Installs the `env_logger` backend for terrapick's `log` output.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once;
/// later calls and calls after another logger was installed are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Builds the terrain's spatial index with the configured leaf budget and
/// returns it together with a picker using the same options.
///
/// # Example
///
/// ```
/// use terrapick::*;
///
/// fn main() -> Result<()> {
///     let vertices = vec![
///         TerrainVertex::new(Vec3::new(0.0, 0.0, 0.0)),
///         TerrainVertex::new(Vec3::new(0.0, 0.0, 1.0)),
///         TerrainVertex::new(Vec3::new(1.0, 0.0, 0.0)),
///     ];
///     let (terrain, mut picker) = load_terrain(vertices, &[0, 1, 2], PickOptions::default())?;
///
///     let ray = Ray::new(Vec3::new(0.25, 5.0, 0.25), Vec3::NEG_Y)?;
///     assert!(picker.pick(&terrain, &ray)?.is_hit());
///     Ok(())
/// }
/// ```
pub fn load_terrain(
    vertices: Vec<TerrainVertex>,
    indices: &[u32],
    options: PickOptions,
) -> Result<(TerrainGeometry, Picker)> {
    let terrain = TerrainGeometry::build(vertices, indices, options.leaf_triangle_budget)?;
    log::info!(
        "terrain loaded: {} vertices, {} leaves",
        terrain.vertices().len(),
        terrain.tree().leaf_count()
    );
    Ok((terrain, Picker::new(options)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrapick_core::Vec3;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("logging initialized twice without panicking");
    }

    #[test]
    fn test_load_terrain_uses_budget() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for i in 0..8u32 {
            let x = f32::from(u16::try_from(i).unwrap()) * 2.0;
            let base = i * 3;
            vertices.push(TerrainVertex::new(Vec3::new(x, 0.0, 0.0)));
            vertices.push(TerrainVertex::new(Vec3::new(x, 0.0, 1.0)));
            vertices.push(TerrainVertex::new(Vec3::new(x + 1.0, 0.0, 0.0)));
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        let options = PickOptions::new().with_leaf_triangle_budget(2);
        let (terrain, picker) = load_terrain(vertices, &indices, options.clone()).unwrap();
        assert!(terrain.tree().leaf_count() >= 4);
        assert_eq!(picker.options(), &options);
    }
}
