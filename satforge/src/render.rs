//! Product rendering and scene archival.
//!
//! [`render_area`] walks the configured products of one area against a
//! projected scene. Each product is gated, rendered and saved on its own;
//! a failing product never takes the rest of the area down with it.

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::config::{AreaConfig, OutputNaming};
use crate::filters::{check_satellite, check_sun_zenith, SolarCache};
use crate::provider::{AreaDefinition, Astronomy, CompositeRegistry, Scene, SceneError};
use crate::report::ProductOutcome;
use crate::scene::{ArchiveFormat, SatelliteId, TimeSlot};
use crate::template::{output_path, NameContext};

/// Renders every product of one area, returning one outcome per product.
pub fn render_area(
    scene: &dyn Scene,
    area_def: &dyn AreaDefinition,
    area: &AreaConfig,
    composites: &CompositeRegistry,
    astronomy: &dyn Astronomy,
    time_slot: TimeSlot,
    satellite: &SatelliteId,
) -> Vec<ProductOutcome> {
    let mut outcomes = Vec::with_capacity(area.products.len());
    let mut solar = SolarCache::default();
    let identity = satellite.identity();

    for product in &area.products {
        if !check_satellite(product, &identity) {
            debug!(
                area = %area.name,
                product = %product.name,
                satellite = %identity,
                "Satellite filtered out, skipping product"
            );
            outcomes.push(ProductOutcome::SkippedSatellite {
                product: product.name.clone(),
            });
            continue;
        }

        if !check_sun_zenith(product, area_def, &mut solar, &time_slot, astronomy) {
            outcomes.push(ProductOutcome::SkippedSunZenith {
                product: product.name.clone(),
            });
            continue;
        }

        let op = match composites.get(&product.composite) {
            Some(op) => op,
            None => {
                warn!(
                    area = %area.name,
                    product = %product.name,
                    composite = %product.composite,
                    "Composite not in registry, skipping product"
                );
                outcomes.push(ProductOutcome::CompositeNotFound {
                    product: product.name.clone(),
                    composite: product.composite.clone(),
                });
                continue;
            }
        };

        let image = match op.render(scene) {
            Ok(image) => image,
            Err(err) => {
                error!(
                    area = %area.name,
                    product = %product.name,
                    error = %err,
                    "Failed to render product"
                );
                outcomes.push(ProductOutcome::Failed {
                    product: product.name.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let ctx = NameContext::new(time_slot, satellite)
            .with_area(&area.name)
            .with_product(&product.name);
        let path = output_path(&product.output, &ctx);
        match image.save(&path) {
            Ok(()) => {
                info!(
                    area = %area.name,
                    product = %product.name,
                    path = %path.display(),
                    "Product rendered"
                );
                outcomes.push(ProductOutcome::Rendered {
                    product: product.name.clone(),
                    path,
                });
            }
            Err(err) => {
                error!(
                    area = %area.name,
                    product = %product.name,
                    path = %path.display(),
                    error = %err,
                    "Failed to save product"
                );
                outcomes.push(ProductOutcome::Failed {
                    product: product.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    outcomes
}

/// Archives a scene, loading whatever channels are not resident yet.
///
/// With `unload_after` the whole inventory is released once the archive is
/// written.
pub fn archive_scene(
    scene: &mut dyn Scene,
    naming: &OutputNaming,
    ctx: &NameContext<'_>,
    unload_after: bool,
) -> Result<PathBuf, SceneError> {
    let missing: Vec<String> = scene
        .channels()
        .into_iter()
        .filter(|c| !c.loaded)
        .map(|c| c.name)
        .collect();
    if !missing.is_empty() {
        scene.load(&missing, None)?;
    }

    let path = output_path(naming, ctx);
    scene.save(&path, ArchiveFormat::NetCdf4)?;
    info!(path = %path.display(), "Scene archived");

    if unload_after {
        let all: Vec<String> = scene.channels().into_iter().map(|c| c.name).collect();
        if !all.is_empty() {
            scene.unload(&all)?;
        }
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProductSpec;
    use crate::provider::sim::{
        seviri_channels, standard_composites, FixedAstronomy, SimArea, SimComposite,
        SimSceneSource,
    };
    use crate::provider::SceneSource;
    use crate::resolver;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn satellite() -> SatelliteId {
        let mut fields = HashMap::new();
        fields.insert("satellite".to_string(), "meteosat".to_string());
        fields.insert("satnumber".to_string(), "9".to_string());
        fields.insert("instrument".to_string(), "seviri".to_string());
        SatelliteId::from_fields(&fields).unwrap()
    }

    fn slot() -> TimeSlot {
        TimeSlot::from_ymd_hm(2014, 3, 21, 10, 15).unwrap()
    }

    fn naming(dir: &Path) -> OutputNaming {
        OutputNaming {
            directory: dir.to_path_buf(),
            pattern: "%(areaname)_%Y%m%d_%H%M_%(composite).%(ending)".to_string(),
        }
    }

    fn product(name: &str, composite: &str, dir: &Path) -> ProductSpec {
        ProductSpec {
            name: name.to_string(),
            composite: composite.to_string(),
            output: naming(dir),
            sunzen_day_maximum: None,
            sunzen_night_minimum: None,
            valid_satellites: None,
            invalid_satellites: None,
        }
    }

    fn area(products: Vec<ProductSpec>) -> AreaConfig {
        AreaConfig {
            name: "Europe".to_string(),
            definition: "euro4".to_string(),
            archive: None,
            valid_satellites: None,
            invalid_satellites: None,
            products,
        }
    }

    fn prepared_scene(composites: &CompositeRegistry, area: &AreaConfig) -> Box<dyn Scene> {
        let source = SimSceneSource::new(seviri_channels());
        let mut scene = source.create_scene(&satellite(), &slot()).unwrap();
        scene.set_identity(&satellite());

        let mut wavelengths = Vec::new();
        for product in &area.products {
            if let Some(op) = composites.get(&product.composite) {
                wavelengths.extend_from_slice(op.prerequisites());
            }
        }
        let plan = resolver::resolve(&scene.channels(), &wavelengths);
        scene.load(&plan.to_load, None).unwrap();
        scene
    }

    #[test]
    fn test_renders_all_products() {
        let dir = tempdir().unwrap();
        let composites = standard_composites();
        let area = area(vec![
            product("overview", "overview", dir.path()),
            product("natural", "natural", dir.path()),
        ]);
        let scene = prepared_scene(&composites, &area);
        let area_def = SimArea::new("euro4", 8, 8);

        let outcomes = render_area(
            scene.as_ref(),
            &area_def,
            &area,
            &composites,
            &FixedAstronomy::new(45.0),
            slot(),
            &satellite(),
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.is_rendered()));
        assert!(dir
            .path()
            .join("Europe_20140321_1015_overview.png")
            .exists());
        assert!(dir.path().join("Europe_20140321_1015_natural.png").exists());
    }

    #[test]
    fn test_product_satellite_filter_uses_identity() {
        let dir = tempdir().unwrap();
        let composites = standard_composites();

        // The allow list names identities; the bare platform name is not
        // enough.
        let mut rejected = product("overview", "overview", dir.path());
        rejected.valid_satellites = Some(vec!["meteosat".to_string()]);
        let mut accepted = product("natural", "natural", dir.path());
        accepted.valid_satellites = Some(vec!["meteosat9".to_string()]);

        let area = area(vec![rejected, accepted]);
        let scene = prepared_scene(&composites, &area);
        let area_def = SimArea::new("euro4", 8, 8);

        let outcomes = render_area(
            scene.as_ref(),
            &area_def,
            &area,
            &composites,
            &FixedAstronomy::new(45.0),
            slot(),
            &satellite(),
        );

        assert_eq!(
            outcomes[0],
            ProductOutcome::SkippedSatellite {
                product: "overview".to_string()
            }
        );
        assert!(outcomes[1].is_rendered());
    }

    #[test]
    fn test_night_product_skipped_in_daylight() {
        let dir = tempdir().unwrap();
        let composites = standard_composites();
        let mut night = product("night_fog", "night_fog", dir.path());
        night.sunzen_night_minimum = Some(90.0);
        let area = area(vec![product("overview", "overview", dir.path()), night]);
        let scene = prepared_scene(&composites, &area);
        let area_def = SimArea::new("euro4", 8, 8);

        let outcomes = render_area(
            scene.as_ref(),
            &area_def,
            &area,
            &composites,
            &FixedAstronomy::new(45.0),
            slot(),
            &satellite(),
        );

        assert!(outcomes[0].is_rendered());
        assert_eq!(
            outcomes[1],
            ProductOutcome::SkippedSunZenith {
                product: "night_fog".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_composite_contained() {
        let dir = tempdir().unwrap();
        let composites = standard_composites();
        let area = area(vec![
            product("cloudtop", "cloudtop", dir.path()),
            product("overview", "overview", dir.path()),
        ]);
        let scene = prepared_scene(&composites, &area);
        let area_def = SimArea::new("euro4", 8, 8);

        let outcomes = render_area(
            scene.as_ref(),
            &area_def,
            &area,
            &composites,
            &FixedAstronomy::new(45.0),
            slot(),
            &satellite(),
        );

        assert_eq!(
            outcomes[0],
            ProductOutcome::CompositeNotFound {
                product: "cloudtop".to_string(),
                composite: "cloudtop".to_string(),
            }
        );
        assert!(outcomes[1].is_rendered());
    }

    #[test]
    fn test_render_failure_contained() {
        let dir = tempdir().unwrap();
        let mut composites = standard_composites();
        composites.register("broken", Arc::new(SimComposite::failing("broken", vec![10.8])));
        let area = area(vec![
            product("broken", "broken", dir.path()),
            product("overview", "overview", dir.path()),
        ]);
        let scene = prepared_scene(&composites, &area);
        let area_def = SimArea::new("euro4", 8, 8);

        let outcomes = render_area(
            scene.as_ref(),
            &area_def,
            &area,
            &composites,
            &FixedAstronomy::new(45.0),
            slot(),
            &satellite(),
        );

        assert!(matches!(
            &outcomes[0],
            ProductOutcome::Failed { product, .. } if product == "broken"
        ));
        assert!(outcomes[1].is_rendered());
    }

    #[test]
    fn test_archive_loads_missing_channels() {
        let dir = tempdir().unwrap();
        let source = SimSceneSource::new(seviri_channels());
        let mut scene = source.create_scene(&satellite(), &slot()).unwrap();
        scene.set_identity(&satellite());

        let naming = OutputNaming {
            directory: dir.path().to_path_buf(),
            pattern: "global_%Y%m%d_%H%M.nc".to_string(),
        };
        let sat = satellite();
        let ctx = NameContext::new(slot(), &sat);
        let path = archive_scene(scene.as_mut(), &naming, &ctx, false).unwrap();

        assert_eq!(path, dir.path().join("global_20140321_1015.nc"));
        assert!(path.exists());
        assert!(scene.channels().iter().all(|c| c.loaded));
    }

    #[test]
    fn test_archive_unload_after() {
        let dir = tempdir().unwrap();
        let source = SimSceneSource::new(seviri_channels());
        let mut scene = source.create_scene(&satellite(), &slot()).unwrap();
        scene.set_identity(&satellite());

        let naming = OutputNaming {
            directory: dir.path().to_path_buf(),
            pattern: "global.nc".to_string(),
        };
        let sat = satellite();
        let ctx = NameContext::new(slot(), &sat);
        archive_scene(scene.as_mut(), &naming, &ctx, true).unwrap();

        assert!(scene.channels().iter().all(|c| !c.loaded));
    }
}
