//! Channel requirement resolution.
//!
//! Given the channel inventory of a scene and the prerequisite wavelengths
//! of the products about to be rendered, the resolver computes which
//! channels must be loaded and which resident channels are no longer
//! needed. Matching is first-wins in inventory order, so overlapping
//! channel ranges resolve deterministically.

use tracing::debug;

use crate::scene::Channel;

/// Load and unload decisions for one production pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPlan {
    /// Channels the pass needs, in the order the prerequisites first
    /// matched them.
    pub required: Vec<String>,
    /// Required channels that are not resident yet, in inventory order.
    pub to_load: Vec<String>,
    /// Resident channels no longer required, in inventory order.
    pub to_unload: Vec<String>,
}

/// Resolves prerequisite wavelengths against a channel inventory.
///
/// A wavelength selects the first channel whose range contains it.
/// Wavelengths matching no channel are dropped without error; the composite
/// that needed them will fail on its own terms at render time.
pub fn resolve(channels: &[Channel], wavelengths: &[f64]) -> ChannelPlan {
    let mut required: Vec<String> = Vec::new();
    for &wavelength in wavelengths {
        match channels.iter().find(|c| c.wavelength.contains(wavelength)) {
            Some(channel) => {
                if !required.iter().any(|name| name == &channel.name) {
                    required.push(channel.name.clone());
                }
            }
            None => {
                debug!(wavelength, "No channel covers prerequisite wavelength");
            }
        }
    }

    let to_load = channels
        .iter()
        .filter(|c| !c.loaded && required.iter().any(|name| name == &c.name))
        .map(|c| c.name.clone())
        .collect();
    let to_unload = channels
        .iter()
        .filter(|c| c.loaded && !required.iter().any(|name| name == &c.name))
        .map(|c| c.name.clone())
        .collect();

    ChannelPlan {
        required,
        to_load,
        to_unload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::sim::seviri_channels;
    use proptest::prelude::*;

    fn inventory(loaded: &[&str]) -> Vec<Channel> {
        seviri_channels()
            .into_iter()
            .map(|mut c| {
                c.loaded = loaded.contains(&c.name.as_str());
                c
            })
            .collect()
    }

    #[test]
    fn test_first_matching_channel_wins() {
        // 0.85 um falls inside both VIS008 and HRV; inventory order picks
        // VIS008.
        let plan = resolve(&inventory(&[]), &[0.85]);
        assert_eq!(plan.required, vec!["VIS008"]);
    }

    #[test]
    fn test_unmatched_wavelength_is_dropped() {
        let plan = resolve(&inventory(&[]), &[99.9]);
        assert!(plan.required.is_empty());
        assert!(plan.to_load.is_empty());
    }

    #[test]
    fn test_duplicate_wavelengths_collapse() {
        let plan = resolve(&inventory(&[]), &[10.8, 10.8, 12.0]);
        assert_eq!(plan.required, vec!["IR_108", "IR_120"]);
    }

    #[test]
    fn test_loads_missing_and_unloads_extra() {
        // overview needs VIS006, VIS008, IR_108; WV_062 is resident but
        // unwanted.
        let plan = resolve(&inventory(&["VIS006", "WV_062"]), &[0.635, 0.85, 10.8]);
        assert_eq!(plan.to_load, vec!["VIS008", "IR_108"]);
        assert_eq!(plan.to_unload, vec!["WV_062"]);
    }

    #[test]
    fn test_resident_required_channels_untouched() {
        let plan = resolve(&inventory(&["VIS006", "VIS008", "IR_108"]), &[0.635, 0.85, 10.8]);
        assert!(plan.to_load.is_empty());
        assert!(plan.to_unload.is_empty());
    }

    #[test]
    fn test_overlapping_products_share_channels() {
        // overview and natural both use 0.635 and 0.85.
        let plan = resolve(&inventory(&[]), &[0.635, 0.85, 10.8, 1.63, 0.85, 0.635]);
        // required follows first-match order (10.8 before 1.63), to_load
        // follows the inventory (IR_016 before IR_108).
        assert_eq!(plan.required, vec!["VIS006", "VIS008", "IR_108", "IR_016"]);
        assert_eq!(plan.to_load, vec!["VIS006", "VIS008", "IR_016", "IR_108"]);
    }

    proptest! {
        #[test]
        fn prop_plan_converges_on_required_set(
            loaded_mask in proptest::collection::vec(any::<bool>(), 12),
            wavelengths in proptest::collection::vec(0.4f64..16.0, 0..10),
        ) {
            let mut channels = seviri_channels();
            for (channel, &loaded) in channels.iter_mut().zip(&loaded_mask) {
                channel.loaded = loaded;
            }

            let plan = resolve(&channels, &wavelengths);

            // Load and unload never overlap, and each side only names
            // channels in the matching residency state.
            for name in &plan.to_load {
                prop_assert!(!plan.to_unload.contains(name));
                let channel = channels.iter().find(|c| &c.name == name).unwrap();
                prop_assert!(!channel.loaded);
                prop_assert!(plan.required.contains(name));
            }
            for name in &plan.to_unload {
                let channel = channels.iter().find(|c| &c.name == name).unwrap();
                prop_assert!(channel.loaded);
                prop_assert!(!plan.required.contains(name));
            }

            // Applying the plan leaves exactly the required set resident.
            for channel in channels.iter_mut() {
                if plan.to_load.contains(&channel.name) {
                    channel.loaded = true;
                }
                if plan.to_unload.contains(&channel.name) {
                    channel.loaded = false;
                }
            }
            let resident: Vec<&String> =
                channels.iter().filter(|c| c.loaded).map(|c| &c.name).collect();
            prop_assert_eq!(resident.len(), plan.required.len());
            for name in &plan.required {
                prop_assert!(resident.contains(&name));
            }

            // Resolving again is a fixed point.
            let again = resolve(&channels, &wavelengths);
            prop_assert!(again.to_load.is_empty());
            prop_assert!(again.to_unload.is_empty());
        }
    }
}
