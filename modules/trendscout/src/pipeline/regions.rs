use std::collections::HashMap;

use tracing::info;

use trendscout_common::{Location, RegionId, TrendScoutError};

use crate::traits::TrendSource;

/// Resolved region ids, in input order, plus the locations that had none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionResolution {
    pub regions: Vec<RegionId>,
    pub unresolved: Vec<Location>,
}

/// Maps location names to the platform's trend region ids.
pub struct RegionResolver<'a> {
    source: &'a dyn TrendSource,
}

impl<'a> RegionResolver<'a> {
    pub fn new(source: &'a dyn TrendSource) -> Self {
        Self { source }
    }

    /// Look every location up (case-insensitively) in the region directory.
    ///
    /// Unknown locations are logged and skipped. Duplicate inputs are kept.
    /// Failing to fetch the directory at all is fatal: nothing can be resolved.
    pub async fn resolve(&self, locations: &[Location]) -> Result<RegionResolution, TrendScoutError> {
        let directory = self
            .source
            .regions()
            .await
            .map_err(|e| TrendScoutError::RegionDirectory(e.to_string()))?;

        // Later entries win when the directory repeats a name.
        let by_name: HashMap<String, RegionId> = directory
            .into_iter()
            .map(|region| (region.name.to_lowercase(), region.id))
            .collect();

        let mut resolution = RegionResolution::default();
        for location in locations {
            match by_name.get(location.as_str()) {
                Some(id) => resolution.regions.push(*id),
                None => {
                    info!(location = location.as_str(), "Location has no trend region, skipping");
                    resolution.unresolved.push(location.clone());
                }
            }
        }

        info!(
            requested = locations.len(),
            resolved = resolution.regions.len(),
            "Regions resolved"
        );
        Ok(resolution)
    }
}
