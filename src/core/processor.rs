//! Per-variant region sets and scan processing
//!
//! Each variant carries a hand-calibrated list of regions. Processing runs
//! every region in order; regions are independent of each other.

use tracing::debug;

use crate::core::region::{
    classify_region, ClassifiedRegion, EmptyRegionError, Interval, Limit, MeasurementRow,
    RegionDefinition, RegionGroup, RegionPredicate, ScanWindow,
};
use crate::core::stats::{self, SubsetSpread};
use crate::core::variant::ComponentVariant;

const fn region(
    name: &'static str,
    group: RegionGroup,
    x: Interval,
    y: Interval,
    window: Option<ScanWindow>,
) -> RegionDefinition {
    RegionDefinition::new(name, group, RegionPredicate::new(x, y), window)
}

/// Bare flex: four pickup quadrants and three jig references
pub const FLEX_REGIONS: &[RegionDefinition] = &[
    region(
        "quad1",
        RegionGroup::Quad,
        Interval::at_least(159.0),
        Interval::ANY,
        Some(ScanWindow::tail(308, 3)),
    ),
    region(
        "quad2",
        RegionGroup::Quad,
        Interval::new(Limit::Open(146.0), Limit::Closed(158.0)),
        Interval::ANY,
        Some(ScanWindow::tail(618, 309)),
    ),
    region(
        "quad3",
        RegionGroup::Quad,
        Interval::open(130.0, 140.0),
        Interval::open(155.0, 170.0),
        None,
    ),
    region(
        "quad4",
        RegionGroup::Quad,
        Interval::at_least(146.0),
        Interval::ANY,
        Some(ScanWindow::tail(1278, 946)),
    ),
    region(
        "jig1",
        RegionGroup::Jig,
        Interval::below(146.0),
        Interval::above(180.0),
        Some(ScanWindow::head(785, 899)),
    ),
    region(
        "jig2",
        RegionGroup::Jig,
        Interval::open(148.0, 157.0),
        Interval::open(181.0, 190.0),
        None,
    ),
    region(
        "jig3",
        RegionGroup::Jig,
        Interval::open(135.0, 150.0),
        Interval::open(134.0, 150.0),
        None,
    ),
];

/// Bare module: three sensor regions and three front-end chip footprints
pub const BARE_REGIONS: &[RegionDefinition] = &[
    region(
        "sensor1",
        RegionGroup::Sensor,
        Interval::open(132.0, 161.0),
        Interval::open(146.0, 175.0),
        None,
    ),
    region(
        "sensor2",
        RegionGroup::Sensor,
        Interval::open(146.0, 148.0),
        Interval::open(132.0, 189.0),
        None,
    ),
    region(
        "sensor3",
        RegionGroup::Sensor,
        Interval::open(118.0, 176.0),
        Interval::open(159.0, 162.0),
        None,
    ),
    region(
        "fe1",
        RegionGroup::FrontEnd,
        Interval::open(147.0, 177.0),
        Interval::open(130.0, 162.0),
        None,
    ),
    region(
        "fe2",
        RegionGroup::FrontEnd,
        Interval::open(126.0, 132.0),
        Interval::open(169.0, 176.0),
        None,
    ),
    region(
        "fe3",
        RegionGroup::FrontEnd,
        Interval::open(140.0, 147.0),
        Interval::open(183.0, 191.0),
        None,
    ),
];

/// Assembled module: four pickup areas and three sensor regions
pub const ASSEMBLED_REGIONS: &[RegionDefinition] = &[
    region(
        "ga1",
        RegionGroup::Pickup,
        Interval::open(136.0, 138.0),
        Interval::open(159.0, 161.0),
        None,
    ),
    region(
        "ga2",
        RegionGroup::Pickup,
        Interval::open(147.0, 151.0),
        Interval::open(148.0, 152.0),
        None,
    ),
    region(
        "ga3",
        RegionGroup::Pickup,
        Interval::open(158.0, 162.0),
        Interval::open(158.0, 162.0),
        None,
    ),
    region(
        "ga4",
        RegionGroup::Pickup,
        Interval::open(146.0, 149.0),
        Interval::open(172.0, 174.0),
        None,
    ),
    region(
        "sens1",
        RegionGroup::Sensor,
        Interval::open(118.0, 132.0),
        Interval::open(147.0, 160.0),
        None,
    ),
    region(
        "sens2",
        RegionGroup::Sensor,
        Interval::open(137.0, 146.0),
        Interval::open(132.0, 142.0),
        None,
    ),
    region(
        "sens3",
        RegionGroup::Sensor,
        Interval::open(147.0, 157.0),
        Interval::open(179.0, 190.0),
        None,
    ),
];

/// Runs a variant's regions over a probe scan
#[derive(Debug, Clone)]
pub struct VariantProcessor {
    variant: ComponentVariant,
    regions: &'static [RegionDefinition],
}

impl VariantProcessor {
    pub fn flex() -> Self {
        Self::for_variant(ComponentVariant::Flex)
    }

    pub fn bare() -> Self {
        Self::for_variant(ComponentVariant::Bare)
    }

    pub fn assembled() -> Self {
        Self::for_variant(ComponentVariant::Assembled)
    }

    pub fn for_variant(variant: ComponentVariant) -> Self {
        let regions = match variant {
            ComponentVariant::Flex => FLEX_REGIONS,
            ComponentVariant::Bare => BARE_REGIONS,
            ComponentVariant::Assembled => ASSEMBLED_REGIONS,
        };
        Self { variant, regions }
    }

    pub fn variant(&self) -> ComponentVariant {
        self.variant
    }

    pub fn regions(&self) -> &'static [RegionDefinition] {
        self.regions
    }

    /// Classify every region in definition order
    ///
    /// Fails on the first region that retains no rows.
    pub fn process_all(&self, rows: &[MeasurementRow]) -> Result<VariantScan, EmptyRegionError> {
        let mut regions = Vec::with_capacity(self.regions.len());
        for definition in self.regions {
            let classified = classify_region(rows, definition)?;
            debug!(
                "{} region {}: {} row(s) retained",
                self.variant,
                classified.name,
                classified.len()
            );
            regions.push(classified);
        }

        let scan = VariantScan {
            variant: self.variant,
            regions,
        };
        if let Some(pooled) = scan.pooled_deviation() {
            debug!("{} pooled z deviation across regions: {:.4}mm", self.variant, pooled);
        }
        Ok(scan)
    }
}

/// Outlier-free regions of one scan
#[derive(Debug, Clone, PartialEq)]
pub struct VariantScan {
    pub variant: ComponentVariant,
    pub regions: Vec<ClassifiedRegion>,
}

impl VariantScan {
    pub fn region(&self, name: &str) -> Option<&ClassifiedRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// z-values of every region in `group`, concatenated in region order
    pub fn group_z(&self, group: RegionGroup) -> Vec<f64> {
        self.regions
            .iter()
            .filter(|r| r.group == group)
            .flat_map(|r| r.z_values.iter().copied())
            .collect()
    }

    /// All retained rows, concatenated in region order
    pub fn combined_rows(&self) -> Vec<MeasurementRow> {
        self.regions
            .iter()
            .flat_map(|r| r.rows.iter().copied())
            .collect()
    }

    /// Sample deviation of a group's z-values
    pub fn group_stdev(&self, group: RegionGroup) -> Result<f64, stats::StatsError> {
        stats::sample_stdev(&self.group_z(group))
    }

    /// Combined deviation of all regions from their individual spreads
    pub fn pooled_deviation(&self) -> Option<f64> {
        let spreads: Vec<SubsetSpread> = self.regions.iter().map(|r| r.spread()).collect();
        stats::pooled_deviation(&spreads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::region::FilterStage;

    fn bare_scan() -> Vec<MeasurementRow> {
        let mut rows = Vec::new();
        // sensor1/sensor2/sensor3 overlap around (147, 160)
        for i in 0..4 {
            rows.push(MeasurementRow::new(147.0, 160.0 + i as f64 * 0.1, 0.375));
        }
        for i in 0..4 {
            rows.push(MeasurementRow::new(150.0 + i as f64, 140.0, 0.25));
        }
        for i in 0..3 {
            rows.push(MeasurementRow::new(128.0, 170.0 + i as f64, 0.25));
        }
        for i in 0..3 {
            rows.push(MeasurementRow::new(143.0, 185.0 + i as f64, 0.25));
        }
        rows
    }

    #[test]
    fn test_region_counts_per_variant() {
        assert_eq!(VariantProcessor::flex().regions().len(), 7);
        assert_eq!(VariantProcessor::bare().regions().len(), 6);
        assert_eq!(VariantProcessor::assembled().regions().len(), 7);
    }

    #[test]
    fn test_bare_process_all_groups_regions() {
        let scan = VariantProcessor::bare().process_all(&bare_scan()).unwrap();
        assert_eq!(scan.regions.len(), 6);
        // Each sensor region sees the same 4 overlap points
        assert_eq!(scan.group_z(RegionGroup::Sensor).len(), 12);
        assert_eq!(scan.group_z(RegionGroup::FrontEnd).len(), 10);
        assert_eq!(scan.combined_rows().len(), 22);
        assert_eq!(scan.region("fe2").unwrap().len(), 3);
    }

    #[test]
    fn test_missing_region_aborts_processing() {
        let rows: Vec<MeasurementRow> = bare_scan().into_iter().filter(|r| r.y < 180.0).collect();
        let err = VariantProcessor::bare().process_all(&rows).unwrap_err();
        assert_eq!(err.region, "fe3");
        assert_eq!(err.stage, FilterStage::Geometric);
        assert_eq!(err.predicate, "140 < x < 147 and 183 < y < 191");
    }

    #[test]
    fn test_group_stdev_of_flat_group_is_zero() {
        let scan = VariantProcessor::bare().process_all(&bare_scan()).unwrap();
        assert_eq!(scan.group_stdev(RegionGroup::FrontEnd).unwrap(), 0.0);
    }
}
