//! Per-tick metrics collection.

use crate::agent::{PerSpecies, Species};
use crate::world::{TickReport, World};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// User-registered scalar summary of the world
pub type Reporter = Box<dyn Fn(&World) -> f64 + Send + Sync>;

/// Metrics snapshot for one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Simulation tick the snapshot was taken at
    pub tick: u64,
    /// Live agents per species
    pub counts: PerSpecies<usize>,
    /// Births during this tick
    #[serde(default)]
    pub births: PerSpecies<usize>,
    /// Deaths during this tick, all causes
    #[serde(default)]
    pub deaths: PerSpecies<usize>,
    /// First tick each species had no live agents
    pub extinction_tick: PerSpecies<Option<u64>>,
    /// Total chemical in the field
    pub total_chemical: f64,
    /// Patches with grown grass
    pub grown_patches: usize,
    /// Values of registered reporters, by name
    #[serde(default)]
    pub extras: BTreeMap<String, f64>,
}

impl MetricsRecord {
    /// Format the record as a one-line summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "T:{:6} | Sheep:{:5} | Wolves:{:5} | Bees:{:5} | Grass:{:5} | Chem:{:.1}",
            self.tick,
            self.counts.sheep,
            self.counts.wolves,
            self.counts.bees,
            self.grown_patches,
            self.total_chemical,
        );
        for (name, value) in &self.extras {
            line.push_str(&format!(" | {name}:{value:.2}"));
        }
        line
    }
}

impl fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Append-only sequence of metrics records.
///
/// Only a [`MetricsCollector`] appends; holders of a log can read it but not
/// rewrite it.
///
/// ```compile_fail
/// let mut log = ecosim::MetricsLog::new();
/// log.records.clear();
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsLog {
    records: Vec<MetricsRecord>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, oldest first
    pub fn records(&self) -> &[MetricsRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricsRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&MetricsRecord> {
        self.records.last()
    }

    fn push(&mut self, record: MetricsRecord) -> &MetricsRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Live count of one species over time
    pub fn count_series(&self, species: Species) -> Vec<(u64, usize)> {
        self.records
            .iter()
            .map(|r| (r.tick, r.counts[species]))
            .collect()
    }

    /// Values of one registered reporter over time
    pub fn extra_series(&self, name: &str) -> Vec<(u64, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.extras.get(name).map(|&v| (r.tick, v)))
            .collect()
    }

    /// Latest known extinction tick of a species
    pub fn extinction_tick(&self, species: Species) -> Option<u64> {
        self.last().and_then(|r| r.extinction_tick[species])
    }

    /// Save the log as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a log saved with [`MetricsLog::save_json`]
    pub fn load_json<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Export one row per tick to CSV for external plotting.
    ///
    /// Extra columns come from the reporter names of the first record.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        let extras: Vec<&String> = self
            .records
            .first()
            .map(|r| r.extras.keys().collect())
            .unwrap_or_default();

        write!(file, "tick,sheep,wolves,bees,grown_patches,total_chemical")?;
        for name in &extras {
            write!(file, ",{name}")?;
        }
        writeln!(file)?;

        for r in &self.records {
            write!(
                file,
                "{},{},{},{},{},{:.6}",
                r.tick,
                r.counts.sheep,
                r.counts.wolves,
                r.counts.bees,
                r.grown_patches,
                r.total_chemical
            )?;
            for name in &extras {
                match r.extras.get(*name) {
                    Some(v) => write!(file, ",{v:.6}")?,
                    None => write!(file, ",")?,
                }
            }
            writeln!(file)?;
        }

        file.flush()?;
        Ok(())
    }
}

/// Samples the world after every tick into a [`MetricsLog`]
pub struct MetricsCollector {
    log: MetricsLog,
    reporters: Vec<(String, Reporter)>,
    extinct_at: PerSpecies<Option<u64>>,
    last_report: TickReport,
}

impl MetricsCollector {
    /// Start collecting; species already absent count as extinct at the
    /// world's current tick
    pub fn new(world: &World) -> Self {
        let counts = world.counts();
        Self {
            log: MetricsLog::new(),
            reporters: Vec::new(),
            extinct_at: PerSpecies::from_fn(|s| (counts[s] == 0).then_some(world.tick)),
            last_report: TickReport {
                tick: world.tick,
                ..TickReport::default()
            },
        }
    }

    /// Register a named scalar summary, sampled on every record
    pub fn register<F>(&mut self, name: impl Into<String>, reporter: F)
    where
        F: Fn(&World) -> f64 + Send + Sync + 'static,
    {
        self.reporters.push((name.into(), Box::new(reporter)));
    }

    /// Compute a record for the current state without appending it
    pub fn observe(&self, world: &World) -> MetricsRecord {
        let counts = world.counts();
        let extinction_tick = PerSpecies::from_fn(|s| {
            self.extinct_at[s].or((counts[s] == 0).then_some(world.tick))
        });

        // Births and deaths belong to the tick that produced this state
        let (births, deaths) = if self.last_report.tick == world.tick {
            (self.last_report.births, self.last_report.deaths)
        } else {
            Default::default()
        };

        MetricsRecord {
            tick: world.tick,
            counts,
            births,
            deaths,
            extinction_tick,
            total_chemical: world.field.total_chemical(),
            grown_patches: world.field.grown_count(),
            extras: self
                .reporters
                .iter()
                .map(|(name, reporter)| (name.clone(), reporter(world)))
                .collect(),
        }
    }

    /// Append a record for the state `report` produced and return it
    pub fn record(&mut self, world: &World, report: &TickReport) -> &MetricsRecord {
        self.last_report = report.clone();
        let record = self.observe(world);
        self.extinct_at = record.extinction_tick;
        self.log.push(record)
    }

    /// Species that went extinct at exactly this tick
    pub fn newly_extinct(&self, tick: u64) -> Vec<Species> {
        Species::ALL
            .into_iter()
            .filter(|&s| self.extinct_at[s] == Some(tick))
            .collect()
    }

    pub fn extinction_tick(&self, species: Species) -> Option<u64> {
        self.extinct_at[species]
    }

    pub fn log(&self) -> &MetricsLog {
        &self.log
    }

    pub fn records(&self) -> &[MetricsRecord] {
        &self.log.records
    }

    pub fn into_log(self) -> MetricsLog {
        self.log
    }
}

impl fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("records", &self.log.records.len())
            .field(
                "reporters",
                &self.reporters.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("extinct_at", &self.extinct_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn record(tick: u64, sheep: usize, wolves: usize) -> MetricsRecord {
        MetricsRecord {
            tick,
            counts: PerSpecies {
                sheep,
                wolves,
                bees: 0,
            },
            ..MetricsRecord::default()
        }
    }

    #[test]
    fn test_count_series() {
        let mut log = MetricsLog::new();
        for i in 0..5 {
            log.records.push(record(i + 1, (i as usize + 1) * 10, 3));
        }

        let series = log.count_series(Species::Sheep);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], (1, 10));
        assert_eq!(series[4], (5, 50));
        assert_eq!(log.count_series(Species::Wolf)[2], (3, 3));
    }

    #[test]
    fn test_collector_tracks_extinction() {
        let mut config = Config::default();
        config.sheep.initial_count = 0;
        config.wolves.initial_count = 2;
        let world = World::new(config).unwrap();

        let mut collector = MetricsCollector::new(&world);
        assert_eq!(collector.extinction_tick(Species::Sheep), Some(0));
        assert_eq!(collector.extinction_tick(Species::Wolf), None);

        let rec = collector.record(&world, &TickReport::default()).clone();
        assert_eq!(rec.counts.wolves, 2);
        assert_eq!(rec.extinction_tick.sheep, Some(0));
        assert_eq!(rec.extinction_tick.bees, Some(0));
        assert_eq!(collector.records().len(), 1);
    }

    #[test]
    fn test_observe_does_not_append() {
        let world = World::new(Config::default()).unwrap();
        let collector = MetricsCollector::new(&world);
        let snapshot = collector.observe(&world);
        assert_eq!(snapshot.counts.sheep, 100);
        assert!(collector.log().is_empty());
    }

    #[test]
    fn test_registered_reporters() {
        let world = World::new(Config::default()).unwrap();
        let mut collector = MetricsCollector::new(&world);
        collector.register("total_energy", |w: &World| {
            w.population.iter().filter_map(|a| a.energy()).sum()
        });

        let rec = collector.record(&world, &TickReport::default()).clone();
        // 100 sheep * 8 + 50 wolves * 40
        assert_eq!(rec.extras["total_energy"], 2800.0);
        assert!(rec.summary().contains("total_energy:2800.00"));
        assert_eq!(collector.log().extra_series("total_energy"), vec![(0, 2800.0)]);
    }

    #[test]
    fn test_record_carries_tick_report() {
        let mut world = World::new(Config::default()).unwrap();
        let mut collector = MetricsCollector::new(&world);

        let report = world.advance().unwrap();
        let rec = collector.record(&world, &report).clone();
        assert_eq!(rec.tick, 1);
        assert_eq!(rec.births, report.births);
        assert_eq!(rec.deaths, report.deaths);
        assert_eq!(collector.observe(&world), rec);

        // A later state without a report has nothing to attribute
        world.advance().unwrap();
        assert_eq!(collector.observe(&world).births.total(), 0);
    }

    #[test]
    fn test_collector_appends_in_tick_order() {
        let mut world = World::new(Config::default()).unwrap();
        let mut collector = MetricsCollector::new(&world);
        for _ in 0..4 {
            let report = world.advance().unwrap();
            collector.record(&world, &report);
        }

        let log = collector.into_log();
        let ticks: Vec<u64> = log.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![1, 2, 3, 4]);
        assert_eq!(log.records().len(), log.len());
        assert_eq!(log.last().map(|r| r.tick), Some(4));
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        let mut log = MetricsLog::new();
        log.records.push(record(1, 4, 2));
        log.records[0].extras.insert("x".into(), 1.5);
        log.save_json(&path).unwrap();

        let loaded = MetricsLog::load_json(&path).unwrap();
        assert_eq!(loaded, log);
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut log = MetricsLog::new();
        log.records.push(record(1, 4, 2));
        log.records.push(record(2, 5, 1));
        log.export_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "tick,sheep,wolves,bees,grown_patches,total_chemical");
        assert_eq!(lines[2], "2,5,1,0,0,0.000000");
        assert_eq!(lines.len(), 3);
    }
}
