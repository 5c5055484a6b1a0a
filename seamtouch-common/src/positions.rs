//! Persisted sensor position assignments
//!
//! Maps stable hardware identifiers to quadrant positions so sensors keep
//! their position across reboots regardless of enumeration order.
//!
//! File format, one sensor per line:
//!
//! ```text
//! <position index>,<hardware id>
//! 0,3F2A11C0
//! 1,3F2A11D4
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sensor::{SensorGeometry, SensorPosition};

/// Hardware identifier to position assignments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionAssignments {
    by_position: BTreeMap<SensorPosition, String>,
}

impl PositionAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse assignments from file contents
    ///
    /// Two identifiers claiming one position is fatal; so is one identifier
    /// claiming two positions.
    pub fn parse(content: &str) -> Result<Self> {
        let mut assignments = Self::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (index, hardware_id) = line.split_once(',').ok_or_else(|| {
                Error::Config(format!("positions line {}: expected '<index>,<id>'", line_no + 1))
            })?;

            let index: u8 = index
                .trim()
                .parse()
                .map_err(|_| Error::UnrecognizedPosition(index.trim().to_string()))?;
            let position = SensorPosition::try_from(index)?;

            assignments.assign(position, hardware_id.trim())?;
        }

        Ok(assignments)
    }

    /// Load assignments from disk; `Ok(None)` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No positions file at {}", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let assignments = Self::parse(&content)?;
        info!("Loaded {} sensor position assignments from {}", assignments.len(), path.display());
        Ok(Some(assignments))
    }

    /// Build assignments from registered geometries
    pub fn from_geometries<'a>(geometries: impl IntoIterator<Item = &'a SensorGeometry>) -> Result<Self> {
        let mut assignments = Self::new();
        for geometry in geometries {
            assignments.assign(geometry.position, &geometry.hardware_id)?;
        }
        Ok(assignments)
    }

    /// Record `hardware_id` at `position`
    pub fn assign(&mut self, position: SensorPosition, hardware_id: &str) -> Result<()> {
        if let Some(existing) = self.by_position.get(&position) {
            if existing != hardware_id {
                return Err(Error::PositionConflict {
                    position,
                    first: existing.clone(),
                    second: hardware_id.to_string(),
                });
            }
            return Ok(());
        }

        if let Some(other) = self.resolve(hardware_id) {
            return Err(Error::Config(format!(
                "hardware id {} assigned to both {} and {}",
                hardware_id, other, position
            )));
        }

        self.by_position.insert(position, hardware_id.to_string());
        Ok(())
    }

    /// Persisted position for a hardware identifier, if any
    pub fn resolve(&self, hardware_id: &str) -> Option<SensorPosition> {
        self.by_position
            .iter()
            .find(|(_, id)| id.as_str() == hardware_id)
            .map(|(position, _)| *position)
    }

    /// True when every expected position has an identifier
    pub fn covers(&self, expected: &[SensorPosition]) -> bool {
        expected.iter().all(|p| self.by_position.contains_key(p))
    }

    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }

    /// Serialize in the persisted line format
    pub fn to_file_string(&self) -> String {
        self.by_position
            .iter()
            .map(|(position, id)| format!("{},{}\n", position.index(), id))
            .collect()
    }

    /// Write assignments to disk, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_file_string())?;
        info!("Wrote {} sensor position assignments to {}", self.len(), path.display());
        Ok(())
    }
}
