//! The live agent set and its occupancy index.

use crate::agent::{Agent, AgentId, Body, PerSpecies, Species};
use crate::error::{Result, SimError};
use crate::grid::{Cell, SpatialIndex};
use std::collections::BTreeMap;

/// All live agents, keyed by ID, plus a per-cell index of grid-bound agents
#[derive(Clone, Debug)]
pub struct Population {
    agents: BTreeMap<AgentId, Agent>,
    index: SpatialIndex,
    next_id: u64,
    width: usize,
    height: usize,
}

impl Population {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            agents: BTreeMap::new(),
            index: SpatialIndex::new(width, height),
            next_id: 0,
            width,
            height,
        }
    }

    /// Add a new agent with a fresh ID.
    ///
    /// Fails without consuming an ID if the body lies outside the field.
    pub fn spawn(&mut self, body: Body) -> Result<AgentId> {
        let id = AgentId(self.next_id);
        let agent = Agent::new(id, body);
        if !agent.in_bounds(self.width, self.height) {
            return Err(SimError::AgentConsistencyViolation(format!(
                "{id} spawned out of bounds: {body:?}"
            )));
        }
        if let Some(cell) = agent.cell() {
            if !self.index.insert(cell, id) {
                return Err(SimError::AgentConsistencyViolation(format!(
                    "{id} could not be indexed at {cell:?}"
                )));
            }
        }

        self.next_id += 1;
        self.agents.insert(id, agent);
        Ok(id)
    }

    /// Insert an agent with no bounds check and no index entry
    #[cfg(test)]
    pub(crate) fn spawn_unindexed(&mut self, body: Body) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        self.agents.insert(id, Agent::new(id, body));
        id
    }

    /// Remove an agent from the population and the occupancy index
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.remove(&id)?;
        if let Some(cell) = agent.cell() {
            self.index.remove(cell, id);
        }
        Some(agent)
    }

    #[inline]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Write back a modified body. The agent must still be live and keep its
    /// species; grid moves go through [`Population::relocate`].
    pub fn update(&mut self, id: AgentId, body: Body) -> Result<()> {
        let agent = self.agents.get_mut(&id).ok_or_else(|| missing(id))?;
        if agent.cell() != Agent::new(id, body).cell() {
            return Err(SimError::AgentConsistencyViolation(format!(
                "{id} changed cell without relocating"
            )));
        }
        if agent.species() != Agent::new(id, body).species() {
            return Err(SimError::AgentConsistencyViolation(format!(
                "{id} changed species"
            )));
        }
        agent.body = body;
        Ok(())
    }

    /// Move a grid-bound agent to another cell, keeping the index in sync
    pub fn relocate(&mut self, id: AgentId, to: Cell) -> Result<()> {
        let agent = self.agents.get_mut(&id).ok_or_else(|| missing(id))?;
        let grazer = agent.grazer_mut().ok_or_else(|| {
            SimError::AgentConsistencyViolation(format!("{id} is not grid-bound"))
        })?;
        let from = grazer.cell;
        if from == to {
            return Ok(());
        }
        if !self.index.remove(from, id) || !self.index.insert(to, id) {
            return Err(SimError::AgentConsistencyViolation(format!(
                "{id} could not move {from:?} -> {to:?}"
            )));
        }
        grazer.cell = to;
        Ok(())
    }

    /// Grid-bound agents on a cell
    #[inline]
    pub fn occupants(&self, cell: Cell) -> &[AgentId] {
        self.index.get(cell)
    }

    /// Live agents of one species on a cell, in arrival order
    pub fn occupants_of(&self, cell: Cell, species: Species) -> Vec<AgentId> {
        self.occupants(cell)
            .iter()
            .copied()
            .filter(|id| self.get(*id).map(|a| a.species()) == Some(species))
            .collect()
    }

    /// Snapshot of live IDs in ascending order
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Live count per species
    pub fn counts(&self) -> PerSpecies<usize> {
        let mut counts = PerSpecies::default();
        for agent in self.agents.values() {
            counts[agent.species()] += 1;
        }
        counts
    }

    pub fn count(&self, species: Species) -> usize {
        self.agents
            .values()
            .filter(|a| a.species() == species)
            .count()
    }

    /// ID the next spawned agent will receive
    pub fn next_id(&self) -> AgentId {
        AgentId(self.next_id)
    }

    /// Verify ID uniqueness, bounds, and index agreement
    pub fn check_consistency(&self, width: usize, height: usize) -> Result<()> {
        let mut indexed = 0;
        for (id, agent) in &self.agents {
            if *id != agent.id {
                return Err(SimError::AgentConsistencyViolation(format!(
                    "agent {} stored under key {id}",
                    agent.id
                )));
            }
            if id.0 >= self.next_id {
                return Err(SimError::AgentConsistencyViolation(format!(
                    "{id} was never issued"
                )));
            }
            if !agent.in_bounds(width, height) {
                return Err(SimError::AgentConsistencyViolation(format!(
                    "{id} out of bounds: {:?}",
                    agent.body
                )));
            }
            if let Some(cell) = agent.cell() {
                let hits = self.index.get(cell).iter().filter(|&&o| o == *id).count();
                if hits != 1 {
                    return Err(SimError::AgentConsistencyViolation(format!(
                        "{id} indexed {hits} times at {cell:?}"
                    )));
                }
                indexed += 1;
            }
        }
        if indexed != self.index.len() {
            return Err(SimError::AgentConsistencyViolation(format!(
                "index holds {} entries for {indexed} grid agents",
                self.index.len()
            )));
        }
        Ok(())
    }
}

fn missing(id: AgentId) -> SimError {
    SimError::AgentConsistencyViolation(format!("{id} is not in the population"))
}
