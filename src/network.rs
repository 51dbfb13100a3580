use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::error::{CrnError, ReferenceKind};
use crate::parser::{Assignments, NetworkDocument, parse_document};

/// Append-if-absent list of species names with O(1) membership lookup.
///
/// Indices are assigned in first-insertion order and never change.
#[derive(Clone, Debug, Default)]
pub struct SpeciesIndex {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl SpeciesIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `name`, appending it if it was not present.
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.lookup.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_owned());
        self.lookup.insert(name.to_owned(), idx);
        idx
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// How missing names in the assignment table are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Substitute 0 and log a warning.
    #[default]
    Lenient,
    /// Fail with [`CrnError::Unresolved`].
    Strict,
}

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub resolution: Resolution,
}

impl BuildOptions {
    pub fn strict() -> Self {
        Self {
            resolution: Resolution::Strict,
        }
    }

    fn resolve(
        &self,
        table: &Assignments,
        name: &str,
        kind: ReferenceKind,
    ) -> Result<f64, CrnError> {
        match (table.get(name), self.resolution) {
            (Some(value), _) => Ok(value),
            (None, Resolution::Lenient) => {
                log::warn!("{kind} '{name}' is not assigned, using 0");
                Ok(0.0)
            }
            (None, Resolution::Strict) => Err(CrnError::Unresolved {
                kind,
                name: name.to_owned(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Reactant {
    pub(crate) species: usize,
    pub(crate) count: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct SpeciesDelta {
    pub(crate) species: usize,
    pub(crate) delta: f64,
}

/// Canonical numeric model of a reaction network. Immutable once built.
///
/// Row `i` of the update and usage matrices belongs to the `i`-th declared
/// reaction, column `j` to the `j`-th species in first-seen order (reactants
/// before products, reactions in declaration order).
#[derive(Clone, Debug)]
pub struct ReactionNetwork {
    species: SpeciesIndex,
    reaction_names: Vec<String>,
    rate_names: Vec<String>,
    n_reactions: usize,
    update: Vec<f64>,
    usage: Vec<f64>,
    rates: Vec<f64>,
    initial_concentrations: Vec<f64>,
    initial_time: f64,
    final_time: f64,
    pub(crate) reactants: Vec<Vec<Reactant>>,
    pub(crate) deltas: Vec<Vec<SpeciesDelta>>,
}

impl ReactionNetwork {
    pub fn from_document(doc: &NetworkDocument, options: &BuildOptions) -> Result<Self, CrnError> {
        let mut species = SpeciesIndex::new();
        for reaction in &doc.reactions {
            for (name, _) in reaction.reactants.iter().chain(&reaction.products) {
                species.insert(name);
            }
        }
        let n_species = species.len();
        let n_reactions = doc.reactions.len();

        // a species on both sides takes the product value, not the net sum
        let mut update = vec![0.0; n_reactions * n_species];
        for (row, reaction) in update.chunks_exact_mut(n_species.max(1)).zip(&doc.reactions) {
            for (name, coefficient) in &reaction.reactants {
                if let Some(idx) = species.get(name) {
                    row[idx] = -(*coefficient as f64);
                }
            }
            for (name, coefficient) in &reaction.products {
                if let Some(idx) = species.get(name) {
                    row[idx] = *coefficient as f64;
                }
            }
        }
        let usage: Vec<f64> = update.iter().map(|&v| (-v).max(0.0)).collect();

        let rates = doc
            .reactions
            .iter()
            .map(|r| options.resolve(&doc.assignments, &r.rate, ReferenceKind::RateConstant))
            .collect::<Result<Vec<_>, _>>()?;
        let initial_concentrations = species
            .names()
            .iter()
            .map(|s| options.resolve(&doc.assignments, s, ReferenceKind::InitialConcentration))
            .collect::<Result<Vec<_>, _>>()?;

        let reactants = build_reactants(n_species, &usage);
        let deltas = build_reaction_deltas(n_species, &update);

        log::debug!(
            "built reaction network with {} species and {} reactions",
            n_species,
            n_reactions
        );

        Ok(Self {
            species,
            reaction_names: doc.reactions.iter().map(|r| r.name.clone()).collect(),
            rate_names: doc.reactions.iter().map(|r| r.rate.clone()).collect(),
            n_reactions,
            update,
            usage,
            rates,
            initial_concentrations,
            initial_time: doc.initial_time,
            final_time: doc.final_time,
            reactants,
            deltas,
        })
    }

    pub fn species(&self) -> &[String] {
        self.species.names()
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.get(name)
    }

    pub fn reaction_names(&self) -> &[String] {
        &self.reaction_names
    }

    pub fn rate_names(&self) -> &[String] {
        &self.rate_names
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.n_reactions
    }

    pub fn update_row(&self, reaction: usize) -> &[f64] {
        let s = self.n_species();
        &self.update[reaction * s..(reaction + 1) * s]
    }

    pub fn usage_row(&self, reaction: usize) -> &[f64] {
        let s = self.n_species();
        &self.usage[reaction * s..(reaction + 1) * s]
    }

    pub fn update_matrix(&self) -> Vec<Vec<f64>> {
        (0..self.n_reactions).map(|i| self.update_row(i).to_vec()).collect()
    }

    pub fn usage_matrix(&self) -> Vec<Vec<f64>> {
        (0..self.n_reactions).map(|i| self.usage_row(i).to_vec()).collect()
    }

    /// Propensity rate constant of each reaction.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn initial_concentrations(&self) -> &[f64] {
        &self.initial_concentrations
    }

    pub fn initial_time(&self) -> f64 {
        self.initial_time
    }

    pub fn final_time(&self) -> f64 {
        self.final_time
    }

    /// Writes the resolved model back as reaction-network text.
    ///
    /// Reactions are rebuilt from their update rows, so parsing the output
    /// yields the same species order, matrices, rates and concentrations.
    /// Fails with [`CrnError::NotRepresentable`] when a row has an empty side,
    /// or when the rebuilt text would list species in a different first-seen
    /// order (for example after a product entry overwrote a reactant entry).
    pub fn to_dsl(&self) -> Result<String, CrnError> {
        let mut out = String::new();
        let _ = writeln!(out, "initial_time = {}", self.initial_time);
        let _ = writeln!(out, "final_time = {}", self.final_time);
        out.push('\n');

        let mut seen = SpeciesIndex::new();
        for (idx, name) in self.reaction_names.iter().enumerate() {
            let row = self.update_row(idx);
            let side = |positive: bool| -> Vec<(usize, f64)> {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &v)| if positive { v > 0.0 } else { v < 0.0 })
                    .map(|(j, &v)| (j, v.abs()))
                    .collect()
            };
            let (lhs, rhs) = (side(false), side(true));
            if lhs.is_empty() || rhs.is_empty() {
                return Err(CrnError::NotRepresentable {
                    reaction: name.clone(),
                    reason: "it has no reactant or no product",
                });
            }
            for &(column, _) in lhs.iter().chain(&rhs) {
                if seen.insert(&self.species()[column]) != column {
                    return Err(CrnError::NotRepresentable {
                        reaction: name.clone(),
                        reason: "reparsing would reorder the species",
                    });
                }
            }
            let terms = |side: &[(usize, f64)]| -> String {
                side.iter()
                    .map(|&(j, coefficient)| format_term(coefficient, &self.species()[j]))
                    .collect::<Vec<_>>()
                    .join(" + ")
            };
            let _ = writeln!(
                out,
                "{}: {} -> {}; {}",
                name,
                terms(&lhs),
                terms(&rhs),
                self.rate_names[idx]
            );
        }
        if seen.len() != self.n_species() {
            let reaction = self.reaction_names.last().cloned().unwrap_or_default();
            return Err(CrnError::NotRepresentable {
                reaction,
                reason: "a species has no nonzero update entry",
            });
        }
        out.push('\n');

        let mut written = HashSet::new();
        for (name, value) in self.rate_names.iter().zip(&self.rates) {
            if written.insert(name.as_str()) {
                let _ = writeln!(out, "{name} = {value}");
            }
        }
        for (name, value) in self.species().iter().zip(&self.initial_concentrations) {
            if written.insert(name.as_str()) {
                let _ = writeln!(out, "{name} = {value}");
            }
        }
        Ok(out)
    }
}

fn format_term(coefficient: f64, species: &str) -> String {
    if coefficient == 1.0 {
        species.to_owned()
    } else {
        format!("{} {}", coefficient as u64, species)
    }
}

fn build_reactants(n_species: usize, usage: &[f64]) -> Vec<Vec<Reactant>> {
    if n_species == 0 {
        return Vec::new();
    }
    usage
        .chunks_exact(n_species)
        .map(|row| {
            row.iter()
                .enumerate()
                .filter_map(|(species, &count)| (count > 0.0).then_some(Reactant { species, count }))
                .collect()
        })
        .collect()
}

fn build_reaction_deltas(n_species: usize, update: &[f64]) -> Vec<Vec<SpeciesDelta>> {
    if n_species == 0 {
        return Vec::new();
    }
    update
        .chunks_exact(n_species)
        .map(|row| {
            row.iter()
                .enumerate()
                .filter_map(|(species, &delta)| {
                    (delta != 0.0).then_some(SpeciesDelta { species, delta })
                })
                .collect()
        })
        .collect()
}

/// Parses `text` and builds its network with lenient resolution.
pub fn build_network(text: &str) -> Result<ReactionNetwork, CrnError> {
    build_network_with(text, &BuildOptions::default())
}

pub fn build_network_with(text: &str, options: &BuildOptions) -> Result<ReactionNetwork, CrnError> {
    let doc = parse_document(text)?;
    ReactionNetwork::from_document(&doc, options)
}
