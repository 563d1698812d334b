//! Cascading removal of entities orphaned relative to retention rules.
//!
//! Cleanup is a fixed pipeline of stages. Each stage may leave dangling
//! references behind; the stages after it repair exactly those, so the store
//! is consistent again once the last stage has run.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::molecule::{ParentMolecule, ParentMoleculeGroup, SequenceMolecule};
use crate::core::query::{IdentifiedMoleculeRef, MoleculeQueryMatch, QueryMatchGroup};
use crate::identification::IdentificationData;
use crate::registry::{Handle, Identified, KeyUpdate, Registry};

/// Which entities must stay connected to survive cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Drop data queries and identified molecules that no query match uses
    pub require_query_match: bool,
    /// Drop parent molecules that no identified peptide or oligo maps onto
    pub require_identified_sequence: bool,
    /// Drop peptides and oligos without any parent match
    pub require_parent_match: bool,
    /// Drop parent molecules that belong to no parent group
    pub require_parent_group: bool,
    /// Drop query matches that belong to no match group
    pub require_match_group: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            require_query_match: true,
            require_identified_sequence: true,
            require_parent_match: false,
            require_parent_group: false,
            require_match_group: false,
        }
    }
}

impl CleanupConfig {
    /// Only repair dangling references, keeping every connected entity
    #[must_use]
    pub fn none() -> Self {
        Self {
            require_query_match: false,
            require_identified_sequence: false,
            require_parent_match: false,
            require_parent_group: false,
            require_match_group: false,
        }
    }
}

/// What a cleanup run removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CleanupReport {
    pub parent_molecules_removed: usize,
    /// Individual parent-match records dropped along with their parents
    pub parent_matches_removed: usize,
    pub peptides_removed: usize,
    pub compounds_removed: usize,
    pub oligos_removed: usize,
    pub data_queries_removed: usize,
    pub query_matches_removed: usize,
    pub parent_groups_removed: usize,
    pub match_groups_removed: usize,

    /// A surviving parent group lost members
    pub parent_groups_degraded: bool,
    /// A surviving query match group lost members
    pub match_groups_degraded: bool,
}

impl CleanupReport {
    /// Total number of removed entities (parent-match entries excluded)
    pub fn total_removed(&self) -> usize {
        self.parent_molecules_removed
            + self.peptides_removed
            + self.compounds_removed
            + self.oligos_removed
            + self.data_queries_removed
            + self.query_matches_removed
            + self.parent_groups_removed
            + self.match_groups_removed
    }
}

/// Group entities whose identity is their member set
trait MemberSet {
    type Member;

    fn members(&self) -> &BTreeSet<Handle<Self::Member>>;

    fn members_mut(&mut self) -> &mut BTreeSet<Handle<Self::Member>>;
}

impl MemberSet for ParentMoleculeGroup {
    type Member = ParentMolecule;

    fn members(&self) -> &BTreeSet<Handle<ParentMolecule>> {
        &self.parent_molecules
    }

    fn members_mut(&mut self) -> &mut BTreeSet<Handle<ParentMolecule>> {
        &mut self.parent_molecules
    }
}

impl MemberSet for QueryMatchGroup {
    type Member = MoleculeQueryMatch;

    fn members(&self) -> &BTreeSet<Handle<MoleculeQueryMatch>> {
        &self.query_matches
    }

    fn members_mut(&mut self) -> &mut BTreeSet<Handle<MoleculeQueryMatch>> {
        &mut self.query_matches
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct GroupPruning {
    removed: usize,
    degraded: usize,
}

/// Drop dangling members from every group.
///
/// Groups that are empty or have dangling members are selected first, then
/// each selected group is compacted. Every group left empty is removed; a
/// group whose pruned member set equals another live group's is removed as
/// well.
fn prune_groups<G, M>(groups: &mut Registry<G>, members: &Registry<M>) -> GroupPruning
where
    G: Identified + MemberSet<Member = M>,
    M: Identified,
{
    let affected: Vec<Handle<G>> = groups
        .iter()
        .filter(|(_, group)| {
            group.members().is_empty() || group.members().iter().any(|&m| !members.is_valid(m))
        })
        .map(|(handle, _)| handle)
        .collect();

    let mut pruning = GroupPruning::default();
    for handle in affected {
        let update = groups.update_key(handle, |group| {
            group.members_mut().retain(|&m| members.is_valid(m));
        });
        match update {
            KeyUpdate::Updated => {
                if groups.get(handle).is_some_and(|g| g.members().is_empty()) {
                    groups.remove(handle);
                    pruning.removed += 1;
                } else {
                    pruning.degraded += 1;
                }
            }
            KeyUpdate::Duplicate(existing) => {
                debug!("pruned group {handle:?} duplicates {existing:?}");
                pruning.removed += 1;
            }
            KeyUpdate::Missing => {}
        }
    }
    pruning
}

/// Drop parent-match entries whose parent is gone, returning the number of
/// individual `ParentMatch` records removed
fn prune_matches_of<T>(molecules: &mut Registry<T>, parents: &Registry<ParentMolecule>) -> usize
where
    T: SequenceMolecule + Identified,
{
    let mut removed = 0;
    for handle in molecules.handles() {
        molecules.modify(handle, |molecule| {
            molecule.parent_matches_mut().retain(|&parent, matches| {
                let keep = parents.is_valid(parent);
                if !keep {
                    removed += matches.len();
                }
                keep
            });
        });
    }
    removed
}

fn parents_referenced_by<T>(
    molecules: &Registry<T>,
    referenced: &mut HashSet<Handle<ParentMolecule>>,
) where
    T: SequenceMolecule + Identified,
{
    for (_, molecule) in molecules.iter() {
        referenced.extend(molecule.parent_matches().keys().copied());
    }
}

/// Stage 1: parent molecules outside every parent group
fn remove_ungrouped_parents(data: &mut IdentificationData) -> usize {
    let grouped: HashSet<Handle<ParentMolecule>> = data
        .parent_groups
        .iter()
        .flat_map(|(_, group)| group.parent_molecules.iter().copied())
        .collect();
    data.parent_molecules.retain_referenced(&grouped)
}

/// Stage 2: parent-match entries whose parent is gone
fn remove_dangling_parent_matches(data: &mut IdentificationData) -> usize {
    prune_matches_of(&mut data.peptides, &data.parent_molecules)
        + prune_matches_of(&mut data.oligos, &data.parent_molecules)
}

/// Stage 3: peptides and oligos without parent matches
fn remove_unmapped_molecules(data: &mut IdentificationData) -> (usize, usize) {
    let peptides = data
        .peptides
        .retain(|_, peptide| !peptide.parent_matches.is_empty());
    let oligos = data
        .oligos
        .retain(|_, oligo| !oligo.parent_matches.is_empty());
    (peptides, oligos)
}

/// Stage 4: query matches whose identified molecule is gone
fn remove_dangling_query_matches(data: &mut IdentificationData) -> usize {
    let dangling: Vec<Handle<MoleculeQueryMatch>> = data
        .query_matches
        .iter()
        .filter(|(_, m)| !data.is_valid_molecule(m.identified_molecule))
        .map(|(handle, _)| handle)
        .collect();
    for &handle in &dangling {
        data.query_matches.remove(handle);
    }
    dangling.len()
}

/// Stage 5: query matches outside every match group
fn remove_ungrouped_query_matches(data: &mut IdentificationData) -> usize {
    let grouped: HashSet<Handle<MoleculeQueryMatch>> = data
        .match_groups
        .iter()
        .flat_map(|(_, group)| group.query_matches.iter().copied())
        .collect();
    data.query_matches.retain_referenced(&grouped)
}

/// Stage 6: data queries and identified molecules no query match uses
fn remove_unmatched(data: &mut IdentificationData, report: &mut CleanupReport) {
    let mut queries = HashSet::new();
    let mut peptides = HashSet::new();
    let mut compounds = HashSet::new();
    let mut oligos = HashSet::new();
    for (_, m) in data.query_matches.iter() {
        queries.insert(m.data_query);
        match m.identified_molecule {
            IdentifiedMoleculeRef::Peptide(handle) => {
                peptides.insert(handle);
            }
            IdentifiedMoleculeRef::Compound(handle) => {
                compounds.insert(handle);
            }
            IdentifiedMoleculeRef::Oligo(handle) => {
                oligos.insert(handle);
            }
        }
    }

    report.data_queries_removed += data.data_queries.retain_referenced(&queries);
    report.peptides_removed += data.peptides.retain_referenced(&peptides);
    report.compounds_removed += data.compounds.retain_referenced(&compounds);
    report.oligos_removed += data.oligos.retain_referenced(&oligos);
}

/// Stage 7: parent molecules no peptide or oligo maps onto
fn remove_unreferenced_parents(data: &mut IdentificationData) -> usize {
    let mut referenced = HashSet::new();
    parents_referenced_by(&data.peptides, &mut referenced);
    parents_referenced_by(&data.oligos, &mut referenced);
    data.parent_molecules.retain_referenced(&referenced)
}

/// Stage 8: dangling members of both group types
fn prune_all_groups(data: &mut IdentificationData, report: &mut CleanupReport) {
    let parent_groups = prune_groups(&mut data.parent_groups, &data.parent_molecules);
    report.parent_groups_removed += parent_groups.removed;
    if parent_groups.degraded > 0 {
        warn!(
            "{} parent molecule group(s) lost members during cleanup",
            parent_groups.degraded
        );
        report.parent_groups_degraded = true;
    }

    let match_groups = prune_groups(&mut data.match_groups, &data.query_matches);
    report.match_groups_removed += match_groups.removed;
    if match_groups.degraded > 0 {
        warn!(
            "{} query match group(s) lost members during cleanup",
            match_groups.degraded
        );
        report.match_groups_degraded = true;
    }
}

impl IdentificationData {
    /// Remove entities that are disconnected under `config`, then repair
    /// every reference the removals left dangling.
    ///
    /// Score types, software, input files, search parameters and processing
    /// steps are never removed.
    pub fn cleanup(&mut self, config: &CleanupConfig) -> CleanupReport {
        let mut report = CleanupReport::default();

        if config.require_parent_group {
            report.parent_molecules_removed += remove_ungrouped_parents(self);
            debug!(
                "removed {} ungrouped parent molecules",
                report.parent_molecules_removed
            );
        }

        report.parent_matches_removed = remove_dangling_parent_matches(self);

        if config.require_parent_match {
            let (peptides, oligos) = remove_unmapped_molecules(self);
            debug!("removed {peptides} peptides and {oligos} oligos without parent matches");
            report.peptides_removed += peptides;
            report.oligos_removed += oligos;
        }

        report.query_matches_removed += remove_dangling_query_matches(self);

        if config.require_match_group {
            let removed = remove_ungrouped_query_matches(self);
            debug!("removed {removed} ungrouped query matches");
            report.query_matches_removed += removed;
        }

        if config.require_query_match {
            remove_unmatched(self, &mut report);
        }

        if config.require_identified_sequence {
            let removed = remove_unreferenced_parents(self);
            debug!("removed {removed} parent molecules without identified sequences");
            report.parent_molecules_removed += removed;
        }

        prune_all_groups(self, &mut report);

        info!(
            "cleanup removed {} entities ({} parent matches pruned)",
            report.total_removed(),
            report.parent_matches_removed
        );
        report
    }
}
