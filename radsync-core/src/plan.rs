//! Pure diff planner: desired definitions vs. remote resources.
//!
//! Given the desired definitions of one settings section and a decoded
//! snapshot of the matching remote resources, [`plan`] computes the actions
//! required to converge the remote onto the desired state. No I/O happens
//! here; the orchestrator in [`crate::sync`] applies the result through the
//! [`crate::contract::RadarrApi`] trait.

use std::collections::BTreeMap;

/// A remote resource paired with its decoded local-model equivalent.
///
/// `definition` is `None` when the remote resource uses an implementation this
/// tool does not model. Such resources can still be deleted by name, but an
/// update is forced whenever a desired definition shares their name.
#[derive(Debug, Clone)]
pub struct RemoteResource<T> {
    pub id: i64,
    pub definition: Option<T>,
}

/// One step of a section plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAction<T> {
    /// Defined locally, absent remotely.
    Create { name: String, definition: T },
    /// Defined locally, present remotely but different (or undecodable).
    Update {
        name: String,
        id: i64,
        definition: T,
    },
    /// Present remotely, absent locally, `delete_unmanaged` enabled.
    Delete { name: String, id: i64 },
    /// Defined locally and already converged.
    Unchanged { name: String, id: i64 },
    /// Present remotely, absent locally, left alone.
    Unmanaged { name: String, id: i64 },
}

impl<T> PlanAction<T> {
    pub fn name(&self) -> &str {
        match self {
            PlanAction::Create { name, .. }
            | PlanAction::Update { name, .. }
            | PlanAction::Delete { name, .. }
            | PlanAction::Unchanged { name, .. }
            | PlanAction::Unmanaged { name, .. } => name,
        }
    }
}

/// The full set of actions for one settings section.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan<T> {
    pub actions: Vec<PlanAction<T>>,
}

/// Per-section tally, reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanCounts {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub unchanged: usize,
    pub unmanaged: usize,
}

impl<T> Plan<T> {
    pub fn counts(&self) -> PlanCounts {
        let mut counts = PlanCounts::default();
        for action in &self.actions {
            match action {
                PlanAction::Create { .. } => counts.create += 1,
                PlanAction::Update { .. } => counts.update += 1,
                PlanAction::Delete { .. } => counts.delete += 1,
                PlanAction::Unchanged { .. } => counts.unchanged += 1,
                PlanAction::Unmanaged { .. } => counts.unmanaged += 1,
            }
        }
        counts
    }

    /// Whether applying this plan would leave the remote untouched.
    pub fn is_noop(&self) -> bool {
        let counts = self.counts();
        counts.create == 0 && counts.update == 0 && counts.delete == 0
    }
}

/// Diff desired definitions against the remote snapshot.
///
/// Desired entries are visited in name order, then remote-only entries in name
/// order; the resulting action order is deterministic.
pub fn plan<T: Clone + PartialEq>(
    desired: &BTreeMap<String, T>,
    remote: &BTreeMap<String, RemoteResource<T>>,
    delete_unmanaged: bool,
) -> Plan<T> {
    let mut actions = Vec::new();

    for (name, definition) in desired {
        match remote.get(name) {
            None => actions.push(PlanAction::Create {
                name: name.clone(),
                definition: definition.clone(),
            }),
            Some(resource) => {
                let converged = resource
                    .definition
                    .as_ref()
                    .map(|decoded| decoded == definition)
                    .unwrap_or(false);
                if converged {
                    actions.push(PlanAction::Unchanged {
                        name: name.clone(),
                        id: resource.id,
                    });
                } else {
                    actions.push(PlanAction::Update {
                        name: name.clone(),
                        id: resource.id,
                        definition: definition.clone(),
                    });
                }
            }
        }
    }

    for (name, resource) in remote {
        if desired.contains_key(name) {
            continue;
        }
        if delete_unmanaged {
            actions.push(PlanAction::Delete {
                name: name.clone(),
                id: resource.id,
            });
        } else {
            actions.push(PlanAction::Unmanaged {
                name: name.clone(),
                id: resource.id,
            });
        }
    }

    Plan { actions }
}
