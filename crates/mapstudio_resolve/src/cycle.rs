//! Reconciliation of the mutual reference pair.
//!
//! In variants that declare a [`CycleSpec`], a region may name a collision
//! part in its forward field and that part names a region back in its
//! inverse field. Both sides are resolved by the ordinary pass first; this
//! module then fills whichever side is empty and reports disagreements.

use std::collections::HashMap;

use mapstudio_foundation::{DiagnosticKind, Diagnostics, Handle, NodeId, NodeValue, Result};
use mapstudio_schema::CycleSpec;
use mapstudio_storage::EntityStore;

/// Makes the forward and inverse sides of `cycle` agree where one is empty.
///
/// For every inverse-side node that carries the inverse field:
/// - inverse empty: set it to the first forward-side node (in family order)
///   whose forward reference points at it;
/// - inverse set, partner's forward empty: fill the partner's forward field;
/// - inverse set, partner's forward points elsewhere: record a
///   cycle-disagreement diagnostic and keep both stated values.
///
/// Afterwards every forward-side node whose partner's inverse names a
/// different node gets a cycle-disagreement diagnostic too. Forward values
/// are never rewritten.
///
/// # Errors
///
/// Returns an error only if the store hands out an invalid handle, which
/// would be a bug in the resolver.
pub fn reconcile_cycle(
    store: &mut EntityStore,
    cycle: CycleSpec,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let mut pointing: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for node in store.iter_family(cycle.forward_family) {
        if let Ok(Some(Handle::Node(partner))) = node.reference(cycle.forward_field) {
            pointing.entry(partner).or_default().push(node.id);
        }
    }

    let partners: Vec<NodeId> = store
        .iter_family(cycle.inverse_family)
        .filter(|node| node.descriptor().field_index(cycle.inverse_field).is_some())
        .map(|node| node.id)
        .collect();

    let mut filled = 0usize;
    for id in partners {
        let (stated, subtype) = {
            let node = store.get(id)?;
            (node.reference(cycle.inverse_field)?, node.subtype())
        };
        match stated {
            None => {
                if let Some(&first) = pointing.get(&id).and_then(|nodes| nodes.first()) {
                    store
                        .get_mut(id)?
                        .set(cycle.inverse_field, link(first))?;
                    filled += 1;
                }
            }
            Some(Handle::Node(other)) => {
                let (forward, accepts, other_name) = {
                    let partner = store.get(other)?;
                    let Some(field) = partner.descriptor().field(cycle.forward_field) else {
                        continue;
                    };
                    let accepts = field
                        .reference_target()
                        .is_some_and(|(target, _)| target.accepts(subtype));
                    (partner.reference(cycle.forward_field)?, accepts, partner.name.clone())
                };
                match forward {
                    None if accepts => {
                        store.get_mut(other)?.set(cycle.forward_field, link(id))?;
                        filled += 1;
                    }
                    Some(Handle::Node(back)) if back == id => {}
                    _ => {
                        let node = store.get(id)?;
                        diagnostics.push(
                            DiagnosticKind::CycleDisagreement,
                            node.family(),
                            node.name.clone(),
                            format!(
                                "{} names {} {other_name:?}, whose {} does not point back; keeping both",
                                cycle.inverse_field, cycle.forward_family, cycle.forward_field
                            ),
                        );
                    }
                }
            }
            Some(Handle::Model(_)) => {}
        }
    }

    for node in store.iter_family(cycle.forward_family) {
        let Ok(Some(Handle::Node(partner))) = node.reference(cycle.forward_field) else {
            continue;
        };
        let Ok(partner) = store.get(partner) else {
            continue;
        };
        let Ok(inverse) = partner.reference(cycle.inverse_field) else {
            continue;
        };
        if inverse != Some(Handle::Node(node.id)) {
            diagnostics.push(
                DiagnosticKind::CycleDisagreement,
                node.family(),
                node.name.clone(),
                format!(
                    "{} names {} {:?}, whose {} points elsewhere; keeping the stated value",
                    cycle.forward_field, cycle.inverse_family, partner.name, cycle.inverse_field
                ),
            );
        }
    }

    tracing::debug!(
        forward = cycle.forward_field,
        inverse = cycle.inverse_field,
        filled,
        "reconciled mutual references"
    );
    Ok(())
}

fn link(id: NodeId) -> NodeValue {
    NodeValue::Ref(Some(Handle::Node(id)))
}
