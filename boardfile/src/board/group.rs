//! Item groups and their two-phase resolution.
//!
//! Groups are parsed before all of their members exist, so parsers record a
//! [`GroupInfo`] and membership is resolved once the whole board is read.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BoardError, SourceLocation, Warning, WarningKind};
use crate::kiid::Kiid;

use super::{Board, ItemRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Kiid,
    pub name: String,
    pub locked: bool,
    /// Resolved member ids, in file order.
    pub members: Vec<Kiid>,
}

impl Group {
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Who owns a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupParent {
    Board,
    /// Index of the footprint in `Board::footprints`.
    Footprint(usize),
}

/// A group as read from the file, before its members are resolved.
#[derive(Debug, Clone)]
pub struct GroupInfo {
    pub parent: GroupParent,
    pub id: Kiid,
    pub name: String,
    pub locked: bool,
    pub member_ids: Vec<Kiid>,
    pub location: Option<SourceLocation>,
}

fn cycle_error(info: &GroupInfo) -> BoardError {
    let group = if info.name.is_empty() {
        info.id.to_string()
    } else {
        info.name.clone()
    };
    BoardError::GroupCycle { group }
}

/// Create the groups described by `infos`, then resolve their members.
///
/// Unknown member ids are skipped. A footprint child only joins a group of
/// the same footprint, and a board-level group never takes footprint
/// children. When two groups claim the same item the later one keeps it.
/// Group-of-group cycles are fatal.
pub fn resolve_groups(
    board: &mut Board,
    infos: &[GroupInfo],
    warnings: &mut Vec<Warning>,
) -> Result<(), BoardError> {
    if infos.is_empty() {
        return Ok(());
    }

    // Phase 1: every group exists before any membership is looked up.
    let mut slots = Vec::with_capacity(infos.len());
    for info in infos {
        let group = Group {
            id: info.id,
            name: info.name.clone(),
            locked: info.locked,
            members: Vec::new(),
        };
        let slot = match info.parent {
            GroupParent::Footprint(fp) if fp < board.footprints.len() => {
                let groups = &mut board.footprints[fp].groups;
                groups.push(group);
                ItemRef::FootprintGroup {
                    footprint: fp,
                    index: groups.len() - 1,
                }
            }
            _ => {
                board.groups.push(group);
                ItemRef::Group(board.groups.len() - 1)
            }
        };
        slots.push(slot);
    }
    for (id, holder) in board.rebuild_index() {
        if matches!(holder, ItemRef::Group(_) | ItemRef::FootprintGroup { .. }) {
            warnings.push(Warning {
                kind: WarningKind::DuplicateId,
                location: None,
                message: format!("group id {id} is already used by another item"),
            });
        }
    }

    // Phase 2: membership. `owner` maps an item to the info index of the
    // group currently holding it.
    let group_of_id: HashMap<Kiid, usize> = infos
        .iter()
        .enumerate()
        .filter(|(i, info)| board.find_item(&info.id) == Some(slots[*i]))
        .map(|(i, info)| (info.id, i))
        .collect();
    let mut owner: HashMap<Kiid, usize> = HashMap::new();
    let mut members: Vec<Vec<Kiid>> = vec![Vec::new(); infos.len()];

    for (gi, info) in infos.iter().enumerate() {
        for member in &info.member_ids {
            let Some(item) = board.find_item(member) else {
                tracing::debug!(group = %info.name, member = %member, "skipping unknown group member");
                continue;
            };
            let allowed = match info.parent {
                GroupParent::Board => item.footprint().is_none(),
                GroupParent::Footprint(fp) => item.footprint() == Some(fp),
            };
            if !allowed {
                continue;
            }
            if let Some(previous) = owner.insert(*member, gi) {
                if previous != gi {
                    members[previous].retain(|m| m != member);
                } else {
                    continue;
                }
            }
            members[gi].push(*member);
        }
    }

    // Cycle check over the group-of-group edges.
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for (gi, list) in members.iter().enumerate() {
        graph.add_node(gi);
        for member in list {
            if let Some(child) = group_of_id.get(member) {
                if *child == gi {
                    return Err(cycle_error(&infos[gi]));
                }
                graph.add_edge(gi, *child, ());
            }
        }
    }
    if let Err(cycle) = toposort(&graph, None) {
        return Err(cycle_error(&infos[cycle.node_id()]));
    }

    for (slot, list) in slots.into_iter().zip(members) {
        if let Some(group) = board.group_mut(slot) {
            group.members = list;
        }
    }
    Ok(())
}
