//! Meshes: arcs selected by the geometries on either side, stitched into
//! continuous lines.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use geo::MultiLineString;

use crate::{ArcIndex, GeometryKind, TopoGeometry, Topology, TopologyError, feature::line};

/// Mesh filter selecting arcs shared by two different geometries.
#[must_use]
pub fn interior<P>(first: &TopoGeometry<P>, last: &TopoGeometry<P>) -> bool {
    !std::ptr::eq(first, last)
}

/// Mesh filter selecting arcs used by a single geometry only.
#[must_use]
pub fn exterior<P>(first: &TopoGeometry<P>, last: &TopoGeometry<P>) -> bool {
    std::ptr::eq(first, last)
}

/// Builds the mesh of `object`, keeping each arc iff `filter(first, last)`
/// holds for the first and last geometry referencing it.
///
/// # Errors
///
/// Returns [`TopologyError`] if a geometry references a missing or empty arc.
pub fn mesh<O, P>(
    topology: &Topology<O>,
    object: &TopoGeometry<P>,
    filter: impl Fn(&TopoGeometry<P>, &TopoGeometry<P>) -> bool,
) -> Result<MultiLineString<f64>, TopologyError> {
    let mut by_arc: BTreeMap<usize, Vec<(ArcIndex, &TopoGeometry<P>)>> = BTreeMap::new();
    collect_arcs(topology, object, &mut by_arc)?;

    let arcs: Vec<ArcIndex> = by_arc
        .values()
        .filter_map(|geoms| {
            let (index, first) = geoms.first()?;
            let (_, last) = geoms.last()?;
            filter(first, last).then_some(*index)
        })
        .collect();

    log::debug!(
        "Mesh keeps {} of {} referenced arcs",
        arcs.len(),
        by_arc.len()
    );

    lines(topology, stitch(topology, arcs)?)
}

/// Builds the mesh of every arc in the topology.
///
/// # Errors
///
/// Returns [`TopologyError`] if an arc is empty.
pub fn mesh_all<O>(topology: &Topology<O>) -> Result<MultiLineString<f64>, TopologyError> {
    let arcs = (0..topology.arcs.len())
        .map(|slot| ArcIndex::try_from(slot).unwrap_or(ArcIndex::MAX))
        .collect();
    lines(topology, stitch(topology, arcs)?)
}

fn lines<O>(
    topology: &Topology<O>,
    fragments: Vec<Vec<ArcIndex>>,
) -> Result<MultiLineString<f64>, TopologyError> {
    Ok(MultiLineString(
        fragments
            .iter()
            .map(|arcs| line(topology, arcs))
            .collect::<Result<_, _>>()?,
    ))
}

/// Records, per arc slot, every `(reference, geometry)` pair using it. Each
/// leaf geometry is its own identity; collections only recurse.
fn collect_arcs<'a, O, P>(
    topology: &Topology<O>,
    geometry: &'a TopoGeometry<P>,
    by_arc: &mut BTreeMap<usize, Vec<(ArcIndex, &'a TopoGeometry<P>)>>,
) -> Result<(), TopologyError> {
    match &geometry.kind {
        GeometryKind::GeometryCollection(members) => {
            for member in members {
                collect_arcs(topology, member, by_arc)?;
            }
        }
        GeometryKind::LineString(arcs) => add(topology, geometry, arcs, by_arc)?,
        GeometryKind::MultiLineString(lines) | GeometryKind::Polygon(lines) => {
            for arcs in lines {
                add(topology, geometry, arcs, by_arc)?;
            }
        }
        GeometryKind::MultiPolygon(polygons) => {
            for arcs in polygons.iter().flatten() {
                add(topology, geometry, arcs, by_arc)?;
            }
        }
        GeometryKind::Point(_) | GeometryKind::MultiPoint(_) | GeometryKind::Null => {}
    }
    Ok(())
}

fn add<'a, O, P>(
    topology: &Topology<O>,
    geometry: &'a TopoGeometry<P>,
    arcs: &[ArcIndex],
    by_arc: &mut BTreeMap<usize, Vec<(ArcIndex, &'a TopoGeometry<P>)>>,
) -> Result<(), TopologyError> {
    for &index in arcs {
        by_arc
            .entry(topology.arc_slot(index)?)
            .or_default()
            .push((index, geometry));
    }
    Ok(())
}

type Key = (u64, u64);

fn key([x, y]: [f64; 2]) -> Key {
    // -0.0 + 0.0 == +0.0, so both zeros share a key
    ((x + 0.0).to_bits(), (y + 0.0).to_bits())
}

struct Fragment {
    arcs: VecDeque<ArcIndex>,
    start: Key,
    end: Key,
}

/// Joins arcs whose endpoints coincide into fragments. Arcs that cannot be
/// joined become single-arc fragments.
fn stitch<O>(
    topology: &Topology<O>,
    mut arcs: Vec<ArcIndex>,
) -> Result<Vec<Vec<ArcIndex>>, TopologyError> {
    // Zero-length arcs go first so longer arcs can absorb them.
    let mut empty = 0;
    for j in 0..arcs.len() {
        let raw = topology.raw_arc(arcs[j])?;
        if raw.len() < 3 && raw.get(1).is_some_and(|p| p.0 == [0.0, 0.0]) {
            arcs.swap(empty, j);
            empty += 1;
        }
    }

    let mut fragments: Vec<Fragment> = Vec::new();
    let mut by_start: BTreeMap<Key, usize> = BTreeMap::new();
    let mut by_end: BTreeMap<Key, usize> = BTreeMap::new();

    for &i in &arcs {
        let (start, end) = topology.raw_ends(i)?;
        let (start, end) = (key(start), key(end));

        if let Some(f) = by_end.get(&start).copied() {
            by_end.remove(&fragments[f].end);
            fragments[f].arcs.push_back(i);
            fragments[f].end = end;

            if let Some(g) = by_start.get(&end).copied() {
                by_start.remove(&fragments[g].start);
                if g != f {
                    let tail = std::mem::take(&mut fragments[g].arcs);
                    fragments[f].arcs.extend(tail);
                    fragments[f].end = fragments[g].end;
                }
            }
            by_start.insert(fragments[f].start, f);
            by_end.insert(fragments[f].end, f);
        } else if let Some(f) = by_start.get(&end).copied() {
            by_start.remove(&fragments[f].start);
            fragments[f].arcs.push_front(i);
            fragments[f].start = start;
            by_start.insert(fragments[f].start, f);
            by_end.insert(fragments[f].end, f);
        } else {
            fragments.push(Fragment {
                arcs: VecDeque::from([i]),
                start,
                end,
            });
            let f = fragments.len() - 1;
            by_start.insert(start, f);
            by_end.insert(end, f);
        }
    }

    let mut emitted = vec![false; fragments.len()];
    let mut stitched: BTreeSet<usize> = BTreeSet::new();
    let mut out: Vec<Vec<ArcIndex>> = Vec::new();

    let mut order: Vec<usize> = by_end.values().copied().collect();
    for &f in &order {
        by_start.remove(&fragments[f].start);
    }
    order.extend(by_start.values().copied());

    for f in order {
        if std::mem::replace(&mut emitted[f], true) {
            continue;
        }
        let arcs = Vec::from(std::mem::take(&mut fragments[f].arcs));
        for &index in &arcs {
            stitched.insert(topology.arc_slot(index)?);
        }
        out.push(arcs);
    }

    for &i in &arcs {
        if !stitched.contains(&topology.arc_slot(i)?) {
            out.push(vec![i]);
        }
    }

    log::trace!("Stitched {} arcs into {} fragments", arcs.len(), out.len());

    Ok(out)
}
