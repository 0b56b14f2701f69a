//! Cycle Detector: builds a step dependency adjacency map from parameter ids
//! and runs an iterative DFS to find cycles.
//!
//! Grounded on `circular_dependency_checker`, `get_dependency_tree`,
//! `processDFS` and `get_step_id` in the reference checker this crate was
//! extracted from. DFS is iterative (not recursive) so a deep step graph
//! cannot blow the call stack (see `SPEC_FULL.md` §5).

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::{CheckerError, CheckerErrorKind};
use crate::model::Parameter;

/// Derive the owning step id from a parameter id of the form
/// `file://...#step/port` (or `file://...#step/sub/port`).
///
/// If the fragment (the part after `#`) contains a `/`, the final segment is
/// stripped; otherwise the portion before `#` is used verbatim.
pub fn step_id_of(param_id: &str) -> String {
    match param_id.split_once('#') {
        Some((prefix, fragment)) if fragment.contains('/') => {
            let trimmed = match fragment.rfind('/') {
                Some(idx) => &fragment[..idx],
                None => fragment,
            };
            format!("{prefix}#{trimmed}")
        }
        Some((prefix, _)) => prefix.to_string(),
        None => param_id.to_string(),
    }
}

pub fn build_adjacency(step_inputs: &[Rc<Parameter>]) -> HashMap<String, Vec<String>> {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    for sink in step_inputs {
        let sink_step = step_id_of(&sink.id);
        adjacency.entry(sink_step.clone()).or_default();
        let Some(source) = &sink.source else { continue };
        for src_id in source.as_slice() {
            let src_step = step_id_of(src_id);
            adjacency.entry(src_step).or_default().push(sink_step.clone());
        }
    }
    adjacency
}

fn find_cycles(adjacency: &HashMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut processed: HashSet<String> = HashSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();
    let empty: Vec<String> = Vec::new();

    let mut vertices: Vec<String> = adjacency.keys().cloned().collect();
    vertices.sort();

    for start in vertices {
        if processed.contains(&start) {
            continue;
        }
        let mut stack: Vec<(String, usize)> = vec![(start, 0)];
        let mut path: Vec<String> = Vec::new();
        let mut on_path: HashSet<String> = HashSet::new();

        while let Some(&(ref node, child_idx)) = stack.last() {
            let node = node.clone();
            if child_idx == 0 {
                path.push(node.clone());
                on_path.insert(node.clone());
            }
            let neighbors = adjacency.get(&node).unwrap_or(&empty);
            if child_idx < neighbors.len() {
                let next = neighbors[child_idx].clone();
                stack.last_mut().unwrap().1 += 1;
                if on_path.contains(&next) {
                    let pos = path.iter().position(|v| v == &next).unwrap();
                    cycles.push(path[pos..].to_vec());
                } else if !processed.contains(&next) {
                    stack.push((next, 0));
                }
            } else {
                processed.insert(node.clone());
                path.pop();
                on_path.remove(&node);
                stack.pop();
            }
        }
    }
    cycles
}

/// Raise an error listing every distinct cycle found in the step dependency
/// graph derived from `step_inputs`' `source` references.
pub fn cycle_check(step_inputs: &[Rc<Parameter>]) -> Result<(), CheckerError> {
    let adjacency = build_adjacency(step_inputs);
    let cycles = find_cycles(&adjacency);
    if cycles.is_empty() {
        return Ok(());
    }
    let lines = cycles
        .into_iter()
        .map(|cycle| format!("{} -> {}", cycle.join(" -> "), cycle[0]))
        .collect();
    Err(CheckerError::from_lines(CheckerErrorKind::Cycle, lines))
}
