use ctxwatch_core::{is_excluded_path, parent_dir};
use ctxwatch_types::DirectoryCandidate;
use std::collections::{HashMap, HashSet};

/// Result of one aggregation pass over the session's changed files.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Directories at or above the reporting threshold, in first-seen order
    pub candidates: Vec<DirectoryCandidate>,
    /// Below-threshold directories dropped on their own count
    pub leftovers: Vec<(String, usize)>,
}

fn dir_parent(dir: &str) -> Option<String> {
    if dir == "." {
        return None;
    }
    Some(match dir.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => ".".to_string(),
    })
}

fn dir_depth(dir: &str) -> usize {
    if dir == "." {
        0
    } else {
        dir.split('/').count()
    }
}

#[derive(Debug, Default)]
struct Overflow {
    sum: usize,
    children: Vec<String>,
}

/// Cluster changed files into directories worth reporting.
///
/// Files group by immediate parent; directories under the threshold push
/// their count one level up, and a parent that reaches the threshold with
/// that overflow absorbs those children. Parents are settled deepest-first,
/// and a below-threshold directory that wins as a parent withdraws its own
/// contribution from the level above it, so every file is counted exactly
/// once across candidates and leftovers.
pub fn aggregate(paths: &[String], exclusions: &[String], threshold: usize) -> Aggregation {
    let mut direct: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for path in paths {
        let dir = parent_dir(path);
        if is_excluded_path(&dir, exclusions) {
            continue;
        }
        if !direct.contains_key(&dir) {
            order.push(dir.clone());
        }
        *direct.entry(dir).or_insert(0) += 1;
    }

    // Below-threshold directories push their count to their own parent.
    // One level only; a parent that is itself below threshold does the same
    // for its own count, not for what it absorbed.
    let mut overflow: HashMap<String, Overflow> = HashMap::new();
    let direct_order = order.clone();
    for dir in &direct_order {
        let count = direct[dir];
        if count >= threshold {
            continue;
        }
        let Some(parent) = dir_parent(dir) else {
            continue;
        };
        if !overflow.contains_key(&parent) && !direct.contains_key(&parent) {
            order.push(parent.clone());
        }
        let acc = overflow.entry(parent).or_default();
        acc.sum += count;
        acc.children.push(dir.clone());
    }

    // Settle parents deepest-first so a winning parent can withdraw its own
    // below-threshold contribution from the level above before that level
    // is judged.
    let mut parents: Vec<String> = overflow.keys().cloned().collect();
    parents.sort_by(|a, b| dir_depth(b).cmp(&dir_depth(a)).then_with(|| a.cmp(b)));

    let mut winners: HashMap<String, DirectoryCandidate> = HashMap::new();
    let mut absorbed: HashSet<String> = HashSet::new();

    for parent in parents {
        let acc = match overflow.get(&parent) {
            Some(acc) if acc.sum > 0 => Overflow {
                sum: acc.sum,
                children: acc.children.clone(),
            },
            _ => continue,
        };
        let own = direct.get(&parent).copied().unwrap_or(0);
        if own + acc.sum < threshold {
            continue;
        }

        for child in &acc.children {
            absorbed.insert(child.clone());
        }
        winners.insert(
            parent.clone(),
            DirectoryCandidate {
                path: parent.clone(),
                direct_count: own,
                from_children_count: acc.sum,
                child_count: acc.children.len(),
            },
        );

        // The winner's own count is now reported here, not at its parent
        if own < threshold
            && let Some(grandparent) = dir_parent(&parent)
            && let Some(up) = overflow.get_mut(&grandparent)
        {
            up.sum -= own;
            up.children.retain(|c| c != &parent);
        }
    }

    let mut candidates = Vec::new();
    let mut leftovers = Vec::new();
    for dir in &order {
        if let Some(winner) = winners.remove(dir) {
            candidates.push(winner);
            continue;
        }
        if absorbed.contains(dir) {
            continue;
        }
        let count = direct.get(dir).copied().unwrap_or(0);
        if count >= threshold {
            candidates.push(DirectoryCandidate {
                path: dir.clone(),
                direct_count: count,
                from_children_count: 0,
                child_count: 0,
            });
        } else if count > 0 {
            leftovers.push((dir.clone(), count));
        }
    }

    Aggregation {
        candidates,
        leftovers,
    }
}
