use crate::metadata::DependencyMap;
use std::collections::{HashSet, VecDeque};

/// Restricts `map` to nodes at most `depth` hops from any of `seeds`.
///
/// Nodes exactly `depth` hops away stay in the result with an empty dependency
/// set; closer nodes keep their full set. Seeds missing from `map` are ignored.
pub fn trim_to_depth<'a, I>(map: &DependencyMap, seeds: I, depth: usize) -> DependencyMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut trimmed = DependencyMap::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    let mut sorted_seeds: Vec<&str> = seeds.into_iter().collect();
    sorted_seeds.sort_unstable();
    sorted_seeds.dedup();
    for seed in sorted_seeds {
        if let Some(key) = map.get_key(seed) {
            if visited.insert(key.display_name()) {
                queue.push_back((key.display_name(), 0));
            }
        }
    }

    while let Some((name, dist)) = queue.pop_front() {
        let (Some(node), Some(dependencies)) = (map.get_key(name), map.get(name)) else {
            continue;
        };
        if dist >= depth {
            trimmed.insert(node.clone(), HashSet::new());
            continue;
        }
        trimmed.insert(node.clone(), dependencies.clone());
        for dependency in dependencies {
            let Some(key) = map.get_key(dependency.display_name()) else {
                continue;
            };
            if visited.insert(key.display_name()) {
                queue.push_back((key.display_name(), dist + 1));
            }
        }
    }
    trimmed
}
