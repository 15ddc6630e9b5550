mod common;

use common::{FakeResolver, is_closed, key_set};
use iceberg::filter::{
    AggregateProjectFilter, DefaultProjectFilter, FilterMode, NameComparison,
    ProjectNameContainsFilter, ProjectNameFilter, ProjectFilter,
};
use iceberg::mapper::{DependencyMapper, trim_to_depth};
use iceberg::metadata::MethodMetadata;
use iceberg::resolver::CancellationToken;
use proptest::prelude::*;
use std::collections::HashSet;

fn node(index: usize) -> String {
    format!("N.M{index}()")
}

/// A resolver over `size` methods with the given call edges.
fn graph(size: usize, edges: &[(usize, usize)]) -> FakeResolver {
    let mut adjacency = vec![Vec::new(); size];
    for &(from, to) in edges {
        adjacency[from % size].push(node(to % size));
    }
    let mut resolver = FakeResolver::new();
    for (index, calls) in adjacency.iter().enumerate() {
        let calls: Vec<&str> = calls.iter().map(String::as_str).collect();
        resolver.add(&node(index), &calls);
    }
    resolver
}

fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|size| {
        (
            Just(size),
            prop::collection::vec((0..size, 0..size), 0..size * 3),
        )
    })
}

fn arb_project() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "Core", "core", "Core.Tests", "Web", "Web.Api", "Tools", "Api.Tests",
    ])
    .prop_map(str::to_string)
}

fn arb_display_name() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["", "Acme.", "Acme.Core."]),
        "[A-Z][a-z]{0,5}",
        "[A-Z][a-z]{0,5}",
        prop::collection::vec(prop::sample::select(vec!["int", "string", "List<int>"]), 0..3),
    )
        .prop_map(|(ns, class, method, params)| format!("{ns}{class}.{method}({})", params.join(", ")))
}

proptest! {
    #[test]
    fn metadata_identity_is_the_display_name(
        a in arb_display_name(),
        b in arb_display_name(),
        path_a in "[a-z/]{0,12}",
        path_b in "[a-z/]{0,12}",
    ) {
        let left = MethodMetadata::new(a.clone(), path_a);
        let right = MethodMetadata::new(b.clone(), path_b);
        prop_assert_eq!(left == right, a == b);

        let mut set = HashSet::new();
        set.insert(left);
        prop_assert_eq!(set.contains(&right), a == b);
        prop_assert!(set.contains(a.as_str()));
    }

    #[test]
    fn bounded_mapping_equals_trimmed_full_map(
        (size, edges) in arb_graph(),
        seeds in prop::collection::vec(0usize..12, 1..3),
        depth in 1usize..6,
    ) {
        let resolver = graph(size, &edges);
        let seed_names: Vec<String> = seeds.iter().map(|s| node(s % size)).collect();
        let entries: Vec<_> = seed_names.iter().map(|name| resolver.entry(name)).collect();
        let mapper = DependencyMapper::<FakeResolver>::default();
        let cancel = CancellationToken::new();

        let full = mapper.map_upstream(&resolver, &entries, None, &cancel).unwrap();
        let bounded = mapper.map_upstream(&resolver, &entries, Some(depth), &cancel).unwrap();
        let trimmed = trim_to_depth(&full, seed_names.iter().map(String::as_str), depth);
        prop_assert_eq!(bounded, trimmed);
    }

    #[test]
    fn unbounded_map_is_closed_and_contains_seeds(
        (size, edges) in arb_graph(),
        seed in 0usize..12,
    ) {
        let resolver = graph(size, &edges);
        let seed = node(seed % size);
        let map = DependencyMapper::<FakeResolver>::default()
            .map_upstream(&resolver, &[resolver.entry(&seed)], None, &CancellationToken::new())
            .unwrap();
        prop_assert!(is_closed(&map));
        prop_assert!(key_set(&map).contains(&seed));
        for (node, deps) in map.iter() {
            prop_assert!(!deps.iter().any(|dep| dep.display_name() == node.display_name()));
        }
    }

    #[test]
    fn downstream_map_is_closed(
        (size, edges) in arb_graph(),
        seed in 0usize..12,
    ) {
        let resolver = graph(size, &edges);
        let seed = node(seed % size);
        let map = DependencyMapper::<FakeResolver>::default()
            .map_downstream(&resolver, &[resolver.entry(&seed)], None, None, &CancellationToken::new())
            .unwrap();
        prop_assert!(is_closed(&map));
        prop_assert!(key_set(&map).contains(&seed));
    }

    #[test]
    fn include_and_exclude_are_complements(
        names in prop::collection::vec(arb_project(), 0..4),
        needle in prop::sample::select(vec!["Test", "core", "Web", "."]),
        ignore_case in any::<bool>(),
        project in arb_project(),
    ) {
        let comparison = if ignore_case { NameComparison::IgnoreCase } else { NameComparison::Exact };
        let include = ProjectNameFilter::with_comparison(names.clone(), FilterMode::Include, comparison);
        let exclude = ProjectNameFilter::with_comparison(names, FilterMode::Exclude, comparison);
        prop_assert_ne!(include.matches(&project), exclude.matches(&project));

        let include = ProjectNameContainsFilter::with_comparison(needle, FilterMode::Include, comparison);
        let exclude = ProjectNameContainsFilter::with_comparison(needle, FilterMode::Exclude, comparison);
        prop_assert_ne!(include.matches(&project), exclude.matches(&project));
    }

    #[test]
    fn aggregate_is_the_conjunction_of_its_members(
        names in prop::collection::vec(arb_project(), 0..4),
        needle in prop::sample::select(vec!["Test", "Core", "Api"]),
        projects in prop::collection::vec(arb_project(), 0..8),
    ) {
        let by_name = ProjectNameFilter::new(names.clone(), FilterMode::Include);
        let by_needle = ProjectNameContainsFilter::new(needle, FilterMode::Exclude);

        let empty = AggregateProjectFilter::default();
        prop_assert_eq!(empty.filter(&projects).len(), projects.len());
        prop_assert_eq!(
            empty.filter(&projects),
            DefaultProjectFilter.filter(&projects)
        );

        let mut single = AggregateProjectFilter::default();
        single.push(ProjectNameFilter::new(names.clone(), FilterMode::Include));
        prop_assert_eq!(single.filter(&projects), by_name.filter(&projects));

        let mut both = AggregateProjectFilter::default();
        both.push(ProjectNameFilter::new(names, FilterMode::Include));
        both.push(ProjectNameContainsFilter::new(needle, FilterMode::Exclude));
        for project in &projects {
            prop_assert_eq!(
                both.matches(project),
                by_name.matches(project) && by_needle.matches(project)
            );
        }
    }
}
