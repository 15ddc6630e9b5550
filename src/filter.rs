//! Project scoping predicates.
//!
//! Every filter exposes `matches` and an order-preserving `filter` that always
//! agree: `filter(ps) == ps.filter(matches)`.

use std::collections::HashSet;

/// A compilation unit the resolver can scope searches to.
pub trait Project {
    fn name(&self) -> &str;
}

impl Project for String {
    fn name(&self) -> &str {
        self
    }
}

pub trait ProjectFilter: Send + Sync {
    fn matches(&self, project: &dyn Project) -> bool;

    fn filter<'a, P: Project>(&self, projects: impl IntoIterator<Item = &'a P>) -> Vec<&'a P>
    where
        Self: Sized,
        P: 'a,
    {
        projects
            .into_iter()
            .filter(|project| self.matches(*project))
            .collect()
    }
}

impl<F: ProjectFilter + ?Sized> ProjectFilter for Box<F> {
    fn matches(&self, project: &dyn Project) -> bool {
        (**self).matches(project)
    }
}

impl<F: ProjectFilter + ?Sized> ProjectFilter for &F {
    fn matches(&self, project: &dyn Project) -> bool {
        (**self).matches(project)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameComparison {
    #[default]
    Exact,
    IgnoreCase,
}

impl NameComparison {
    fn normalize(self, value: &str) -> String {
        match self {
            NameComparison::Exact => value.to_string(),
            NameComparison::IgnoreCase => value.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
}

/// Accepts every project.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProjectFilter;

impl ProjectFilter for DefaultProjectFilter {
    fn matches(&self, _project: &dyn Project) -> bool {
        true
    }
}

/// Includes or excludes projects whose name is in a fixed set.
#[derive(Debug, Clone)]
pub struct ProjectNameFilter {
    names: HashSet<String>,
    mode: FilterMode,
    comparison: NameComparison,
}

impl ProjectNameFilter {
    pub fn new<I, N>(names: I, mode: FilterMode) -> Self
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        Self::with_comparison(names, mode, NameComparison::default())
    }

    pub fn with_comparison<I, N>(names: I, mode: FilterMode, comparison: NameComparison) -> Self
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| comparison.normalize(name.as_ref()))
            .collect();
        Self {
            names,
            mode,
            comparison,
        }
    }
}

impl ProjectFilter for ProjectNameFilter {
    fn matches(&self, project: &dyn Project) -> bool {
        let listed = self
            .names
            .contains(&self.comparison.normalize(project.name()));
        match self.mode {
            FilterMode::Include => listed,
            FilterMode::Exclude => !listed,
        }
    }
}

/// Includes or excludes projects whose name contains a substring.
#[derive(Debug, Clone)]
pub struct ProjectNameContainsFilter {
    needle: String,
    mode: FilterMode,
    comparison: NameComparison,
}

impl ProjectNameContainsFilter {
    pub fn new(needle: impl Into<String>, mode: FilterMode) -> Self {
        Self::with_comparison(needle, mode, NameComparison::default())
    }

    pub fn with_comparison(
        needle: impl Into<String>,
        mode: FilterMode,
        comparison: NameComparison,
    ) -> Self {
        Self {
            needle: comparison.normalize(&needle.into()),
            mode,
            comparison,
        }
    }
}

impl ProjectFilter for ProjectNameContainsFilter {
    fn matches(&self, project: &dyn Project) -> bool {
        let hit = self
            .comparison
            .normalize(project.name())
            .contains(self.needle.as_str());
        match self.mode {
            FilterMode::Include => hit,
            FilterMode::Exclude => !hit,
        }
    }
}

/// Logical AND over its members. An empty aggregate accepts everything.
#[derive(Default)]
pub struct AggregateProjectFilter {
    filters: Vec<Box<dyn ProjectFilter>>,
}

impl AggregateProjectFilter {
    pub fn new(filters: Vec<Box<dyn ProjectFilter>>) -> Self {
        Self { filters }
    }

    pub fn push(&mut self, filter: impl ProjectFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ProjectFilter for AggregateProjectFilter {
    fn matches(&self, project: &dyn Project) -> bool {
        self.filters.iter().all(|filter| filter.matches(project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projects() -> Vec<String> {
        ["Core", "Core.Tests", "Web", "web.api"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn names<'a>(selected: Vec<&'a String>) -> Vec<&'a str> {
        selected.into_iter().map(String::as_str).collect()
    }

    #[test]
    fn default_filter_accepts_all() {
        let all = projects();
        assert_eq!(DefaultProjectFilter.filter(&all).len(), all.len());
    }

    #[test]
    fn name_filter_include_and_exclude() {
        let all = projects();
        let include = ProjectNameFilter::new(["Web"], FilterMode::Include);
        assert_eq!(names(include.filter(&all)), ["Web"]);

        let exclude = ProjectNameFilter::new(["Web"], FilterMode::Exclude);
        assert_eq!(names(exclude.filter(&all)), ["Core", "Core.Tests", "web.api"]);
    }

    #[test]
    fn name_filter_ignore_case() {
        let all = projects();
        let include = ProjectNameFilter::with_comparison(
            ["WEB.API"],
            FilterMode::Include,
            NameComparison::IgnoreCase,
        );
        assert_eq!(names(include.filter(&all)), ["web.api"]);
    }

    #[test]
    fn contains_filter_respects_comparison() {
        let all = projects();
        let exact = ProjectNameContainsFilter::new("Test", FilterMode::Exclude);
        assert_eq!(names(exact.filter(&all)), ["Core", "Web", "web.api"]);

        let loose = ProjectNameContainsFilter::with_comparison(
            "WEB",
            FilterMode::Include,
            NameComparison::IgnoreCase,
        );
        assert_eq!(names(loose.filter(&all)), ["Web", "web.api"]);
    }

    #[test]
    fn aggregate_is_conjunction() {
        let all = projects();
        let mut aggregate = AggregateProjectFilter::default();
        assert_eq!(aggregate.filter(&all).len(), all.len());

        aggregate.push(ProjectNameContainsFilter::new("Core", FilterMode::Include));
        aggregate.push(ProjectNameContainsFilter::new("Tests", FilterMode::Exclude));
        assert_eq!(names(aggregate.filter(&all)), ["Core"]);
    }

    #[test]
    fn boxed_filters_delegate() {
        let all = projects();
        let boxed: Box<dyn ProjectFilter> =
            Box::new(ProjectNameFilter::new(["Core"], FilterMode::Include));
        assert_eq!(names(boxed.filter(&all)), ["Core"]);
    }
}
