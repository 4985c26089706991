use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Closed set of entity kinds extracted from the research corpus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Organism or biological sample under study.
    Sample,
    /// Experimental condition, e.g. microgravity or radiation.
    Condition,
    /// Observed effect or measured result.
    Outcome,
    /// Study objective or endpoint.
    Objective,
    /// Anything else the extractor tagged.
    Entity,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Sample,
        Category::Condition,
        Category::Outcome,
        Category::Objective,
        Category::Entity,
    ];

    /// Wire name, also used for cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Condition => "condition",
            Self::Outcome => "result",
            Self::Objective => "objective",
            Self::Entity => "entity",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sample => "Samples",
            Self::Condition => "Conditions",
            Self::Outcome => "Results",
            Self::Objective => "Objectives",
            Self::Entity => "Entities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown entity category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sample" | "organism" => Ok(Self::Sample),
            "condition" => Ok(Self::Condition),
            "result" | "effect" => Ok(Self::Outcome),
            "objective" | "endpoint" => Ok(Self::Objective),
            "entity" => Ok(Self::Entity),
            _ => Err(UnknownCategory(value.to_owned())),
        }
    }
}

/// Active category filter. An empty filter admits every category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CategoryFilter {
    categories: BTreeSet<Category>,
}

impl CategoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn admits(&self, category: Category) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }

    pub fn is_active(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn toggle(&mut self, category: Category) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().copied()
    }

    /// Sorted, comma-joined wire names; `{a,b}` and `{b,a}` share a key.
    pub fn cache_key(&self) -> String {
        let mut names = self
            .categories
            .iter()
            .map(|category| category.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names.join(",")
    }
}

impl FromIterator<Category> for CategoryFilter {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self {
            categories: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_insertion_order() {
        let forward = [Category::Sample, Category::Outcome]
            .into_iter()
            .collect::<CategoryFilter>();
        let backward = [Category::Outcome, Category::Sample]
            .into_iter()
            .collect::<CategoryFilter>();

        assert_eq!(forward.cache_key(), backward.cache_key());
        assert_eq!(forward.cache_key(), "result,sample");
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = CategoryFilter::all();
        assert_eq!(filter.cache_key(), "");
        for category in Category::ALL {
            assert!(filter.admits(category));
        }
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut filter = CategoryFilter::all();
        filter.toggle(Category::Condition);
        assert!(filter.admits(Category::Condition));
        assert!(!filter.admits(Category::Sample));

        filter.toggle(Category::Condition);
        assert!(filter.is_unfiltered());
    }

    #[test]
    fn wire_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert_eq!("Organism".parse::<Category>(), Ok(Category::Sample));
        assert!("planet".parse::<Category>().is_err());
    }
}
