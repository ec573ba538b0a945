//! Motion library: browsing, filtering, and random selection.
//!
//! Ships a built-in set of thirty motions spanning eight categories and
//! three difficulty tiers. A TOML motion pack can replace the built-in set
//! for clubs that maintain their own lists. Search, category, and
//! difficulty filters compose; random selection draws from whatever the
//! active filter leaves.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{DebateError, Result};

/// Topic area of a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Technology & AI")]
    TechnologyAi,
    #[serde(rename = "Politics & Governance")]
    PoliticsGovernance,
    Economics,
    #[serde(rename = "Ethics & Philosophy")]
    EthicsPhilosophy,
    Environment,
    Education,
    #[serde(rename = "Pop Culture & Arts")]
    PopCultureArts,
    #[serde(rename = "Social Issues")]
    SocialIssues,
}

impl Category {
    pub fn all() -> [Category; 8] {
        [
            Category::TechnologyAi,
            Category::PoliticsGovernance,
            Category::Economics,
            Category::EthicsPhilosophy,
            Category::Environment,
            Category::Education,
            Category::PopCultureArts,
            Category::SocialIssues,
        ]
    }

    pub fn parse(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "technology & ai" | "technology" | "tech" | "ai" => Ok(Category::TechnologyAi),
            "politics & governance" | "politics" | "governance" => Ok(Category::PoliticsGovernance),
            "economics" => Ok(Category::Economics),
            "ethics & philosophy" | "ethics" | "philosophy" => Ok(Category::EthicsPhilosophy),
            "environment" => Ok(Category::Environment),
            "education" => Ok(Category::Education),
            "pop culture & arts" | "pop culture" | "arts" => Ok(Category::PopCultureArts),
            "social issues" | "social" => Ok(Category::SocialIssues),
            _ => Err(DebateError::Validation(format!(
                "unknown category: {token}"
            ))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::TechnologyAi => "Technology & AI",
            Category::PoliticsGovernance => "Politics & Governance",
            Category::Economics => "Economics",
            Category::EthicsPhilosophy => "Ethics & Philosophy",
            Category::Environment => "Environment",
            Category::Education => "Education",
            Category::PopCultureArts => "Pop Culture & Arts",
            Category::SocialIssues => "Social Issues",
        };
        write!(f, "{name}")
    }
}

/// How contested a motion tends to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(DebateError::Validation(format!(
                "unknown difficulty: {token}"
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        };
        write!(f, "{name}")
    }
}

/// A single debatable motion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Motion {
    pub id: u32,
    pub text: String,
    pub category: Category,
    pub difficulty: Difficulty,
}

/// Search and filter criteria; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct MotionFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
}

impl MotionFilter {
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    fn matches(&self, motion: &Motion) -> bool {
        let search_match = match &self.search {
            Some(query) => motion.text.to_lowercase().contains(&query.to_lowercase()),
            None => true,
        };
        let category_match = self.category.is_none_or(|c| c == motion.category);
        let difficulty_match = self.difficulty.is_none_or(|d| d == motion.difficulty);
        search_match && category_match && difficulty_match
    }
}

/// The active set of motions, built-in or from a pack.
pub struct MotionLibrary {
    motions: Vec<Motion>,
}

#[derive(Deserialize)]
struct MotionPack {
    motions: Vec<Motion>,
}

impl MotionLibrary {
    /// The stock library.
    pub fn builtin() -> Self {
        Self {
            motions: builtin_motions(),
        }
    }

    /// Loads a TOML motion pack (`[[motions]]` tables) in place of the
    /// built-in set.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let pack: MotionPack = toml::from_str(text)
            .map_err(|e| DebateError::Config(format!("invalid motion pack: {e}")))?;
        if pack.motions.is_empty() {
            return Err(DebateError::Config(
                "motion pack contains no motions".to_string(),
            ));
        }
        Ok(Self {
            motions: pack.motions,
        })
    }

    pub fn motions(&self) -> &[Motion] {
        &self.motions
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    /// Motions matching the filter, in library order.
    pub fn filter(&self, filter: &MotionFilter) -> Vec<&Motion> {
        self.motions.iter().filter(|m| filter.matches(m)).collect()
    }

    /// A uniformly random motion from the filtered set, if any match.
    pub fn random(&self, filter: &MotionFilter) -> Option<&Motion> {
        let matching = self.filter(filter);
        matching.choose(&mut rand::thread_rng()).copied()
    }
}

fn builtin_motions() -> Vec<Motion> {
    use Category::*;
    use Difficulty::*;
    let entries: [(&str, Category, Difficulty); 30] = [
        (
            "This house would implement a universal basic income.",
            Economics,
            Intermediate,
        ),
        (
            "This house believes that artificial intelligence poses an existential threat to humanity.",
            TechnologyAi,
            Advanced,
        ),
        ("This house would ban single-use plastics.", Environment, Beginner),
        (
            "This house regrets the rise of social media influencers.",
            PopCultureArts,
            Intermediate,
        ),
        (
            "This house believes that space exploration is a waste of resources.",
            TechnologyAi,
            Intermediate,
        ),
        (
            "This house would abolish the electoral college system.",
            PoliticsGovernance,
            Advanced,
        ),
        ("This house would make voting mandatory.", PoliticsGovernance, Beginner),
        (
            "This house believes that corporate lobbying should be illegal.",
            PoliticsGovernance,
            Intermediate,
        ),
        (
            "This house would prioritize economic growth over environmental protection.",
            Economics,
            Advanced,
        ),
        (
            "This house believes that gene editing for non-medical purposes is unethical.",
            EthicsPhilosophy,
            Advanced,
        ),
        (
            "This house would require all students to learn a musical instrument.",
            Education,
            Beginner,
        ),
        ("This house supports a global wealth tax.", Economics, Advanced),
        (
            "This house believes that public funding for the arts is essential.",
            PopCultureArts,
            Beginner,
        ),
        (
            "This house would replace traditional exams with project-based assessments.",
            Education,
            Intermediate,
        ),
        (
            "This house regrets the commercialization of pride parades.",
            SocialIssues,
            Intermediate,
        ),
        (
            "This house believes that nuclear energy is the most viable solution to climate change.",
            Environment,
            Advanced,
        ),
        (
            "This house would hold social media platforms legally liable for misinformation.",
            TechnologyAi,
            Advanced,
        ),
        (
            "This house believes that a vegetarian diet is morally obligatory.",
            EthicsPhilosophy,
            Intermediate,
        ),
        (
            "This house would significantly restrict intellectual property rights.",
            Economics,
            Advanced,
        ),
        (
            "This house supports the right to be forgotten online.",
            TechnologyAi,
            Intermediate,
        ),
        (
            "This house would implement term limits for all elected officials.",
            PoliticsGovernance,
            Intermediate,
        ),
        (
            "This house believes that standardized testing is a necessary evil.",
            Education,
            Intermediate,
        ),
        (
            "This house would ban all forms of private healthcare.",
            SocialIssues,
            Advanced,
        ),
        (
            "This house believes that zoos do more harm than good.",
            Environment,
            Beginner,
        ),
        ("This house would break up major tech companies.", TechnologyAi, Advanced),
        (
            "This house believes that free will is an illusion.",
            EthicsPhilosophy,
            Advanced,
        ),
        (
            "This house would make all public transportation free.",
            Economics,
            Intermediate,
        ),
        (
            "This house regrets the decline of traditional journalism.",
            PopCultureArts,
            Intermediate,
        ),
        (
            "This house would require mandatory national service for all 18-year-olds.",
            SocialIssues,
            Intermediate,
        ),
        (
            "This house would allow citizens to sell their votes.",
            PoliticsGovernance,
            Advanced,
        ),
    ];
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (text, category, difficulty))| Motion {
            id: i as u32 + 1,
            text: text.to_string(),
            category,
            difficulty,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_library_shape() {
        let library = MotionLibrary::builtin();
        assert_eq!(library.len(), 30);
        let mut ids: Vec<u32> = library.motions().iter().map(|m| m.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 30);
        for category in Category::all() {
            assert!(
                library
                    .filter(&MotionFilter::default().with_category(category))
                    .len()
                    >= 2,
                "category {category} is underpopulated"
            );
        }
    }

    #[test]
    fn test_filters_compose() {
        let library = MotionLibrary::builtin();
        let filter = MotionFilter::default()
            .with_category(Category::TechnologyAi)
            .with_difficulty(Difficulty::Advanced);
        let matching = library.filter(&filter);
        assert_eq!(matching.len(), 3);
        assert!(
            matching
                .iter()
                .all(|m| m.category == Category::TechnologyAi
                    && m.difficulty == Difficulty::Advanced)
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let library = MotionLibrary::builtin();
        let filter = MotionFilter::default().with_search("ELECTORAL COLLEGE");
        let matching = library.filter(&filter);
        assert_eq!(matching.len(), 1);
        assert!(matching[0].text.contains("electoral college"));
    }

    #[test]
    fn test_random_respects_filter() {
        let library = MotionLibrary::builtin();
        let filter = MotionFilter::default().with_difficulty(Difficulty::Beginner);
        for _ in 0..20 {
            let motion = library.random(&filter).unwrap();
            assert_eq!(motion.difficulty, Difficulty::Beginner);
        }
        let none = MotionFilter::default().with_search("no such motion text");
        assert!(library.random(&none).is_none());
    }

    #[test]
    fn test_pack_replaces_builtin() {
        let pack = r#"
            [[motions]]
            id = 1
            text = "This house would adopt a four-day school week."
            category = "Education"
            difficulty = "Beginner"
        "#;
        let library = MotionLibrary::from_toml(pack).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.motions()[0].category, Category::Education);
    }

    #[test]
    fn test_empty_pack_rejected() {
        assert!(MotionLibrary::from_toml("motions = []").is_err());
        assert!(MotionLibrary::from_toml("not toml at all [").is_err());
    }

    #[test]
    fn test_category_parse_aliases() {
        assert_eq!(Category::parse("tech").unwrap(), Category::TechnologyAi);
        assert_eq!(
            Category::parse("Pop Culture & Arts").unwrap(),
            Category::PopCultureArts
        );
        assert!(Category::parse("sports").is_err());
        assert_eq!(Difficulty::parse("ADVANCED").unwrap(), Difficulty::Advanced);
    }
}
