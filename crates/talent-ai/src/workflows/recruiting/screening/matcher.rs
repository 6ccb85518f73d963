use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const SYNONYM_CONFIDENCE: f64 = 0.95;
const PARTIAL_THRESHOLD: u8 = 85;
const RELATED_THRESHOLD: u8 = 70;

/// How a required skill was located in a candidate's skill list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Partial,
    Related,
    #[serde(rename = "none")]
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    pub found: bool,
    pub match_type: MatchType,
    pub confidence: f64,
    /// Candidate skill that satisfied the requirement, lower-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_with: Option<String>,
}

impl SkillMatch {
    fn missing(skill: &str) -> Self {
        Self {
            skill: skill.to_string(),
            found: false,
            match_type: MatchType::NoMatch,
            confidence: 0.0,
            matched_with: None,
        }
    }
}

/// Three-tier skill lookup: literal, synonym table, then fuzzy partial ratio.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    synonyms: HashMap<String, Vec<String>>,
}

impl Default for SkillMatcher {
    fn default() -> Self {
        let table: &[(&str, &[&str])] = &[
            ("python", &["python", "python3", "py"]),
            (
                "machine learning",
                &["machine learning", "ml", "artificial intelligence", "ai"],
            ),
            ("pytorch", &["pytorch", "torch", "py-torch"]),
            ("tensorflow", &["tensorflow", "tf", "tensor flow"]),
            (
                "nlp",
                &[
                    "nlp",
                    "natural language processing",
                    "text processing",
                    "language models",
                ],
            ),
            (
                "computer vision",
                &["computer vision", "cv", "image processing", "opencv"],
            ),
            (
                "javascript",
                &["javascript", "js", "ecmascript", "node.js", "nodejs"],
            ),
            ("react", &["react", "reactjs", "react.js"]),
            ("java", &["java", "jvm"]),
            ("sql", &["sql", "mysql", "postgresql", "postgres", "database"]),
            ("aws", &["aws", "amazon web services", "amazon cloud"]),
            ("docker", &["docker", "containerization", "containers"]),
            (
                "kubernetes",
                &["kubernetes", "k8s", "container orchestration"],
            ),
            ("git", &["git", "version control", "github", "gitlab"]),
            ("api", &["api", "rest api", "restful", "web services"]),
            ("agile", &["agile", "scrum", "kanban"]),
        ];

        let synonyms = table
            .iter()
            .map(|(skill, aliases)| {
                (
                    skill.to_string(),
                    aliases.iter().map(|alias| alias.to_string()).collect(),
                )
            })
            .collect();

        Self { synonyms }
    }
}

impl SkillMatcher {
    /// Add or replace the alias list for a skill.
    pub fn with_synonyms<I, S>(mut self, skill: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases = aliases
            .into_iter()
            .map(|alias| alias.into().trim().to_lowercase())
            .collect();
        self.synonyms.insert(skill.trim().to_lowercase(), aliases);
        self
    }

    pub fn match_skill(&self, required_skill: &str, candidate_skills: &[String]) -> SkillMatch {
        let required = required_skill.trim().to_lowercase();
        let candidate: Vec<String> = candidate_skills
            .iter()
            .map(|skill| skill.trim().to_lowercase())
            .filter(|skill| !skill.is_empty())
            .collect();

        if candidate.iter().any(|skill| *skill == required) {
            return SkillMatch {
                skill: required_skill.to_string(),
                found: true,
                match_type: MatchType::Exact,
                confidence: 1.0,
                matched_with: Some(required),
            };
        }

        if let Some(aliases) = self.synonyms.get(&required) {
            if let Some(alias) = aliases.iter().find(|alias| candidate.contains(alias)) {
                return SkillMatch {
                    skill: required_skill.to_string(),
                    found: true,
                    match_type: MatchType::Exact,
                    confidence: SYNONYM_CONFIDENCE,
                    matched_with: Some(alias.clone()),
                };
            }
        }

        let mut best: Option<(u8, &String)> = None;
        for skill in &candidate {
            let similarity = partial_ratio(&required, skill);
            if best.map(|(score, _)| similarity > score).unwrap_or(true) {
                best = Some((similarity, skill));
            }
        }

        let Some((similarity, skill)) = best else {
            return SkillMatch::missing(required_skill);
        };

        let match_type = if similarity >= PARTIAL_THRESHOLD {
            MatchType::Partial
        } else if similarity >= RELATED_THRESHOLD {
            MatchType::Related
        } else {
            return SkillMatch::missing(required_skill);
        };

        SkillMatch {
            skill: required_skill.to_string(),
            found: true,
            match_type,
            confidence: f64::from(similarity) / 100.0,
            matched_with: Some(skill.clone()),
        }
    }
}

/// Best alignment of the shorter string against windows of the longer one, 0..=100.
///
/// Each window is compared with an indel ratio (`2 * lcs / (len_a + len_b)`); windows that
/// hang off either end of the longer string are included so prefixes and suffixes score too.
pub fn partial_ratio(left: &str, right: &str) -> u8 {
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    let (short, long) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };

    if short.is_empty() {
        return 0;
    }
    if short.len() == long.len() {
        return indel_ratio(&short, &long).round() as u8;
    }

    let width = short.len();
    let mut best = 0.0_f64;

    for end in 1..width {
        best = best.max(indel_ratio(&short, &long[..end]));
    }
    for start in 0..=(long.len() - width) {
        best = best.max(indel_ratio(&short, &long[start..start + width]));
        if best >= 100.0 {
            return 100;
        }
    }
    for start in (long.len() - width + 1)..long.len() {
        best = best.max(indel_ratio(&short, &long[start..]));
    }

    best.round() as u8
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * longest_common_subsequence(a, b) as f64 / total as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
