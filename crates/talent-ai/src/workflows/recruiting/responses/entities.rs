use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const MAX_QUESTIONS: usize = 5;
const MAX_REQUESTS: usize = 3;
const MIN_FRAGMENT_LEN: usize = 10;
const AVAILABILITY_CONTEXT: usize = 50;

static QUESTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)[A-Z][^.!?]*\?",
        r"(?i)(?:can you|could you|would you|do you|is it|are there|what|when|where|why|how)[^.!?]*\?",
        r"(?i)(?:I'd like to know|I want to understand|I'm curious about|Tell me about)[^.!?]*[.?]",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("question pattern compiles"))
    .collect()
});

static AVAILABILITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:available|free|open)\s+(?:on|this|next|tomorrow|monday|tuesday|wednesday|thursday|friday|saturday|sunday)",
        r"(?i)(?:can we|let's|how about)\s+(?:meet|schedule|talk|call)",
        r"(?i)(?:morning|afternoon|evening|am|pm|[0-9]{1,2}:[0-9]{2})",
        r"(?i)(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)",
        r"(?i)(?:next week|this week|tomorrow|today)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("availability pattern compiles"))
    .collect()
});

static REQUEST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:I need|I require|I would need|could you provide)[^.!?]*[.?]",
        r"(?i)(?:it would be helpful if|I would appreciate if|please)[^.!?]*[.?]",
        r"(?i)(?:remote|video|phone|in-person|on-site)[^.!?]*(?:interview|call|meeting)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("request pattern compiles"))
    .collect()
});

/// Structured details pulled from reply text without the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub questions: Vec<String>,
    pub availability: Option<String>,
    pub special_requests: Vec<String>,
}

impl ExtractedEntities {
    pub fn from_text(text: &str) -> Self {
        Self {
            questions: questions(text),
            availability: availability(text),
            special_requests: special_requests(text),
        }
    }
}

pub fn questions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    fragments(&QUESTION_PATTERNS, text)
        .filter(|question| seen.insert(question.clone()))
        .take(MAX_QUESTIONS)
        .collect()
}

/// First availability mention with surrounding context.
pub fn availability(text: &str) -> Option<String> {
    let found = AVAILABILITY_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))?;

    let start = floor_boundary(text, found.start().saturating_sub(AVAILABILITY_CONTEXT));
    let end = ceil_boundary(text, found.end() + AVAILABILITY_CONTEXT);
    Some(text[start..end].trim().to_string())
}

pub fn special_requests(text: &str) -> Vec<String> {
    fragments(&REQUEST_PATTERNS, text).take(MAX_REQUESTS).collect()
}

fn fragments<'a>(patterns: &'a [Regex], text: &'a str) -> impl Iterator<Item = String> + 'a {
    patterns
        .iter()
        .flat_map(move |pattern| pattern.find_iter(text))
        .map(|found| found.as_str().trim())
        .filter(|fragment| fragment.len() > MIN_FRAGMENT_LEN)
        .map(str::to_string)
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
