use serde::{Deserialize, Serialize};

use crate::annotations::AnnotationKind;

/// A literal phrase to look for and what to suggest instead
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FindingPattern {
    pub phrase: String,
    pub kind: AnnotationKind,
    pub suggestion: String,
    #[serde(default)]
    pub explanation: String,
}

impl FindingPattern {
    pub fn new(phrase: &str, kind: AnnotationKind, suggestion: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            kind,
            suggestion: suggestion.to_string(),
            explanation: String::new(),
        }
    }

    pub fn spelling(phrase: &str, suggestion: &str) -> Self {
        Self::new(phrase, AnnotationKind::Spelling, suggestion)
    }

    pub fn grammar(phrase: &str, suggestion: &str) -> Self {
        Self::new(phrase, AnnotationKind::Grammar, suggestion)
    }

    pub fn with_explanation(mut self, explanation: &str) -> Self {
        self.explanation = explanation.to_string();
        self
    }
}

/// Small starter list used when no patterns are configured
pub fn builtin_patterns() -> Vec<FindingPattern> {
    vec![
        FindingPattern::spelling("teh", "the"),
        FindingPattern::spelling("recieve", "receive")
            .with_explanation("i before e, except after c"),
        FindingPattern::spelling("seperate", "separate"),
        FindingPattern::spelling("definately", "definitely"),
        FindingPattern::spelling("alot", "a lot").with_explanation("\"a lot\" is two words"),
        FindingPattern::grammar("could of", "could have")
            .with_explanation("\"could of\" is a mishearing of \"could've\""),
        FindingPattern::grammar("should of", "should have")
            .with_explanation("\"should of\" is a mishearing of \"should've\""),
        FindingPattern::grammar("would of", "would have")
            .with_explanation("\"would of\" is a mishearing of \"would've\""),
    ]
}
