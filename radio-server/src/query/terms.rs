//! Free-text search: tokenizing and planning.
//!
//! People type things like "seattle", "new york ny", "kexp seattle" or
//! "wnyc new york ny" into the map's search box. Rather than attempting to
//! parse that properly, each term count has a fixed set of guesses about
//! what the terms mean:
//!
//! | terms | guesses |
//! |-------|---------|
//! | 1 | city or state; name or call sign |
//! | 2 | two-word city; city + state; name/call + city or state |
//! | 3 | two-word city + state; name/call + two-word city; name/call + city + state |
//! | 4 | name/call + two-word city + state |
//!
//! Each guess is one branch of the plan. A station matching several
//! branches appears once per branch; results are not deduplicated.

use super::error::QueryError;
use super::predicate::{Pattern, Predicate, TextField};

/// Largest number of terms any template handles.
pub const MAX_TERMS: usize = 4;

/// A tokenized search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

type Template = fn(&[String]) -> Vec<Predicate>;

/// Indexed by term count minus one.
const TEMPLATES: [Template; MAX_TERMS] = [one_term, two_terms, three_terms, four_terms];

impl SearchQuery {
    /// Tokenize a search string.
    ///
    /// ASCII punctuation is removed before splitting on whitespace, so
    /// "St. Louis, MO" becomes `["St", "Louis", "MO"]`. A string with no
    /// terms left is a valid query that matches nothing.
    pub fn parse(q: &str) -> Result<Self, QueryError> {
        let stripped: String = q.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        let terms: Vec<String> = stripped.split_whitespace().map(str::to_string).collect();

        if terms.len() > MAX_TERMS {
            return Err(QueryError::TooManyTerms(terms.len()));
        }

        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The branches to run, in result order. Empty for an empty query.
    pub fn plan(&self) -> Vec<Predicate> {
        match self.terms.len() {
            0 => Vec::new(),
            n => TEMPLATES[n - 1](&self.terms),
        }
    }
}

fn like(field: TextField, term: &str) -> Predicate {
    Predicate::like(field, Pattern::prefix(term))
}

fn city_pair(first: &str, second: &str) -> Predicate {
    Predicate::like(TextField::City, Pattern::concat(&[first, second]))
}

fn city_or_state(term: &str) -> Predicate {
    Predicate::Or(vec![like(TextField::City, term), like(TextField::State, term)])
}

fn name_or_call(term: &str) -> Predicate {
    Predicate::Or(vec![like(TextField::Name, term), like(TextField::Call, term)])
}

fn one_term(t: &[String]) -> Vec<Predicate> {
    vec![city_or_state(&t[0]), name_or_call(&t[0])]
}

fn two_terms(t: &[String]) -> Vec<Predicate> {
    vec![
        city_pair(&t[0], &t[1]),
        Predicate::And(vec![like(TextField::City, &t[0]), like(TextField::State, &t[1])]),
        Predicate::And(vec![name_or_call(&t[0]), city_or_state(&t[1])]),
    ]
}

fn three_terms(t: &[String]) -> Vec<Predicate> {
    vec![
        Predicate::And(vec![city_pair(&t[0], &t[1]), like(TextField::State, &t[2])]),
        Predicate::And(vec![name_or_call(&t[0]), city_pair(&t[1], &t[2])]),
        Predicate::And(vec![
            name_or_call(&t[0]),
            like(TextField::City, &t[1]),
            like(TextField::State, &t[2]),
        ]),
    ]
}

fn four_terms(t: &[String]) -> Vec<Predicate> {
    vec![Predicate::And(vec![
        name_or_call(&t[0]),
        city_pair(&t[1], &t[2]),
        like(TextField::State, &t[3]),
    ])]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(q: &str) -> Vec<String> {
        SearchQuery::parse(q).unwrap().terms().to_vec()
    }

    #[test]
    fn strips_punctuation_before_splitting() {
        assert_eq!(terms("St. Louis, MO"), vec!["St", "Louis", "MO"]);
        assert_eq!(terms("k-e-x-p"), vec!["kexp"]);
        assert_eq!(terms("  seattle\twa "), vec!["seattle", "wa"]);
    }

    #[test]
    fn punctuation_only_is_empty() {
        let query = SearchQuery::parse("?!.,").unwrap();
        assert!(query.is_empty());
        assert!(query.plan().is_empty());

        let query = SearchQuery::parse(". , !").unwrap();
        assert!(query.is_empty());
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(SearchQuery::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn five_terms_rejected() {
        assert_eq!(
            SearchQuery::parse("a b c d e"),
            Err(QueryError::TooManyTerms(5))
        );
    }

    #[test]
    fn punctuation_removed_before_counting() {
        // Five tokens, but one is pure punctuation.
        assert_eq!(terms("wnyc new york ny !").len(), 4);
    }

    #[test]
    fn branch_counts_per_arity() {
        let counts: Vec<usize> = ["a", "a b", "a b c", "a b c d"]
            .iter()
            .map(|q| SearchQuery::parse(q).unwrap().plan().len())
            .collect();
        assert_eq!(counts, vec![2, 3, 3, 1]);
    }

    #[test]
    fn single_term_plan() {
        let plan = SearchQuery::parse("sea").unwrap().plan();
        assert_eq!(plan[0], city_or_state("sea"));
        assert_eq!(plan[1], name_or_call("sea"));
    }

    #[test]
    fn two_term_plan_concatenates_city() {
        let plan = SearchQuery::parse("new york").unwrap().plan();
        assert_eq!(
            plan[0],
            Predicate::like(TextField::City, Pattern::concat(&["new", "york"]))
        );
    }

    #[test]
    fn four_term_plan() {
        let plan = SearchQuery::parse("wnyc new york ny").unwrap().plan();
        assert_eq!(
            plan,
            vec![Predicate::And(vec![
                name_or_call("wnyc"),
                city_pair("new", "york"),
                like(TextField::State, "ny"),
            ])]
        );
    }
}
