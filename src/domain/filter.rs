use crate::domain::rsvp::{Answer, Rsvp};
use serde::{Deserialize, Serialize};

/// Independently combinable filter predicates. A `None` or blank criterion
/// always matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Case-insensitive substring over first name, last name and email.
    pub text_query: String,
    pub attending_equals: Option<Answer>,
    pub bringing_guest_equals: Option<Answer>,
    /// Case-insensitive substring over food restrictions.
    pub food_contains: String,
    /// Exact group match; `Some("")` selects the unassigned records.
    pub group_equals: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, query: impl Into<String>) -> Self {
        self.text_query = query.into();
        self
    }

    pub fn with_attending(mut self, answer: Answer) -> Self {
        self.attending_equals = Some(answer);
        self
    }

    pub fn with_bringing_guest(mut self, answer: Answer) -> Self {
        self.bringing_guest_equals = Some(answer);
        self
    }

    pub fn with_food(mut self, needle: impl Into<String>) -> Self {
        self.food_contains = needle.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_equals = Some(group.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text_query.trim().is_empty()
            && self.attending_equals.is_none()
            && self.bringing_guest_equals.is_none()
            && self.food_contains.trim().is_empty()
            && self.group_equals.is_none()
    }

    /// True when `rsvp` satisfies every active predicate.
    pub fn matches(&self, rsvp: &Rsvp) -> bool {
        self.matches_text(rsvp)
            && self
                .attending_equals
                .is_none_or(|answer| rsvp.attending == Some(answer))
            && self
                .bringing_guest_equals
                .is_none_or(|answer| rsvp.bringing_guest == Some(answer))
            && self.matches_food(rsvp)
            && self
                .group_equals
                .as_ref()
                .is_none_or(|group| rsvp.group == *group)
    }

    // Whitespace-only queries are inactive; otherwise the query is matched as typed.
    fn matches_text(&self, rsvp: &Rsvp) -> bool {
        if self.text_query.trim().is_empty() {
            return true;
        }
        let haystack = format!("{} {} {}", rsvp.first_name, rsvp.last_name, rsvp.email);
        contains_ignore_case(&haystack, &self.text_query)
    }

    fn matches_food(&self, rsvp: &Rsvp) -> bool {
        self.food_contains.trim().is_empty()
            || contains_ignore_case(&rsvp.food_restrictions, &self.food_contains)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Filtered view of `records`, preserving their order. Pure and idempotent.
pub fn filter<'a>(records: &'a [Rsvp], criteria: &FilterCriteria) -> Vec<&'a Rsvp> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Vec<Rsvp> {
        let mut a = Rsvp::new("a", "Ada", "Lovelace", "ada@example.com");
        a.attending = Some(Answer::Yes);
        a.bringing_guest = Some(Answer::Yes);
        a.group = "Family".to_string();
        a.food_restrictions = "Vegan".to_string();

        let mut b = Rsvp::new("b", "Brian", "Kernighan", "bwk@example.org");
        b.attending = Some(Answer::No);

        let mut c = Rsvp::new("c", "Carol", "Shaw", "carol@example.com");
        c.attending = Some(Answer::Yes);
        c.group = "Family".to_string();

        vec![a, b, c]
    }

    fn ids(view: &[&Rsvp]) -> Vec<String> {
        view.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_empty_criteria_matches_everything_in_order() {
        let records = sample();
        let view = filter(&records, &FilterCriteria::default());
        assert_eq!(ids(&view), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_group_filter_preserves_cache_order() {
        let records = sample();
        let view = filter(&records, &FilterCriteria::new().with_group("Family"));
        assert_eq!(ids(&view), vec!["a", "c"]);
    }

    #[test]
    fn test_group_filter_empty_selects_unassigned() {
        let records = sample();
        let view = filter(&records, &FilterCriteria::new().with_group(""));
        assert_eq!(ids(&view), vec!["b"]);
    }

    #[rstest]
    #[case("ada", vec!["a"])]
    #[case("LOVELACE", vec!["a"])]
    #[case("example.com", vec!["a", "c"])]
    #[case(" shaw ", vec!["c"])]
    #[case("example.com ", vec![])]
    #[case("nobody", vec![])]
    fn test_text_query(#[case] query: &str, #[case] expected: Vec<&str>) {
        let records = sample();
        let view = filter(&records, &FilterCriteria::new().with_text(query));
        assert_eq!(ids(&view), expected);
    }

    #[test]
    fn test_food_is_case_insensitive() {
        let records = sample();
        let view = filter(&records, &FilterCriteria::new().with_food("veg"));
        assert_eq!(ids(&view), vec!["a"]);

        let view = filter(&records, &FilterCriteria::new().with_food(" vegan"));
        assert!(view.is_empty());
        let view = filter(&records, &FilterCriteria::new().with_food("   "));
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let records = sample();
        let criteria = FilterCriteria::new()
            .with_attending(Answer::Yes)
            .with_bringing_guest(Answer::Yes);
        let view = filter(&records, &criteria);
        assert_eq!(ids(&view), vec!["a"]);

        let broader = filter(&records, &FilterCriteria::new().with_attending(Answer::Yes));
        assert!(view.len() <= broader.len());
        for r in &records {
            let expected = r.attending == Some(Answer::Yes) && r.bringing_guest == Some(Answer::Yes);
            assert_eq!(view.iter().any(|v| v.id == r.id), expected);
        }
    }

    #[test]
    fn test_criteria_serialize_answers_as_wire_text() {
        let criteria = FilterCriteria::new()
            .with_attending(Answer::Yes)
            .with_group("Family");
        let value = serde_json::to_value(&criteria).unwrap();
        assert_eq!(value["attendingEquals"], "yes");
        assert_eq!(value["groupEquals"], "Family");

        let back: FilterCriteria = serde_json::from_value(value).unwrap();
        assert_eq!(back, criteria);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = sample();
        let criteria = FilterCriteria::new().with_text("example.com");
        let once: Vec<Rsvp> = filter(&records, &criteria).into_iter().cloned().collect();
        let twice: Vec<Rsvp> = filter(&once, &criteria).into_iter().cloned().collect();
        assert_eq!(once, twice);
        assert_eq!(filter(&records, &criteria), filter(&records, &criteria));
    }
}
