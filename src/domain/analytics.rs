use crate::domain::rsvp::{group_label, Answer, Rsvp, UNASSIGNED_GROUP};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary cards. Always computed over the whole cache, never the filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_responses: usize,
    pub attending: usize,
    pub not_attending: usize,
    pub attending_percentage: u32,
    pub with_guests: usize,
    /// Additive headcount: each attendee plus each +1.
    pub total_guests: usize,
    pub dietary_restrictions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBreakdown {
    pub label: String,
    pub responses: usize,
    pub attending: usize,
    /// Attendees of this group bringing a guest.
    pub bringing_guest: usize,
    pub total_guests: usize,
}

pub fn aggregate(records: &[Rsvp]) -> DashboardMetrics {
    let total_responses = records.len();
    let attending = records.iter().filter(|r| r.is_attending()).count();
    let not_attending = records
        .iter()
        .filter(|r| r.attending == Some(Answer::No))
        .count();
    let with_guests = records.iter().filter(|r| r.is_bringing_guest()).count();
    let dietary_restrictions = records
        .iter()
        .filter(|r| r.is_attending() && !r.food_restrictions.trim().is_empty())
        .count();

    DashboardMetrics {
        total_responses,
        attending,
        not_attending,
        attending_percentage: rounded_percentage(attending, total_responses),
        with_guests,
        total_guests: attending + with_guests,
        dietary_restrictions,
    }
}

/// Per-group counts, sorted by label with "Unassigned" last.
pub fn group_breakdown(records: &[Rsvp]) -> Vec<GroupBreakdown> {
    let mut by_label: BTreeMap<&str, GroupBreakdown> = BTreeMap::new();
    for rsvp in records {
        let label = group_label(&rsvp.group);
        let entry = by_label.entry(label).or_insert_with(|| GroupBreakdown {
            label: label.to_string(),
            responses: 0,
            attending: 0,
            bringing_guest: 0,
            total_guests: 0,
        });
        entry.responses += 1;
        if rsvp.is_attending() {
            entry.attending += 1;
            if rsvp.is_bringing_guest() {
                entry.bringing_guest += 1;
            }
        }
        entry.total_guests = entry.attending + entry.bringing_guest;
    }

    let unassigned = by_label.remove(UNASSIGNED_GROUP);
    let mut groups: Vec<GroupBreakdown> = by_label.into_values().collect();
    groups.extend(unassigned);
    groups
}

/// `round(part / whole * 100)` with ties rounding up; 0 when `whole` is 0.
pub fn rounded_percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (part as u64, whole as u64);
    ((200 * part + whole) / (2 * whole)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(id: &str, attending: Answer, group: &str, food: &str) -> Rsvp {
        let mut r = Rsvp::new(id, id, "Guest", &format!("{id}@example.com"));
        r.attending = Some(attending);
        r.group = group.to_string();
        r.food_restrictions = food.to_string();
        r
    }

    #[test]
    fn test_aggregate_worked_example() {
        let records = vec![
            record("A", Answer::Yes, "Family", "Vegan"),
            record("B", Answer::No, "", ""),
            record("C", Answer::Yes, "Family", ""),
        ];

        let metrics = aggregate(&records);
        assert_eq!(metrics.total_responses, 3);
        assert_eq!(metrics.attending, 2);
        assert_eq!(metrics.not_attending, 1);
        assert_eq!(metrics.attending_percentage, 67);
        assert_eq!(metrics.dietary_restrictions, 1);
        assert_eq!(metrics.attending + metrics.not_attending, metrics.total_responses);
    }

    #[test]
    fn test_empty_cache_has_zero_percentage() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics, DashboardMetrics::default());
    }

    #[test]
    fn test_dietary_ignores_decliners_and_whitespace() {
        let mut declined = record("D", Answer::No, "", "Gluten free");
        declined.bringing_guest = Some(Answer::Yes);
        let records = vec![declined, record("E", Answer::Yes, "", "   ")];

        let metrics = aggregate(&records);
        assert_eq!(metrics.dietary_restrictions, 0);
        assert_eq!(metrics.with_guests, 1);
        assert_eq!(metrics.total_guests, 2);
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 2, 50)]
    #[case(2, 3, 67)]
    #[case(1, 3, 33)]
    #[case(1, 8, 13)]
    #[case(3, 8, 38)]
    #[case(5, 5, 100)]
    fn test_rounded_percentage(#[case] part: usize, #[case] whole: usize, #[case] expected: u32) {
        assert_eq!(rounded_percentage(part, whole), expected);
    }

    #[test]
    fn test_group_breakdown() {
        let mut a = record("A", Answer::Yes, "Family", "");
        a.bringing_guest = Some(Answer::Yes);
        let mut b = record("B", Answer::No, "", "");
        b.bringing_guest = Some(Answer::Yes);
        let c = record("C", Answer::Yes, "Family", "");
        let d = record("D", Answer::Yes, "College", "");

        let groups = group_breakdown(&[a, b, c, d]);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["College", "Family", "Unassigned"]);

        let family = &groups[1];
        assert_eq!(family.responses, 2);
        assert_eq!(family.attending, 2);
        assert_eq!(family.bringing_guest, 1);
        assert_eq!(family.total_guests, 3);

        let unassigned = &groups[2];
        assert_eq!(unassigned.responses, 1);
        assert_eq!(unassigned.attending, 0);
        assert_eq!(unassigned.bringing_guest, 0);
        assert_eq!(unassigned.total_guests, 0);
    }
}
