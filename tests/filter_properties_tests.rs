use rsvp_admin::domain::filter::{filter, FilterCriteria};
use rsvp_admin::domain::rsvp::{Answer, Rsvp};
use rsvp_admin::test_helpers::generated_guest_list;
use rstest::rstest;

fn ids(rows: &[&Rsvp]) -> Vec<String> {
    rows.iter().map(|r| r.id.to_string()).collect()
}

#[rstest]
#[case(FilterCriteria::new())]
#[case(FilterCriteria::new().with_text("ADA"))]
#[case(FilterCriteria::new().with_text("hopper").with_attending(Answer::Yes))]
#[case(FilterCriteria::new().with_bringing_guest(Answer::Yes))]
#[case(FilterCriteria::new().with_food("gluten"))]
#[case(FilterCriteria::new().with_group(""))]
#[case(FilterCriteria::new().with_group("Work").with_attending(Answer::No))]
fn test_filter_is_idempotent(#[case] criteria: FilterCriteria) {
    let records = generated_guest_list(120);

    let once: Vec<Rsvp> = filter(&records, &criteria).into_iter().cloned().collect();
    let twice = filter(&once, &criteria);

    assert_eq!(ids(&twice), once.iter().map(|r| r.id.to_string()).collect::<Vec<_>>());
}

#[rstest]
#[case("lo", Answer::Yes, "veg", "Family")]
#[case("example.com", Answer::No, "", "")]
#[case("grace", Answer::Yes, "nuts", "Friends")]
fn test_combined_criteria_are_a_conjunction(
    #[case] text: &str,
    #[case] attending: Answer,
    #[case] food: &str,
    #[case] group: &str,
) {
    let records = generated_guest_list(200);
    let singles = [
        FilterCriteria::new().with_text(text),
        FilterCriteria::new().with_attending(attending),
        FilterCriteria::new().with_food(food),
        FilterCriteria::new().with_group(group),
    ];
    let combined = FilterCriteria::new()
        .with_text(text)
        .with_attending(attending)
        .with_food(food)
        .with_group(group);

    let expected: Vec<&Rsvp> = records
        .iter()
        .filter(|r| singles.iter().all(|c| c.matches(r)))
        .collect();

    assert_eq!(ids(&filter(&records, &combined)), ids(&expected));
}

#[test]
fn test_filter_preserves_cache_order() {
    let records = generated_guest_list(60);
    let rows = filter(&records, &FilterCriteria::new().with_attending(Answer::Yes));

    let positions: Vec<usize> = rows
        .iter()
        .map(|r| records.iter().position(|c| c.id == r.id).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_blank_text_matches_everything() {
    let records = generated_guest_list(20);
    assert_eq!(filter(&records, &FilterCriteria::new().with_text("   ")).len(), 20);
}
