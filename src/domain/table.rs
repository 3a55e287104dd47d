use crate::domain::rsvp::{answer_text, Rsvp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    Name,
    Email,
    Attending,
    BringingGuest,
    GuestName,
    FoodRestrictions,
    Group,
    Note,
    Submitted,
}

impl SortColumn {
    pub fn header(self) -> &'static str {
        match self {
            SortColumn::Name => "Name",
            SortColumn::Email => "Email",
            SortColumn::Attending => "Attending",
            SortColumn::BringingGuest => "Bringing Guest",
            SortColumn::GuestName => "Guest Name",
            SortColumn::FoodRestrictions => "Food",
            SortColumn::Group => "Group",
            SortColumn::Note => "Note",
            SortColumn::Submitted => "Submitted",
        }
    }

    fn compare(self, a: &Rsvp, b: &Rsvp) -> Ordering {
        match self {
            SortColumn::Name => compare_text(&a.full_name(), &b.full_name()),
            SortColumn::Email => compare_text(&a.email, &b.email),
            SortColumn::Attending => {
                compare_text(answer_text(a.attending), answer_text(b.attending))
            }
            SortColumn::BringingGuest => compare_text(
                answer_text(a.bringing_guest),
                answer_text(b.bringing_guest),
            ),
            SortColumn::GuestName => compare_text(&a.guest_name(), &b.guest_name()),
            SortColumn::FoodRestrictions => {
                compare_text(&a.food_restrictions, &b.food_restrictions)
            }
            SortColumn::Group => compare_text(&a.group, &b.group),
            SortColumn::Note => compare_text(&a.admin_note, &b.admin_note),
            SortColumn::Submitted => a.timestamp.cmp(&b.timestamp),
        }
    }
}

impl std::str::FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "name" => Ok(SortColumn::Name),
            "email" => Ok(SortColumn::Email),
            "attending" => Ok(SortColumn::Attending),
            "bringingguest" | "guest" => Ok(SortColumn::BringingGuest),
            "guestname" => Ok(SortColumn::GuestName),
            "food" | "foodrestrictions" => Ok(SortColumn::FoodRestrictions),
            "group" => Ok(SortColumn::Group),
            "note" | "adminnote" => Ok(SortColumn::Note),
            "submitted" | "timestamp" => Ok(SortColumn::Submitted),
            other => Err(format!("unknown column '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// Header click cycle: unsorted, ascending, descending, unsorted.
/// Clicking a different column starts it at ascending.
pub fn toggle_sort(current: Option<SortSpec>, column: SortColumn) -> Option<SortSpec> {
    match current {
        Some(spec) if spec.column == column => match spec.direction {
            SortDirection::Ascending => Some(SortSpec::descending(column)),
            SortDirection::Descending => None,
        },
        _ => Some(SortSpec::ascending(column)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Stable sort, so rows that compare equal keep their filtered order.
pub fn sort_rows(rows: &mut [&Rsvp], spec: Option<SortSpec>) {
    let Some(spec) = spec else {
        return;
    };
    rows.sort_by(|a, b| {
        let ordering = spec.column.compare(a, b);
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub rows: Vec<&'a Rsvp>,
    pub page_index: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

impl Page<'_> {
    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        self.page_index + 1 < self.page_count
    }
}

pub fn page_count(total_rows: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_rows.div_ceil(page_size).max(1)
}

/// Slices out one page. An out-of-range index is clamped to the last page.
pub fn paginate<'a>(rows: &[&'a Rsvp], page_index: usize, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let page_count = page_count(rows.len(), page_size);
    let page_index = page_index.min(page_count - 1);
    let start = page_index * page_size;
    let end = (start + page_size).min(rows.len());
    Page {
        rows: rows.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
        page_index,
        page_count,
        total_rows: rows.len(),
    }
}
