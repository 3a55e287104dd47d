pub mod analytics;
pub mod filter;
pub mod rsvp;
pub mod seating;
pub mod selection;
pub mod table;
