pub mod dates;
pub mod duration;
pub mod report;
