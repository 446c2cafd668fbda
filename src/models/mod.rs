mod link;

pub use link::{ClickEvent, LinkRecord};
