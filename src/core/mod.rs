pub mod cascade;
pub mod debounce;
pub mod render;
pub mod search;
pub mod sequence;

pub use crate::domain::model::{CascadeState, Lead, Municipality, Region, SearchForm};
pub use crate::domain::ports::{CascadeView, LeadApi, ResultsView, Storage};
pub use crate::utils::error::Result;
