//! Terminal implementations of the map, form and list collaborators.
pub mod form;
pub mod list;
pub mod map;
