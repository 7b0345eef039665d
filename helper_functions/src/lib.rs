pub mod accessors;
pub mod misc;
pub mod mutators;
pub mod predicates;
