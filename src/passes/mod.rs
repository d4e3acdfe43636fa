//! Processing passes, run in order by [`crate::SheetToMidi`]

pub mod pass_0;
pub mod pass_1;
pub mod pass_2;
