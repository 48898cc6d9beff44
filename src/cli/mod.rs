//! Console front-end for the pricing core

pub mod bulk;
pub mod price;
pub mod setup;
pub mod ui;
