//! Grade analytics: eligibility, averaging strategies, history and chart points.
//!
//! Records flow through the validator (eligibility and /20 rescaling), into
//! one of the averaging strategies, then through the history builder and
//! finally the display amplifier. Everything here is pure and synchronous.

pub mod amplifier;
pub mod history;
pub mod strategy;
pub mod subject;
pub mod summary;
pub mod utility;
pub mod validator;
