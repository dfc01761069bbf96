//! Authentication domain types

mod outcome;
mod payload;
mod redirect;
mod token;

pub use outcome::{AuthOutcome, OutcomeMessages};
pub use payload::AuthPayload;
pub use redirect::RedirectHints;
pub use token::{AuthToken, TokenKind};
