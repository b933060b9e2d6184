pub mod notify;
pub mod request;
pub mod target;

pub use notify::{DryRunNotifier, Notifier, OutgoingMessage};
pub use request::{AccessRequest, Language, RequestError, Submission, submit};
pub use target::{Category, Listing, ReservationTarget, parse_listing};
