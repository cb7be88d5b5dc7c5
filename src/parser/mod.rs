pub mod booking_parser;

pub use booking_parser::{parse_offers, RawOffer};
