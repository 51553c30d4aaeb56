//! Payment processor integration (Creem).

mod creem;

pub use creem::{CheckoutClient, CheckoutMetadata, CheckoutSession, CreemClient};
