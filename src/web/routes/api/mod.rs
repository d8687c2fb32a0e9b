pub mod newsletter;

pub use newsletter::newsletter_subscribe;
