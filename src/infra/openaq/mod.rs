mod client;

pub use client::OpenAqClient;
