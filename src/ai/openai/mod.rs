pub mod client;
pub mod image;
pub mod types;
pub mod upstream;

pub use client::OpenAiHttpClient;
pub use upstream::OpenAiUpstream;

pub const RESPONSES_PATH: &str = "/v1/responses";
pub const IMAGES_PATH: &str = "/v1/images/generations";
