pub mod adapter;
pub mod commands;
pub mod convert;
pub mod embed;
pub mod error;
pub mod handler;
pub mod messager;
pub mod respond;

pub use adapter::DiscordAdapter;
pub use error::DiscordError;
pub use messager::SerenityMessager;
