pub mod client;
pub mod mock;
pub mod platform;
pub mod types;

pub use client::TelegramClient;
pub use platform::{AudioKind, ChatPlatform, InputFile, TelegramError};
pub use types::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update, User,
};
