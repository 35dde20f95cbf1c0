pub mod controller;
pub mod messages;
pub mod removal;
pub mod runner;
pub mod telegram;
pub mod transport;

pub use controller::{BotController, ControllerSettings};
pub use runner::run_bot;
pub use telegram::TelegramClient;
pub use transport::{ChatTransport, ChatUpdate, UpdateKind};
