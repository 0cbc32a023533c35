//! Entrega Admin - restaurant delivery back office
//!
//! # Layout
//!
//! ```text
//! entrega-admin/src/
//! ├── core/          # configuration
//! ├── store/         # DataStore trait, SQLite and in-memory backends
//! ├── sequencer.rs   # display_order swaps
//! ├── notify.rs      # operator notifications
//! ├── session.rs     # admin sign-in (Argon2)
//! ├── services/      # one service per back-office screen
//! ├── receipt.rs     # order receipt rendering and printing
//! └── utils/         # logging
//! ```

pub mod core;
pub mod notify;
pub mod receipt;
pub mod sequencer;
pub mod services;
pub mod session;
pub mod store;
pub mod utils;

// Re-exports
pub use core::{Config, ConfigError};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use receipt::{ReceiptPrinter, ReceiptRenderer};
pub use sequencer::{Direction, MoveOutcome, ReorderStrategy, Sequencer};
pub use services::AdminContext;
pub use session::{AuthProvider, LocalAuthProvider, Session, SessionError, SessionManager};
pub use store::{DataStore, MemoryStore, Query, SqliteStore, StoreError, Table};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
