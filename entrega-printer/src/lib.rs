//! # entrega-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - Windows-1252 encoding for Portuguese text
//! - Network printing (TCP port 9100)
//!
//! WHAT to print (order receipts) lives in `entrega-admin`.
//!
//! ## Example
//!
//! ```ignore
//! use entrega_printer::{EscPosBuilder, NetworkPrinter, Printer};
//!
//! let mut builder = EscPosBuilder::new(48);
//! builder.center();
//! builder.double_size();
//! builder.line("Pedido");
//! builder.reset_size();
//! builder.sep_double();
//! builder.left();
//! builder.line("Endereço: Rua das Flores, 10");
//! builder.cut_feed(3);
//!
//! let printer = NetworkPrinter::from_addr("192.168.0.50:9100")?;
//! printer.print(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use encoding::{encode_latin, pad_text, text_width, truncate_text};
pub use error::{PrintError, PrintResult};
pub use escpos::{EscPosBuilder, EscPosTextBuilder};
pub use printer::{DEFAULT_PORT, NetworkPrinter, Printer};
