//! Styled terminal messages
//!
//! Info lines go to stdout; warnings and errors go to stderr so scripted
//! callers can separate the two streams.

use console::style;

pub fn info(message: &str) {
    println!("{} {message}", style("[INFO]").cyan().bold());
}

pub fn warn(message: &str) {
    eprintln!("{} {message}", style("[WARN]").yellow().bold());
}

pub fn error(message: &str) {
    eprintln!("{} {message}", style("[ERROR]").red().bold());
}
