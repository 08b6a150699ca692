//! Terminal output for the admin binary

pub mod table;
pub mod theme;

use owo_colors::OwoColorize;

pub use table::{emitter_table, stats_table};
pub use theme::{theme, Theme};

pub fn header(text: &str) {
    println!("{}", text.style(theme().title.clone()));
}

pub fn success(label: &str) {
    println!("✅ {}", label.style(theme().ok.clone()));
}

pub fn error(label: &str) {
    eprintln!("❌ {}", label.style(theme().failure.clone()));
}

pub fn field(label: &str, value: &str) {
    println!("  {} {}", format!("{}:", label).style(theme().label.clone()), value);
}

pub fn ident(text: &str) -> String {
    text.style(theme().ident.clone()).to_string()
}
