use tabled::{settings::Style, Table, Tabled};

use crate::emitter::EmitterInfo;
use crate::ident::RfIdentification;
use crate::storage::StoreStats;

#[derive(Tabled)]
struct TypeCountRow {
    #[tabled(rename = "Type")]
    rf_type: String,
    #[tabled(rename = "Emitters")]
    count: usize,
}

#[derive(Tabled)]
struct EmitterRow {
    #[tabled(rename = "Emitter")]
    ident: String,
    #[tabled(rename = "Latitude")]
    latitude: String,
    #[tabled(rename = "Longitude")]
    longitude: String,
    #[tabled(rename = "Radius N/S")]
    radius_ns: String,
    #[tabled(rename = "Radius E/W")]
    radius_ew: String,
    #[tabled(rename = "Trust")]
    trust: i64,
    #[tabled(rename = "Note")]
    note: String,
}

/// Per-type counts; empty string when the store is empty
pub fn stats_table(stats: &StoreStats) -> String {
    if stats.by_type.is_empty() {
        return String::new();
    }

    let rows: Vec<TypeCountRow> = stats
        .by_type
        .iter()
        .map(|(rf_type, count)| TypeCountRow {
            rf_type: rf_type.clone(),
            count: *count,
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn emitter_table(emitters: &[(RfIdentification, EmitterInfo)]) -> String {
    if emitters.is_empty() {
        return String::new();
    }

    let rows: Vec<EmitterRow> = emitters
        .iter()
        .map(|(ident, info)| EmitterRow {
            ident: ident.to_string(),
            latitude: format!("{:.6}", info.latitude),
            longitude: format!("{:.6}", info.longitude),
            radius_ns: format!("{:.1}", info.radius_ns),
            radius_ew: format!("{:.1}", info.radius_ew),
            trust: info.trust,
            note: info.note.clone(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}
