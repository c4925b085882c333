//! Tab-separated text table of optimizer results.

use std::io;

use crate::data::build::EquipSlot;
use crate::data::stat::StatKind;
use crate::optimizer::ranking::OptimizeResult;

pub const HEADER: [&str; 18] = [
    "rank",
    "expected_damage",
    "weapon",
    "head",
    "body",
    "leg",
    "accessory1",
    "accessory2",
    "hp",
    "mp",
    "power",
    "magic",
    "defense",
    "crit_rate",
    "base_damage",
    "hit_damage",
    "extra_damage",
    "hits",
];

const EMPTY_SLOT: &str = "-";

/// One table row, in [`HEADER`] order.
pub fn result_row(result: &OptimizeResult) -> Vec<String> {
    let stat = |kind: StatKind| format!("{:.0}", result.stats.get(kind));
    let mut row = vec![result.rank.to_string(), format!("{:.1}", result.expected_damage)];
    row.extend(
        EquipSlot::ALL
            .iter()
            .map(|slot| result.item(*slot).unwrap_or(EMPTY_SLOT).to_string()),
    );
    row.extend([
        stat(StatKind::Hp),
        stat(StatKind::Mp),
        stat(StatKind::Power),
        stat(StatKind::Magic),
        stat(StatKind::Defense),
        format!("{:.2}", result.stats.crit_rate),
        format!("{:.1}", result.damage.base_damage),
        format!("{:.1}", result.damage.per_hit),
        format!("{:.1}", result.damage.extra_per_hit),
        format!("{:.0}", result.damage.hits),
    ]);
    row
}

/// Write the header and one row per result.
pub fn write_table<W: io::Write>(writer: W, results: &[OptimizeResult]) -> Result<(), csv::Error> {
    let mut table = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);
    table.write_record(HEADER)?;
    for result in results {
        table.write_record(result_row(result))?;
    }
    table.flush()?;
    Ok(())
}

pub fn export_table(results: &[OptimizeResult]) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_table(&mut buffer, results)?;
    String::from_utf8(buffer).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_results_still_write_the_header() {
        let table = export_table(&[]).unwrap();
        assert_eq!(table.lines().count(), 1);
        assert_eq!(table.trim_end().split('\t').count(), HEADER.len());
        assert!(table.starts_with("rank\texpected_damage\tweapon"));
    }
}
