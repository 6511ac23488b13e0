//! Plain-text rendering of the published list.

use std::io::{self, Write};

use globe_core::Country;

/// One tab-separated line: id, name, capital, region.
pub fn country_line(country: &Country) -> String {
    let id = country.uuid.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
    format!(
        "{id}\t{}\t{}\t{}",
        country.name,
        country.capital.as_deref().unwrap_or("-"),
        country.region.as_deref().unwrap_or("-")
    )
}

pub fn write_countries(out: &mut impl Write, countries: &[Country]) -> io::Result<()> {
    for country in countries {
        writeln!(out, "{}", country_line(country))?;
    }
    out.flush()
}
