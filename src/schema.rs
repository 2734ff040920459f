/// Column-name and label constants for the covid-trends schema.
/// Single source of truth for every string key in the pipeline.

// ── Case table columns ──────────────────────────────────────────────────────
pub mod cases {
    pub const COUNTRY_REGION: &str = "country_region";
    pub const FILE_DATE: &str = "file_date";
    pub const CONFIRMED: &str = "confirmed";
    pub const DEATHS: &str = "deaths";
    pub const RECOVERED: &str = "recovered";
    pub const ACTIVE: &str = "active";
    pub const LAT: &str = "lat";
    pub const LONG: &str = "long";
    pub const CONTINENT: &str = "continent";

    pub const REQUIRED: [&str; 5] = [COUNTRY_REGION, FILE_DATE, CONFIRMED, DEATHS, RECOVERED];
    pub const COUNTS: [&str; 4] = [CONFIRMED, DEATHS, RECOVERED, ACTIVE];
}

// ── Continent labels ────────────────────────────────────────────────────────
pub mod continent {
    pub const NORTH_AMERICA: &str = "North America";
    pub const SOUTH_AMERICA: &str = "South America";
    pub const ASIA: &str = "Asia";
    pub const OCEANIA: &str = "Oceania";
    pub const EUROPE: &str = "Europe";
    pub const AFRICA: &str = "Africa";
    pub const OTHERS: &str = "Others";

    pub const ALL: [&str; 7] = [
        NORTH_AMERICA,
        SOUTH_AMERICA,
        ASIA,
        OCEANIA,
        EUROPE,
        AFRICA,
        OTHERS,
    ];
}

// ── Long-form timeline columns (line-chart input) ───────────────────────────
pub mod timeline {
    pub const SERIES: &str = "series";
    pub const CASES: &str = "cases";
}
