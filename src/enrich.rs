//! Continent enrichment.
//!
//! Maps each distinct `country_region` value to a continent label. The
//! classification is total: any name the resolver does not know falls back
//! to "Others" and never fails the pipeline. Classification runs once per
//! distinct country and is broadcast back onto the table via a left join.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use polars::prelude::*;

use crate::error::DashboardError;
use crate::schema::continent::*;
use crate::schema::cases;

/// Source names that need correcting before continent resolution.
/// Handles ISO vs. common names, historical naming disputes and alternate
/// transliterations in the JHU vocabulary.
static NAME_CORRECTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("US", "United States"),
        ("Korea, South", "South Korea"),
        ("Taiwan*", "Taiwan"),
        ("Burma", "Myanmar"),
        ("Congo (Kinshasa)", "Congo"),
        ("Congo (Brazzaville)", "Congo"),
        ("Cote d'Ivoire", "Ivory Coast"),
        ("West Bank and Gaza", "Israel"),
        ("Russia", "Russian Federation"),
        ("Vietnam", "Viet Nam"),
        ("Laos", "Lao People's Democratic Republic"),
        ("Syria", "Syrian Arab Republic"),
        ("Iran", "Iran, Islamic Republic of"),
        ("Tanzania", "Tanzania, United Republic of"),
        ("Venezuela", "Venezuela, Bolivarian Republic of"),
        ("Bolivia", "Bolivia, Plurinational State of"),
        ("Brunei", "Brunei Darussalam"),
        ("United Kingdom", "United Kingdom"),
        ("France", "France"),
    ])
});

/// Corrected country name -> continent label. Cruise ships and other
/// non-country entries in the source data are intentionally absent.
static COUNTRY_CONTINENTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    for name in [
        "Algeria", "Angola", "Benin", "Botswana", "Burkina Faso", "Burundi",
        "Cabo Verde", "Cameroon", "Central African Republic", "Chad", "Comoros",
        "Congo", "Djibouti", "Egypt", "Equatorial Guinea", "Eritrea", "Eswatini",
        "Ethiopia", "Gabon", "Gambia", "Ghana", "Guinea", "Guinea-Bissau",
        "Ivory Coast", "Kenya", "Lesotho", "Liberia", "Libya", "Madagascar",
        "Malawi", "Mali", "Mauritania", "Mauritius", "Morocco", "Mozambique",
        "Namibia", "Niger", "Nigeria", "Rwanda", "Sao Tome and Principe",
        "Senegal", "Seychelles", "Sierra Leone", "Somalia", "South Africa",
        "South Sudan", "Sudan", "Tanzania, United Republic of", "Togo",
        "Tunisia", "Uganda", "Zambia", "Zimbabwe",
    ] {
        m.insert(name, AFRICA);
    }

    for name in [
        "Afghanistan", "Armenia", "Azerbaijan", "Bahrain", "Bangladesh",
        "Bhutan", "Brunei Darussalam", "Cambodia", "China", "Cyprus", "Georgia",
        "India", "Indonesia", "Iran, Islamic Republic of", "Iraq", "Israel",
        "Japan", "Jordan", "Kazakhstan", "Kuwait", "Kyrgyzstan",
        "Lao People's Democratic Republic", "Lebanon", "Malaysia", "Maldives",
        "Mongolia", "Myanmar", "Nepal", "North Korea", "Oman", "Pakistan",
        "Philippines", "Qatar", "Saudi Arabia", "Singapore", "South Korea",
        "Sri Lanka", "Syrian Arab Republic", "Taiwan", "Tajikistan", "Thailand",
        "Timor-Leste", "Turkey", "Turkmenistan", "United Arab Emirates",
        "Uzbekistan", "Viet Nam", "Yemen",
    ] {
        m.insert(name, ASIA);
    }

    for name in [
        "Albania", "Andorra", "Austria", "Belarus", "Belgium",
        "Bosnia and Herzegovina", "Bulgaria", "Croatia", "Czechia", "Denmark",
        "Estonia", "Finland", "France", "Germany", "Greece", "Holy See",
        "Hungary", "Iceland", "Ireland", "Italy", "Kosovo", "Latvia",
        "Liechtenstein", "Lithuania", "Luxembourg", "Malta", "Moldova",
        "Monaco", "Montenegro", "Netherlands", "North Macedonia", "Norway",
        "Poland", "Portugal", "Romania", "Russian Federation", "San Marino",
        "Serbia", "Slovakia", "Slovenia", "Spain", "Sweden", "Switzerland",
        "Ukraine", "United Kingdom",
    ] {
        m.insert(name, EUROPE);
    }

    for name in [
        "Antigua and Barbuda", "Bahamas", "Barbados", "Belize", "Canada",
        "Costa Rica", "Cuba", "Dominica", "Dominican Republic", "El Salvador",
        "Grenada", "Guatemala", "Haiti", "Honduras", "Jamaica", "Mexico",
        "Nicaragua", "Panama", "Saint Kitts and Nevis", "Saint Lucia",
        "Saint Vincent and the Grenadines", "Trinidad and Tobago",
        "United States",
    ] {
        m.insert(name, NORTH_AMERICA);
    }

    for name in [
        "Argentina", "Bolivia, Plurinational State of", "Brazil", "Chile",
        "Colombia", "Ecuador", "Guyana", "Paraguay", "Peru", "Suriname",
        "Uruguay", "Venezuela, Bolivarian Republic of",
    ] {
        m.insert(name, SOUTH_AMERICA);
    }

    for name in [
        "Australia", "Fiji", "Kiribati", "Marshall Islands", "Micronesia",
        "Nauru", "New Zealand", "Palau", "Papua New Guinea", "Samoa",
        "Solomon Islands", "Tonga", "Tuvalu", "Vanuatu",
    ] {
        m.insert(name, OCEANIA);
    }

    m
});

/// Classify a country name into one of the six continents or "Others".
///
/// Total over arbitrary strings: unknown names never error, they classify
/// as "Others".
pub fn classify(country_name: &str) -> &'static str {
    let corrected = NAME_CORRECTIONS
        .get(country_name)
        .copied()
        .unwrap_or(country_name);
    COUNTRY_CONTINENTS.get(corrected).copied().unwrap_or(OTHERS)
}

/// Build a (country_region, continent) lookup frame from the distinct
/// country values of `df`, for broadcast-joining the continent column onto
/// every row. One `classify` call per distinct country, not per row.
pub fn continent_map_frame(df: &DataFrame) -> Result<DataFrame, DashboardError> {
    let unique = df
        .column(cases::COUNTRY_REGION)?
        .as_materialized_series()
        .unique()?;
    let countries = unique.str()?;

    let mut names: Vec<&str> = Vec::with_capacity(countries.len());
    let mut labels: Vec<&str> = Vec::with_capacity(countries.len());
    for value in countries.into_iter().flatten() {
        names.push(value);
        labels.push(classify(value));
    }

    let frame = DataFrame::new(vec![
        Series::new(cases::COUNTRY_REGION.into(), names).into(),
        Series::new(cases::CONTINENT.into(), labels).into(),
    ])?;
    Ok(frame)
}
